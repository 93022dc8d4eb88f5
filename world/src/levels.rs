//! Wall layouts for every level of the arena.

use zombie_arena_core::Rect;

const LEVEL_1: [Rect; 2] = [
    Rect::new(400.0, 300.0, 400.0, 40.0),
    Rect::new(800.0, 700.0, 400.0, 40.0),
];

const LEVEL_2: [Rect; 5] = [
    Rect::new(200.0, 250.0, 600.0, 40.0),
    Rect::new(200.0, 950.0, 600.0, 40.0),
    Rect::new(800.0, 400.0, 40.0, 500.0),
    Rect::new(1000.0, 250.0, 600.0, 40.0),
    Rect::new(1000.0, 950.0, 600.0, 40.0),
];

const LEVEL_3: [Rect; 6] = [
    Rect::new(400.0, 200.0, 1000.0, 40.0),
    Rect::new(400.0, 240.0, 40.0, 700.0),
    Rect::new(1360.0, 240.0, 40.0, 700.0),
    Rect::new(500.0, 940.0, 900.0, 40.0),
    Rect::new(800.0, 400.0, 40.0, 500.0),
    Rect::new(650.0, 650.0, 300.0, 40.0),
];

const LEVEL_4: [Rect; 12] = [
    // enclosure
    Rect::new(400.0, 200.0, 1000.0, 40.0),
    Rect::new(400.0, 200.0, 40.0, 850.0),
    Rect::new(1360.0, 200.0, 40.0, 850.0),
    Rect::new(400.0, 1010.0, 1000.0, 40.0),
    // centre cluster
    Rect::new(700.0, 400.0, 40.0, 400.0),
    Rect::new(1050.0, 400.0, 40.0, 400.0),
    Rect::new(740.0, 600.0, 310.0, 40.0),
    Rect::new(650.0, 800.0, 540.0, 40.0),
    // wings
    Rect::new(450.0, 300.0, 300.0, 40.0),
    Rect::new(450.0, 850.0, 300.0, 40.0),
    Rect::new(1040.0, 300.0, 300.0, 40.0),
    Rect::new(1040.0, 850.0, 300.0, 40.0),
];

const LEVEL_5: [Rect; 15] = [
    // enclosure
    Rect::new(400.0, 200.0, 1000.0, 40.0),
    Rect::new(400.0, 200.0, 40.0, 850.0),
    Rect::new(1360.0, 200.0, 40.0, 850.0),
    Rect::new(400.0, 1010.0, 1000.0, 40.0),
    // inner corridors
    Rect::new(500.0, 300.0, 400.0, 40.0),
    Rect::new(900.0, 300.0, 40.0, 300.0),
    Rect::new(550.0, 650.0, 600.0, 40.0),
    Rect::new(1150.0, 300.0, 40.0, 350.0),
    Rect::new(1150.0, 750.0, 400.0, 40.0),
    Rect::new(1300.0, 500.0, 40.0, 300.0),
    Rect::new(650.0, 900.0, 700.0, 40.0),
    // side branches
    Rect::new(450.0, 500.0, 40.0, 400.0),
    Rect::new(450.0, 500.0, 300.0, 40.0),
    Rect::new(1400.0, 250.0, 40.0, 400.0),
    Rect::new(950.0, 950.0, 300.0, 40.0),
];

/// Wall rectangles for the provided level.
///
/// Levels beyond the authored layouts reuse the last one.
pub(crate) fn walls_for(level: u32) -> &'static [Rect] {
    match level {
        0 | 1 => &LEVEL_1,
        2 => &LEVEL_2,
        3 => &LEVEL_3,
        4 => &LEVEL_4,
        _ => &LEVEL_5,
    }
}

#[cfg(test)]
mod tests {
    use super::walls_for;

    #[test]
    fn every_layout_fits_inside_default_world() {
        for level in 1..=6 {
            for wall in walls_for(level) {
                assert!(wall.within(1800.0, 1200.0), "level {level}: {wall:?}");
            }
        }
    }

    #[test]
    fn layouts_grow_denser() {
        assert!(walls_for(1).len() < walls_for(5).len());
        assert_eq!(walls_for(9), walls_for(5));
    }
}
