#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Rendering contracts and the software rasteriser that turns world snapshots
//! into agent observations.
//!
//! A [`Scene`] is a declarative, painter-ordered description of what the
//! camera sees. Any [`FrameRenderer`] can consume it; the shipped
//! [`GrayscaleRasterizer`] samples it straight into the single-channel
//! observation grid and stamps the charge indicator in the top-right corner.

use glam::Vec2;
use zombie_arena_core::{
    Observation, Rect, ZombieKind, OBSERVATION_SIDE, VIEWPORT_HEIGHT, VIEWPORT_WIDTH,
};
use zombie_arena_world::{query, MeleePhase, World};

/// Side length of the square charge indicator patch.
pub const CHARGE_PATCH_SIDE: usize = 10;

/// Side length of one charge block inside the patch.
const CHARGE_BLOCK_SIDE: usize = 3;

/// Most charges the indicator can distinguish.
const MAX_VISIBLE_CHARGES: usize = 3;

/// Thickness of the red border drawn around the world.
const BORDER_THICKNESS: f32 = 5.0;

/// Opaque colour expressed as byte RGB values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    red: u8,
    green: u8,
    blue: u8,
}

impl Color {
    /// Creates a colour from byte RGB values.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Perceived brightness using the ITU-R BT.601 luma weights.
    #[must_use]
    pub fn luminance(self) -> u8 {
        let luma = 0.299 * f32::from(self.red)
            + 0.587 * f32::from(self.green)
            + 0.114 * f32::from(self.blue);
        luma.round().clamp(0.0, 255.0) as u8
    }
}

/// Colours assigned to every kind of scene element.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    /// Arena floor.
    pub floor: Color,
    /// Wall blocks.
    pub wall: Color,
    /// Outline around the world.
    pub border: Color,
    /// Player body.
    pub player: Color,
    /// Bat bodies.
    pub bat: Color,
    /// Ghost bodies.
    pub ghost: Color,
    /// Monster bodies.
    pub monster: Color,
    /// Demon bodies.
    pub demon: Color,
    /// Projectiles in flight.
    pub projectile: Color,
    /// Active melee strike area.
    pub melee: Color,
    /// Area burst ring.
    pub burst: Color,
    /// Health pickup.
    pub health: Color,
    /// Unopened treasure chest.
    pub treasure: Color,
    /// Opened treasure chest.
    pub treasure_opened: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            floor: Color::from_rgb(181, 101, 29),
            wall: Color::from_rgb(50, 50, 50),
            border: Color::from_rgb(255, 0, 0),
            player: Color::from_rgb(40, 120, 255),
            bat: Color::from_rgb(90, 30, 110),
            ghost: Color::from_rgb(230, 230, 240),
            monster: Color::from_rgb(40, 160, 60),
            demon: Color::from_rgb(170, 20, 20),
            projectile: Color::from_rgb(255, 240, 0),
            melee: Color::from_rgb(255, 255, 255),
            burst: Color::from_rgb(240, 120, 180),
            health: Color::from_rgb(200, 0, 40),
            treasure: Color::from_rgb(40, 80, 230),
            treasure_opened: Color::from_rgb(140, 170, 255),
        }
    }
}

impl Palette {
    /// Body colour of the provided zombie archetype.
    #[must_use]
    pub const fn zombie(&self, kind: ZombieKind) -> Color {
        match kind {
            ZombieKind::Bat => self.bat,
            ZombieKind::Ghost => self.ghost,
            ZombieKind::Monster => self.monster,
            ZombieKind::Demon => self.demon,
        }
    }
}

/// Geometric primitive expressed in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Filled rectangle.
    Rect(Rect),
    /// Filled disc.
    Circle {
        /// Centre of the disc.
        center: Vec2,
        /// Radius of the disc.
        radius: f32,
    },
    /// Rectangle outline whose stroke lies inside the rectangle.
    Outline {
        /// Outer edge of the stroke.
        rect: Rect,
        /// Stroke width.
        thickness: f32,
    },
}

impl Shape {
    /// Whether the shape covers the provided world point.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        match *self {
            Shape::Rect(rect) => covers(&rect, point),
            Shape::Circle { center, radius } => center.distance_squared(point) <= radius * radius,
            Shape::Outline { rect, thickness } => {
                let inner = Rect::new(
                    rect.origin().x + thickness,
                    rect.origin().y + thickness,
                    rect.size().x - 2.0 * thickness,
                    rect.size().y - 2.0 * thickness,
                );
                covers(&rect, point) && !covers(&inner, point)
            }
        }
    }
}

fn covers(rect: &Rect, point: Vec2) -> bool {
    let min = rect.origin();
    let max = rect.max();
    point.x >= min.x && point.x < max.x && point.y >= min.y && point.y < max.y
}

/// Shape painted with a single colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Layer {
    /// Geometry of the layer.
    pub shape: Shape,
    /// Fill colour of the layer.
    pub color: Color,
}

/// Declarative description of a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// World-space region visible through the camera.
    pub camera: Rect,
    /// Colour of anything no layer covers.
    pub background: Color,
    /// Layers in painter order; later layers cover earlier ones.
    pub layers: Vec<Layer>,
    /// Area burst charges shown by the indicator patch.
    pub charges: u32,
}

impl Scene {
    /// Captures the world as seen by a camera following the player.
    #[must_use]
    pub fn capture(world: &World, palette: &Palette) -> Self {
        let player = query::player(world);
        let bounds = query::bounds(world);
        let camera = camera_for(
            player.position,
            bounds,
            Vec2::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT),
        );

        let mut layers = Vec::new();
        let mut paint = |shape: Shape, color: Color| layers.push(Layer { shape, color });

        for projectile in query::projectiles(world) {
            paint(Shape::Rect(projectile), palette.projectile);
        }
        for effect in query::effects(world) {
            match effect {
                query::EffectView::AreaBurst { origin, radius, .. } => paint(
                    Shape::Circle {
                        center: origin,
                        radius,
                    },
                    palette.burst,
                ),
                query::EffectView::Melee { phase, area, .. } => {
                    if phase == MeleePhase::Active {
                        paint(Shape::Rect(area), palette.melee);
                    }
                }
            }
        }
        paint(Shape::Rect(player.rect()), palette.player);
        for zombie in query::zombies(world) {
            paint(Shape::Rect(zombie.rect()), palette.zombie(zombie.kind));
        }
        if let Some(pickup) = query::health_pickup(world) {
            paint(Shape::Rect(pickup), palette.health);
        }
        paint(
            Shape::Outline {
                rect: Rect::new(0.0, 0.0, bounds.x, bounds.y),
                thickness: BORDER_THICKNESS,
            },
            palette.border,
        );
        for wall in query::walls(world) {
            paint(Shape::Rect(*wall), palette.wall);
        }
        if let Some(treasure) = query::treasure(world) {
            let color = if treasure.opened {
                palette.treasure_opened
            } else {
                palette.treasure
            };
            paint(Shape::Rect(treasure.rect), color);
        }

        Self {
            camera,
            background: palette.floor,
            layers,
            charges: query::charges(world),
        }
    }

    /// Colour visible at the provided world point.
    #[must_use]
    pub fn sample(&self, point: Vec2) -> Color {
        self.layers
            .iter()
            .rev()
            .find(|layer| layer.shape.contains(point))
            .map_or(self.background, |layer| layer.color)
    }
}

/// Camera viewport centred on `focus` and clamped to the world.
#[must_use]
pub fn camera_for(focus: Vec2, bounds: Vec2, viewport: Vec2) -> Rect {
    let max = (bounds - viewport).max(Vec2::ZERO);
    let origin = (focus - viewport * 0.5).floor().clamp(Vec2::ZERO, max);
    Rect::new(origin.x, origin.y, viewport.x, viewport.y)
}

/// Collaborator that turns a scene into an agent observation.
pub trait FrameRenderer {
    /// Renders the scene into an observation.
    fn render(&mut self, scene: &Scene) -> Observation;
}

/// Software rasteriser producing nearest-neighbour sampled grey levels.
#[derive(Clone, Copy, Debug, Default)]
pub struct GrayscaleRasterizer;

impl FrameRenderer for GrayscaleRasterizer {
    fn render(&mut self, scene: &Scene) -> Observation {
        let side = OBSERVATION_SIDE;
        let camera = scene.camera;
        let scale = camera.size() / side as f32;
        let mut pixels = Vec::with_capacity(side * side);

        for row in 0..side {
            let source_y = (row as f32 * scale.y).floor();
            for column in 0..side {
                let source_x = (column as f32 * scale.x).floor();
                let point = camera.origin() + Vec2::new(source_x + 0.5, source_y + 0.5);
                pixels.push(scene.sample(point).luminance());
            }
        }

        stamp_charges(&mut pixels, side, scene.charges);
        Observation::from_pixels(pixels)
    }
}

/// Overwrites the top-right patch with one white block per charge, up to three.
pub fn stamp_charges(pixels: &mut [u8], side: usize, charges: u32) {
    let patch = CHARGE_PATCH_SIDE.min(side);
    let left = side - patch;
    let visible = (charges as usize).min(MAX_VISIBLE_CHARGES);

    for row in 0..patch {
        for column in left..side {
            let lit = row < visible * CHARGE_BLOCK_SIDE && column < left + CHARGE_BLOCK_SIDE;
            if let Some(pixel) = pixels.get_mut(row * side + column) {
                *pixel = if lit { u8::MAX } else { 0 };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zombie_arena_core::OBSERVATION_LEN;
    use zombie_arena_world::{PlayerTuning, WorldConfig};

    #[test]
    fn floor_luminance_matches_weights() {
        assert_eq!(Palette::default().floor.luminance(), 117);
        assert_eq!(Palette::default().wall.luminance(), 50);
    }

    #[test]
    fn camera_clamps_to_world() {
        let bounds = Vec2::new(1800.0, 1200.0);
        let viewport = Vec2::new(1200.0, 800.0);
        assert_eq!(
            camera_for(Vec2::new(10.0, 10.0), bounds, viewport).origin(),
            Vec2::ZERO
        );
        assert_eq!(
            camera_for(Vec2::new(900.0, 600.0), bounds, viewport).origin(),
            Vec2::new(300.0, 200.0)
        );
        assert_eq!(
            camera_for(Vec2::new(1790.0, 1190.0), bounds, viewport).origin(),
            Vec2::new(600.0, 400.0)
        );
    }

    #[test]
    fn charge_patch_encodes_up_to_three_blocks() {
        let mut pixels = vec![116; OBSERVATION_LEN];
        stamp_charges(&mut pixels, OBSERVATION_SIDE, 5);
        let at = |row: usize, column: usize| pixels[row * OBSERVATION_SIDE + column];

        assert_eq!(at(0, 118), 255);
        assert_eq!(at(8, 120), 255);
        assert_eq!(at(9, 118), 0);
        assert_eq!(at(0, 121), 0);
        assert_eq!(at(0, 117), 116);
        assert_eq!(at(10, 118), 116);
    }

    #[test]
    fn rendered_world_shows_player_and_charges() {
        let config = WorldConfig {
            player: PlayerTuning {
                starting_charges: 1,
                ..PlayerTuning::default()
            },
            ..WorldConfig::default()
        };
        let world = World::new(config, 4);
        let palette = Palette::default();
        let scene = Scene::capture(&world, &palette);
        let observation = GrayscaleRasterizer.render(&scene);

        assert_eq!(observation.as_bytes().len(), OBSERVATION_LEN);
        // Player at (900, 600) sits at viewport offset (600, 400), the grid centre.
        assert_eq!(observation.pixel(66, 66), Some(palette.player.luminance()));
        assert_eq!(observation.pixel(0, 118), Some(255));
        assert_eq!(observation.pixel(3, 118), Some(0));
    }
}
