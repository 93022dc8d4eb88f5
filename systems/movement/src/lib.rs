#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement system that steers zombies towards the player.

use glam::Vec2;
use zombie_arena_core::{Command, Event, Facing, PlayerSnapshot, Rect, ZombieSnapshot};

/// Angles tried in order, in degrees, when the direct step is blocked.
const DEVIATION_DEGREES: [f32; 10] = [
    15.0, -15.0, 30.0, -30.0, 45.0, -45.0, 60.0, -60.0, 90.0, -90.0,
];

/// Fraction of a step a fully blocked zombie backs away by.
const RETREAT_FRACTION: f32 = 0.5;

/// Pure system that reacts to elapsed time and emits zombie move commands.
#[derive(Debug)]
pub struct Movement {
    deviations: Vec<Vec2>,
}

impl Movement {
    /// Creates a movement system with the default deviation fan.
    #[must_use]
    pub fn new() -> Self {
        let deviations = DEVIATION_DEGREES
            .iter()
            .map(|degrees| Vec2::from_angle(degrees.to_radians()))
            .collect();
        Self { deviations }
    }

    /// Consumes world events and immutable views to emit movement commands.
    ///
    /// Zombies only move on ticks that advanced the clock.
    pub fn handle(
        &mut self,
        events: &[Event],
        player: &PlayerSnapshot,
        zombies: &[ZombieSnapshot],
        walls: &[Rect],
        out: &mut Vec<Command>,
    ) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        for zombie in zombies.iter().filter(|zombie| zombie.health > 0) {
            if let Some(command) = self.plan(zombie, player.position, walls) {
                out.push(command);
            }
        }
    }

    fn plan(&self, zombie: &ZombieSnapshot, goal: Vec2, walls: &[Rect]) -> Option<Command> {
        let offset = goal - zombie.position;
        let heading = offset.try_normalize()?;
        let facing = Facing::from_displacement(offset)?;
        let body = zombie.rect();
        let clear = |delta: Vec2| {
            let moved = body.translated(delta);
            !walls.iter().any(|wall| wall.intersects(&moved))
        };

        let direct = heading * zombie.speed;
        let step = if clear(direct) {
            Some(direct)
        } else {
            self.deviations
                .iter()
                .map(|rotation| rotation.rotate(heading) * zombie.speed)
                .find(|delta| clear(*delta))
                .or_else(|| {
                    let retreat = -direct * RETREAT_FRACTION;
                    clear(retreat).then_some(retreat)
                })
        };

        Some(Command::MoveZombie {
            zombie: zombie.id,
            position: zombie.position + step.unwrap_or(Vec2::ZERO),
            facing,
        })
    }
}

impl Default for Movement {
    fn default() -> Self {
        Self::new()
    }
}
