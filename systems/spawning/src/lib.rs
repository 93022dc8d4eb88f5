#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stochastic spawning system responsible for emitting zombie spawn commands.

use glam::Vec2;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use zombie_arena_core::{Command, Event, ZombieKind};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_chance: f64,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided per-tick chance and seed.
    #[must_use]
    pub const fn new(spawn_chance: f64, rng_seed: u64) -> Self {
        Self {
            spawn_chance,
            rng_seed,
        }
    }
}

/// Level limits the spawner must respect on the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnLimits {
    /// Zombies currently in the arena.
    pub live: usize,
    /// Maximum zombies allowed on the level.
    pub cap: usize,
    /// Highest speed a new zombie may draw.
    pub speed_ceiling: u32,
    /// Width and height of the arena.
    pub bounds: Vec2,
}

/// Pure system that rolls for a border spawn on every elapsed tick.
#[derive(Debug)]
pub struct Spawning {
    spawn_chance: f64,
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            spawn_chance: config.spawn_chance,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes events and the level limits to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], limits: SpawnLimits, out: &mut Vec<Command>) {
        let ticks = events
            .iter()
            .filter(|event| matches!(event, Event::TimeAdvanced { .. }))
            .count();

        let mut live = limits.live;
        for _ in 0..ticks {
            if live >= limits.cap {
                return;
            }
            if self.rng.gen::<f64>() >= self.spawn_chance {
                continue;
            }

            let kind = *ZombieKind::ALL
                .choose(&mut self.rng)
                .unwrap_or(&ZombieKind::Bat);
            let speed = self.rng.gen_range(1..=limits.speed_ceiling.max(1)) as f32;
            let position = self.border_position(kind.size(), limits.bounds);
            out.push(Command::SpawnZombie {
                kind,
                position,
                speed,
            });
            live += 1;
        }
    }

    /// Picks a random spot along one of the four arena edges.
    fn border_position(&mut self, size: f32, bounds: Vec2) -> Vec2 {
        let max = (bounds - Vec2::splat(size)).max(Vec2::ZERO);
        let along_x = self.rng.gen_range(0.0..=max.x).floor();
        let along_y = self.rng.gen_range(0.0..=max.y).floor();
        match self.rng.gen_range(0..4) {
            0 => Vec2::new(along_x, 0.0),
            1 => Vec2::new(along_x, max.y),
            2 => Vec2::new(0.0, along_y),
            _ => Vec2::new(max.x, along_y),
        }
    }
}
