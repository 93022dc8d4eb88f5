#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Episodic environment wrapping the Zombie Arena world.
//!
//! [`Arena`] owns the authoritative world, the spawning and movement systems
//! and a frame renderer. Each atomic tick issues the phase commands in a fixed
//! order, derives the shaped reward from the resulting events and renders the
//! next observation.

pub mod reward;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use zombie_arena_core::{
    Action, Command, Event, InvalidAction, Observation, StepInfo, WeaponMode, TICK_DURATION,
};
use zombie_arena_rendering::{FrameRenderer, GrayscaleRasterizer, Palette, Scene};
use zombie_arena_system_movement::Movement;
use zombie_arena_system_spawning::{Config as SpawningConfig, SpawnLimits, Spawning};
use zombie_arena_world::{self as world, query, Outcome, World, WorldConfig};

/// Tuning for an arena and the systems it drives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// World tuning applied on every reset.
    pub world: WorldConfig,
    /// Probability that a zombie spawns on a tick with room under the cap.
    pub spawn_chance: f64,
    /// Seed every episode's random streams are derived from.
    pub seed: u64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            spawn_chance: 0.02,
            seed: 0,
        }
    }
}

/// Errors raised by [`Arena::step`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArenaError {
    /// The action code lies outside the action space.
    #[error(transparent)]
    InvalidAction(#[from] InvalidAction),
    /// A step must apply the action at least once.
    #[error("repeat must be at least 1")]
    ZeroRepeat,
    /// The episode already ended; call `reset` first.
    #[error("episode is over; reset the arena before stepping")]
    EpisodeOver,
}

/// Result of applying one action for up to `repeat` ticks.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    /// Observation after the last applied tick.
    pub observation: Observation,
    /// Reward accumulated across the applied ticks.
    pub reward: f32,
    /// Whether the episode ended through defeat or victory.
    pub done: bool,
    /// Always `false`; step limits are enforced by the caller.
    pub truncated: bool,
    /// Auxiliary information after the last applied tick.
    pub info: StepInfo,
}

/// Episodic environment around the arena world.
#[derive(Debug)]
pub struct Arena<R = GrayscaleRasterizer> {
    config: ArenaConfig,
    seeds: ChaCha8Rng,
    world: World,
    spawning: Spawning,
    movement: Movement,
    renderer: R,
    palette: Palette,
    episode: u64,
}

impl Arena {
    /// Creates an arena that renders with the grayscale rasteriser.
    #[must_use]
    pub fn new(config: ArenaConfig) -> Self {
        Self::with_renderer(config, GrayscaleRasterizer)
    }
}

impl<R: FrameRenderer> Arena<R> {
    /// Creates an arena that renders observations with `renderer`.
    #[must_use]
    pub fn with_renderer(config: ArenaConfig, renderer: R) -> Self {
        let mut seeds = ChaCha8Rng::seed_from_u64(config.seed);
        let world = World::new(config.world.clone(), seeds.gen());
        let spawning = Spawning::new(SpawningConfig::new(config.spawn_chance, seeds.gen()));
        Self {
            config,
            seeds,
            world,
            spawning,
            movement: Movement::default(),
            renderer,
            palette: Palette::default(),
            episode: 0,
        }
    }

    /// Starts a new episode on level 1.
    pub fn reset(&mut self) -> (Observation, StepInfo) {
        self.episode += 1;
        let world_seed = self.seeds.gen();
        let spawn_seed = self.seeds.gen();
        self.world = World::new(self.config.world.clone(), world_seed);
        self.spawning = Spawning::new(SpawningConfig::new(self.config.spawn_chance, spawn_seed));
        debug!(episode = self.episode, world_seed, "arena reset");
        (self.observe(), self.info())
    }

    /// Applies the action identified by `code`, rejecting codes outside `0..=6`.
    pub fn step_code(&mut self, code: usize, repeat: u32) -> Result<StepOutcome, ArenaError> {
        let action = Action::from_index(code)?;
        self.step(action, repeat)
    }

    /// Applies `action` for up to `repeat` atomic ticks, accumulating reward.
    ///
    /// Only the first tick carries the action; later ticks are no-ops so one
    /// decision moves or casts once. Stops early when the episode ends.
    pub fn step(&mut self, action: Action, repeat: u32) -> Result<StepOutcome, ArenaError> {
        if repeat == 0 {
            return Err(ArenaError::ZeroRepeat);
        }
        if self.is_done() {
            return Err(ArenaError::EpisodeOver);
        }

        let mut reward = 0.0;
        let mut current = action;
        for _ in 0..repeat {
            reward += self.tick(current);
            current = Action::NoOp;
            if self.is_done() {
                break;
            }
        }

        Ok(StepOutcome {
            observation: self.observe(),
            reward,
            done: self.is_done(),
            truncated: false,
            info: self.info(),
        })
    }

    /// Read-only access to the world for presentation and diagnostics.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Whether the current episode has ended.
    #[must_use]
    pub fn is_done(&self) -> bool {
        query::outcome(&self.world).is_some()
    }

    /// Auxiliary information about the current state.
    #[must_use]
    pub fn info(&self) -> StepInfo {
        StepInfo {
            health: query::player(&self.world).health,
            area_skill_ammo: query::charges(&self.world),
            weapon_mode: WeaponMode::Single,
            active_projectile_count: query::projectile_count(&self.world),
        }
    }

    fn observe(&mut self) -> Observation {
        let scene = Scene::capture(&self.world, &self.palette);
        self.renderer.render(&scene)
    }

    /// Runs one atomic tick and returns its shaped reward.
    fn tick(&mut self, action: Action) -> f32 {
        let mut events = Vec::new();
        self.issue(Command::Tick { dt: TICK_DURATION }, &mut events);

        if let Some(skill) = action.skill() {
            self.issue(Command::UseSkill { skill }, &mut events);
        }

        let mut commands = Vec::new();
        let limits = SpawnLimits {
            live: query::zombie_count(&self.world),
            cap: query::zombie_cap(&self.world),
            speed_ceiling: query::speed_ceiling(&self.world),
            bounds: query::bounds(&self.world),
        };
        self.spawning.handle(&events, limits, &mut commands);
        self.issue_all(commands, &mut events);

        if let Some(direction) = action.direction() {
            self.issue(Command::MovePlayer { direction }, &mut events);
        }

        let mut commands = Vec::new();
        self.movement.handle(
            &events,
            &query::player(&self.world),
            &query::zombies(&self.world),
            query::walls(&self.world),
            &mut commands,
        );
        self.issue_all(commands, &mut events);

        self.issue_all(
            [
                Command::ResolveProjectiles,
                Command::ResolveEffects,
                Command::ResolveBurning,
                Command::ResolvePickups,
                Command::ResolveProgress,
            ],
            &mut events,
        );

        self.log_milestones(&events);
        reward::shape(&events)
    }

    fn issue(&mut self, command: Command, events: &mut Vec<Event>) {
        world::apply(&mut self.world, command, events);
    }

    fn issue_all(&mut self, commands: impl IntoIterator<Item = Command>, events: &mut Vec<Event>) {
        for command in commands {
            self.issue(command, events);
        }
    }

    fn log_milestones(&self, events: &[Event]) {
        for event in events {
            match event {
                Event::LevelAdvanced { level } => {
                    debug!(episode = self.episode, level, "level advanced");
                }
                Event::ArenaCleared { level } => {
                    debug!(episode = self.episode, level, "arena cleared");
                }
                Event::PlayerDefeated => {
                    let outcome = query::outcome(&self.world);
                    debug!(episode = self.episode, ?outcome, "player defeated");
                }
                _ => {}
            }
        }
    }
}

/// Terminal state of the arena's current episode, if it ended.
#[must_use]
pub fn outcome<R>(arena: &Arena<R>) -> Option<Outcome> {
    query::outcome(&arena.world)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> ArenaConfig {
        ArenaConfig {
            spawn_chance: 0.0,
            ..ArenaConfig::default()
        }
    }

    #[test]
    fn zero_repeat_is_rejected() {
        let mut arena = Arena::new(quiet_config());
        let _ = arena.reset();
        assert_eq!(arena.step(Action::NoOp, 0), Err(ArenaError::ZeroRepeat));
    }

    #[test]
    fn invalid_code_is_rejected() {
        let mut arena = Arena::new(quiet_config());
        let _ = arena.reset();
        assert!(matches!(
            arena.step_code(9, 1),
            Err(ArenaError::InvalidAction(_))
        ));
    }

    #[test]
    fn movement_only_applies_on_first_repeat() {
        let mut arena = Arena::new(quiet_config());
        let _ = arena.reset();
        let start = query::player(arena.world()).position;
        let outcome = arena.step(Action::Left, 4).expect("step");
        let end = query::player(arena.world()).position;

        assert_eq!(start.x - end.x, 5.0);
        // One moving tick followed by three idle ticks.
        assert!((outcome.reward - (0.01 - 3.0 * 0.01)).abs() < 1e-6);
    }
}
