#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Zombie Arena engine.
//!
//! This crate defines the message surface that connects the environment, the
//! authoritative world, and pure systems. The environment submits [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values for systems
//! and reward shaping to react to deterministically. Systems consume event
//! streams, query immutable snapshots, and respond exclusively with new
//! command batches.

use std::{fmt, sync::Arc, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of the playable world measured in world units.
pub const WORLD_WIDTH: f32 = 1800.0;

/// Height of the playable world measured in world units.
pub const WORLD_HEIGHT: f32 = 1200.0;

/// Width of the camera viewport that observations are rendered from.
pub const VIEWPORT_WIDTH: f32 = 1200.0;

/// Height of the camera viewport that observations are rendered from.
pub const VIEWPORT_HEIGHT: f32 = 800.0;

/// Simulated time that elapses during a single atomic tick (one frame at 60 Hz).
pub const TICK_DURATION: Duration = Duration::from_nanos(16_666_667);

/// Side length of the square observation grid.
pub const OBSERVATION_SIDE: usize = 128;

/// Number of intensity samples stored in a single observation.
pub const OBSERVATION_LEN: usize = OBSERVATION_SIDE * OBSERVATION_SIDE;

/// Number of discrete actions available to the agent.
pub const ACTION_COUNT: usize = 7;

/// Discrete actions accepted by the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Leaves the player in place.
    NoOp,
    /// Moves the player towards the top of the world.
    Up,
    /// Moves the player towards the bottom of the world.
    Down,
    /// Moves the player towards the left edge of the world.
    Left,
    /// Moves the player towards the right edge of the world.
    Right,
    /// Triggers the melee skill.
    Melee,
    /// Triggers the area burst skill.
    AreaBurst,
}

impl Action {
    /// Every action ordered by its numeric code.
    pub const ALL: [Action; ACTION_COUNT] = [
        Action::NoOp,
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Melee,
        Action::AreaBurst,
    ];

    /// Numeric code of the action in `0..ACTION_COUNT`.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Action::NoOp => 0,
            Action::Up => 1,
            Action::Down => 2,
            Action::Left => 3,
            Action::Right => 4,
            Action::Melee => 5,
            Action::AreaBurst => 6,
        }
    }

    /// Resolves an action from its numeric code, rejecting unknown codes.
    pub fn from_index(code: usize) -> Result<Self, InvalidAction> {
        Self::ALL
            .get(code)
            .copied()
            .ok_or(InvalidAction { code })
    }

    /// Direction of travel requested by the action, if it is a movement action.
    #[must_use]
    pub const fn direction(self) -> Option<Facing> {
        match self {
            Action::Up => Some(Facing::Up),
            Action::Down => Some(Facing::Down),
            Action::Left => Some(Facing::Left),
            Action::Right => Some(Facing::Right),
            Action::NoOp | Action::Melee | Action::AreaBurst => None,
        }
    }

    /// Skill requested by the action, if it is a skill action.
    #[must_use]
    pub const fn skill(self) -> Option<SkillKind> {
        match self {
            Action::Melee => Some(SkillKind::Melee),
            Action::AreaBurst => Some(SkillKind::AreaBurst),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = InvalidAction;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_index(usize::from(code))
    }
}

/// Error raised when an action code falls outside the action space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("action code {code} is outside the action space 0..{ACTION_COUNT}")]
pub struct InvalidAction {
    code: usize,
}

impl InvalidAction {
    /// Code that was rejected.
    #[must_use]
    pub const fn code(&self) -> usize {
        self.code
    }
}

/// Cardinal direction an entity is facing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    /// Facing towards negative y.
    Up,
    /// Facing towards positive y.
    #[default]
    Down,
    /// Facing towards negative x.
    Left,
    /// Facing towards positive x.
    Right,
}

impl Facing {
    /// Unit vector pointing in the facing direction.
    #[must_use]
    pub const fn unit(self) -> Vec2 {
        match self {
            Facing::Up => Vec2::new(0.0, -1.0),
            Facing::Down => Vec2::new(0.0, 1.0),
            Facing::Left => Vec2::new(-1.0, 0.0),
            Facing::Right => Vec2::new(1.0, 0.0),
        }
    }

    /// Facing derived from the dominant axis of a displacement.
    ///
    /// Returns `None` for a zero displacement. Ties favour the vertical axis.
    #[must_use]
    pub fn from_displacement(delta: Vec2) -> Option<Self> {
        if delta == Vec2::ZERO {
            return None;
        }

        let facing = if delta.x.abs() > delta.y.abs() {
            if delta.x > 0.0 {
                Facing::Right
            } else {
                Facing::Left
            }
        } else if delta.y > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        };
        Some(facing)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    origin: Vec2,
    size: Vec2,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and extent.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Creates a square with the provided top-left corner and side length.
    #[must_use]
    pub const fn square(origin: Vec2, side: f32) -> Self {
        Self {
            origin,
            size: Vec2::new(side, side),
        }
    }

    /// Top-left corner of the rectangle.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Width and height of the rectangle.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Bottom-right corner of the rectangle.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    /// Centre point of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    /// Rectangle shifted by the provided displacement.
    #[must_use]
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            origin: self.origin + delta,
            size: self.size,
        }
    }

    /// Whether the two rectangles share a region of positive area.
    ///
    /// Rectangles that only touch along an edge do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        let self_max = self.max();
        let other_max = other.max();
        self.origin.x < other_max.x
            && other.origin.x < self_max.x
            && self.origin.y < other_max.y
            && other.origin.y < self_max.y
    }

    /// Whether the rectangle lies inside `[0, width] x [0, height]`.
    #[must_use]
    pub fn within(&self, width: f32, height: f32) -> bool {
        let max = self.max();
        self.origin.x >= 0.0 && self.origin.y >= 0.0 && max.x <= width && max.y <= height
    }
}

/// Zombie archetypes available to the spawner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZombieKind {
    /// Small flying zombie.
    Bat,
    /// Translucent zombie.
    Ghost,
    /// Bulky zombie.
    Monster,
    /// Horned zombie.
    Demon,
}

impl ZombieKind {
    /// Every zombie kind in spawn-table order.
    pub const ALL: [ZombieKind; 4] = [
        ZombieKind::Bat,
        ZombieKind::Ghost,
        ZombieKind::Monster,
        ZombieKind::Demon,
    ];

    const fn side(self) -> u32 {
        match self {
            ZombieKind::Bat => 100,
            ZombieKind::Ghost | ZombieKind::Monster | ZombieKind::Demon => 120,
        }
    }

    /// Side length of the zombie's square bounding box.
    #[must_use]
    pub fn size(self) -> f32 {
        self.side() as f32
    }

    /// Health a freshly spawned zombie of this kind starts with.
    ///
    /// Larger archetypes are tougher: one extra point per ten units above 70.
    #[must_use]
    pub const fn max_health(self) -> u32 {
        3 + (self.side() - 70) / 10
    }
}

/// Unique identifier assigned to a zombie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZombieId(u32);

impl ZombieId {
    /// Creates a new zombie identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a timed effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(u32);

impl EffectId {
    /// Creates a new effect identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Read-only snapshot of the player exposed to systems and adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerSnapshot {
    /// Top-left corner of the player's bounding box.
    pub position: Vec2,
    /// Side length of the player's square bounding box.
    pub size: f32,
    /// Remaining health.
    pub health: u32,
    /// Zombies defeated on the current level.
    pub score: u32,
    /// Direction the player faces.
    pub facing: Facing,
}

impl PlayerSnapshot {
    /// Bounding box of the player.
    #[must_use]
    pub const fn rect(&self) -> Rect {
        Rect::square(self.position, self.size)
    }
}

/// Read-only snapshot of a zombie exposed to systems and adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZombieSnapshot {
    /// Identifier of the zombie.
    pub id: ZombieId,
    /// Archetype of the zombie.
    pub kind: ZombieKind,
    /// Top-left corner of the zombie's bounding box.
    pub position: Vec2,
    /// Remaining health.
    pub health: u32,
    /// Distance covered per tick.
    pub speed: f32,
    /// Direction the zombie faces.
    pub facing: Facing,
}

impl ZombieSnapshot {
    /// Bounding box of the zombie.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::square(self.position, self.kind.size())
    }
}

/// Player skills that spawn timed effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    /// Short-range strike in front of the player.
    Melee,
    /// Expanding ring centred on the player that ignites zombies.
    AreaBurst,
}

/// Reason a skill request was declined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillAdvisory {
    /// The skill consumes charges and none are left.
    NoCharges,
    /// The skill's cooldown has not elapsed yet.
    OnCooldown,
}

/// Source credited with defeating a zombie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KillCause {
    /// A projectile hit.
    Projectile {
        /// Whether an area burst was active when the projectile landed.
        during_burst: bool,
    },
    /// A melee effect hit.
    Melee {
        /// Effect that delivered the strike.
        effect: EffectId,
    },
    /// The initial hit of an area burst.
    AreaBurst {
        /// Effect that delivered the hit.
        effect: EffectId,
    },
    /// A damage-over-time tick.
    Burning,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests activation of a player skill.
    UseSkill {
        /// Skill the player attempts to trigger.
        skill: SkillKind,
    },
    /// Requests that a new zombie enters the arena.
    SpawnZombie {
        /// Archetype of the zombie.
        kind: ZombieKind,
        /// Top-left corner of the zombie's bounding box.
        position: Vec2,
        /// Distance the zombie covers per tick.
        speed: f32,
    },
    /// Requests that the player takes one step in the provided direction.
    MovePlayer {
        /// Direction of travel.
        direction: Facing,
    },
    /// Requests that a zombie relocates to a planned position.
    MoveZombie {
        /// Identifier of the zombie to move.
        zombie: ZombieId,
        /// Top-left corner the zombie should occupy.
        position: Vec2,
        /// Facing derived from the intended displacement.
        facing: Facing,
    },
    /// Launches a projectile from the provided origin.
    FireProjectile {
        /// Centre of the projectile at launch.
        origin: Vec2,
        /// Direction of travel; normalised by the world.
        direction: Vec2,
    },
    /// Resolves projectile hits, zombie bites and projectile travel.
    ResolveProjectiles,
    /// Advances melee and area burst effects and applies their hits.
    ResolveEffects,
    /// Applies due damage-over-time ticks.
    ResolveBurning,
    /// Resolves treasure and health pickups.
    ResolvePickups,
    /// Checks for defeat, level completion and victory.
    ResolveProgress,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a skill was triggered and spawned an effect.
    SkillActivated {
        /// Skill that fired.
        skill: SkillKind,
        /// Effect created by the skill.
        effect: EffectId,
    },
    /// Reports that a skill request was declined and the advisory flag raised.
    SkillRejected {
        /// Skill that was requested.
        skill: SkillKind,
        /// Reason the request was declined.
        advisory: SkillAdvisory,
    },
    /// Confirms that a zombie entered the arena.
    ZombieSpawned {
        /// Identifier assigned to the zombie.
        zombie: ZombieId,
        /// Archetype of the zombie.
        kind: ZombieKind,
        /// Top-left corner of the zombie's bounding box.
        position: Vec2,
    },
    /// Confirms that the player changed position.
    PlayerMoved {
        /// Top-left corner before moving.
        from: Vec2,
        /// Top-left corner after moving.
        to: Vec2,
    },
    /// Confirms that a zombie changed position.
    ZombieMoved {
        /// Identifier of the zombie that moved.
        zombie: ZombieId,
        /// Top-left corner before moving.
        from: Vec2,
        /// Top-left corner after moving.
        to: Vec2,
    },
    /// Reports that a zombie bit the player.
    PlayerBitten {
        /// Zombie responsible for the bite.
        zombie: ZombieId,
        /// Player health after the bite.
        health: u32,
    },
    /// Reports that a zombie was defeated and removed.
    ZombieKilled {
        /// Identifier of the defeated zombie.
        zombie: ZombieId,
        /// Last top-left corner of the zombie.
        position: Vec2,
        /// Source credited with the kill.
        cause: KillCause,
    },
    /// Reports that a defeated zombie dropped a health pickup.
    HealthDropped {
        /// Top-left corner of the pickup.
        position: Vec2,
    },
    /// Reports that the player opened the treasure chest.
    TreasureOpened {
        /// Area burst charges granted by the chest.
        charges: u32,
    },
    /// Reports that the player collected a health pickup.
    HealthCollected {
        /// Player health after collecting the pickup.
        health: u32,
    },
    /// Announces that a timed effect finished and was dropped.
    EffectExpired {
        /// Identifier of the expired effect.
        effect: EffectId,
    },
    /// Announces that the player cleared a level and the next one started.
    LevelAdvanced {
        /// Level that is now active.
        level: u32,
    },
    /// Announces that the player's health reached zero.
    PlayerDefeated,
    /// Announces that the final level was cleared.
    ArenaCleared {
        /// Level that was cleared last.
        level: u32,
    },
}

/// Single-channel intensity grid presented to the agent.
///
/// Pixels are stored as bytes behind an [`Arc`] so consecutive transitions can
/// share the same frame without copying it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Observation {
    pixels: Arc<[u8]>,
}

impl Observation {
    /// Creates an observation from row-major pixels.
    ///
    /// Buffers of the wrong length are padded with black or truncated to
    /// [`OBSERVATION_LEN`].
    #[must_use]
    pub fn from_pixels(mut pixels: Vec<u8>) -> Self {
        pixels.resize(OBSERVATION_LEN, 0);
        Self {
            pixels: pixels.into(),
        }
    }

    /// Observation where every pixel is black.
    #[must_use]
    pub fn blank() -> Self {
        Self::from_pixels(vec![0; OBSERVATION_LEN])
    }

    /// Row-major pixels of the observation.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Intensity at the provided row and column, if it lies within the grid.
    #[must_use]
    pub fn pixel(&self, row: usize, column: usize) -> Option<u8> {
        if row >= OBSERVATION_SIDE || column >= OBSERVATION_SIDE {
            return None;
        }
        self.pixels.get(row * OBSERVATION_SIDE + column).copied()
    }

    /// Intensities as floating point values in `0.0..=255.0`.
    #[must_use]
    pub fn intensities(&self) -> Vec<f32> {
        self.pixels.iter().map(|&value| f32::from(value)).collect()
    }
}

impl fmt::Debug for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lit = self.pixels.iter().filter(|&&value| value > 0).count();
        f.debug_struct("Observation")
            .field("side", &OBSERVATION_SIDE)
            .field("lit", &lit)
            .finish()
    }
}

/// Weapon mode reported to consumers of [`StepInfo`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponMode {
    /// Single-shot mode, the only mode the arena supports.
    #[default]
    Single,
}

impl WeaponMode {
    /// Textual name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            WeaponMode::Single => "single",
        }
    }

    /// Numeric code of the mode.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            WeaponMode::Single => 1,
        }
    }
}

/// Auxiliary information returned alongside every observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepInfo {
    /// Current player health.
    pub health: u32,
    /// Area burst charges available to the player.
    pub area_skill_ammo: u32,
    /// Active weapon mode.
    pub weapon_mode: WeaponMode,
    /// Number of projectiles in flight.
    pub active_projectile_count: usize,
}

impl StepInfo {
    /// Numeric code of the active weapon mode.
    #[must_use]
    pub const fn weapon_mode_code(&self) -> u32 {
        self.weapon_mode.code()
    }
}

/// One `(state, action, reward, next_state, done)` tuple.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// Observation before the action was applied.
    pub state: Observation,
    /// Action that was applied.
    pub action: Action,
    /// Reward accumulated while applying the action.
    pub reward: f32,
    /// Observation after the action was applied.
    pub next_state: Observation,
    /// Whether the episode ended.
    pub done: bool,
}
