//! Tuning knobs for the arena simulation.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use zombie_arena_core::{WORLD_HEIGHT, WORLD_WIDTH};

/// Aggregated tuning knobs controlling every adjustable aspect of the arena.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width of the playable area.
    pub width: f32,
    /// Height of the playable area.
    pub height: f32,
    /// Player body and health settings.
    pub player: PlayerTuning,
    /// Melee skill settings.
    pub melee: MeleeTuning,
    /// Area burst skill settings.
    pub burst: BurstTuning,
    /// Projectile settings.
    pub projectile: ProjectileTuning,
    /// Treasure chest and health pickup settings.
    pub pickups: PickupTuning,
    /// Level goals and difficulty ramp.
    pub levels: LevelTuning,
    /// How long a declined-skill advisory stays raised, in milliseconds.
    pub advisory_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: WORLD_WIDTH,
            height: WORLD_HEIGHT,
            player: PlayerTuning::default(),
            melee: MeleeTuning::default(),
            burst: BurstTuning::default(),
            projectile: ProjectileTuning::default(),
            pickups: PickupTuning::default(),
            levels: LevelTuning::default(),
            advisory_ms: 2_000,
        }
    }
}

impl WorldConfig {
    pub(crate) fn advisory_window(&self) -> Duration {
        Duration::from_millis(self.advisory_ms)
    }
}

/// Player body and health settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Side length of the player's bounding box.
    pub size: f32,
    /// Distance covered per movement tick.
    pub speed: f32,
    /// Health at spawn.
    pub health: u32,
    /// Upper bound health pickups can restore to.
    pub health_cap: u32,
    /// Area burst charges granted when an episode starts.
    pub starting_charges: u32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size: 70.0,
            speed: 5.0,
            health: 5,
            health_cap: 100,
            starting_charges: 0,
        }
    }
}

/// Melee skill settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeTuning {
    /// Minimum time between two strikes, in milliseconds.
    pub cooldown_ms: u64,
    /// Delay between casting and the hit window opening, in milliseconds.
    pub delay_ms: u64,
    /// Length of the hit window, in milliseconds.
    pub active_ms: u64,
    /// Side length of the square strike area.
    pub reach: f32,
    /// Damage dealt to every zombie inside the strike area.
    pub damage: u32,
}

impl Default for MeleeTuning {
    fn default() -> Self {
        Self {
            cooldown_ms: 500,
            delay_ms: 0,
            active_ms: 150,
            reach: 80.0,
            damage: 2,
        }
    }
}

impl MeleeTuning {
    pub(crate) fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Area burst skill settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstTuning {
    /// Minimum time between two bursts, in milliseconds.
    pub cooldown_ms: u64,
    /// Radius the burst reaches once fully expanded.
    pub max_radius: f32,
    /// Time the burst takes to reach its full radius, in milliseconds.
    pub expand_ms: u64,
    /// Damage dealt when the ring first reaches a zombie.
    pub damage: u32,
    /// How long an ignited zombie keeps burning, in milliseconds.
    pub dot_duration_ms: u64,
    /// Interval between two burning ticks, in milliseconds.
    pub dot_interval_ms: u64,
    /// Damage dealt by each burning tick.
    pub dot_damage: u32,
}

impl Default for BurstTuning {
    fn default() -> Self {
        Self {
            cooldown_ms: 3_000,
            max_radius: 200.0,
            expand_ms: 300,
            damage: 1,
            dot_duration_ms: 3_000,
            dot_interval_ms: 1_000,
            dot_damage: 1,
        }
    }
}

impl BurstTuning {
    pub(crate) fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

/// Projectile settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Side length of the projectile's bounding box.
    pub size: f32,
    /// Distance travelled per tick.
    pub speed: f32,
    /// Distance after which the projectile is dropped.
    pub max_range: f32,
    /// Damage dealt on hit.
    pub damage: u32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            size: 10.0,
            speed: 15.0,
            max_range: 600.0,
            damage: 1,
        }
    }
}

/// Treasure chest and health pickup settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    /// Probability that a defeated zombie drops a health pickup.
    pub loot_chance: f64,
    /// Side length of a health pickup.
    pub health_size: f32,
    /// Side length of a treasure chest.
    pub treasure_size: f32,
    /// Fewest charges a chest can grant.
    pub treasure_min_charges: u32,
    /// Most charges a chest can grant.
    pub treasure_max_charges: u32,
    /// How long an opened chest lingers before disappearing, in milliseconds.
    pub treasure_linger_ms: u64,
    /// Smallest coordinate a chest's top-left corner may take on either axis.
    pub treasure_near_margin: f32,
    /// Distance kept between a chest's top-left corner and the far world edges.
    pub treasure_far_margin: f32,
}

impl Default for PickupTuning {
    fn default() -> Self {
        Self {
            loot_chance: 0.2,
            health_size: 60.0,
            treasure_size: 70.0,
            treasure_min_charges: 1,
            treasure_max_charges: 3,
            treasure_linger_ms: 1_000,
            treasure_near_margin: 100.0,
            treasure_far_margin: 150.0,
        }
    }
}

/// Level goals and the difficulty ramp applied between levels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelTuning {
    /// Score needed to clear each level, indexed from level 1.
    pub goals: Vec<u32>,
    /// Last level; clearing it wins the episode.
    pub final_level: u32,
    /// Zombie cap on level 1.
    pub base_zombie_cap: usize,
    /// Extra zombies allowed per level advance.
    pub zombie_cap_step: usize,
    /// Highest zombie speed on level 1.
    pub base_speed_ceiling: u32,
    /// Speed ceiling increase per level advance.
    pub speed_ceiling_step: u32,
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            goals: vec![5, 10, 20, 30, 40],
            final_level: 5,
            base_zombie_cap: 5,
            zombie_cap_step: 3,
            base_speed_ceiling: 2,
            speed_ceiling_step: 1,
        }
    }
}

impl LevelTuning {
    /// Score needed to clear the provided level.
    ///
    /// Levels past the configured goals reuse the last goal.
    #[must_use]
    pub fn goal(&self, level: u32) -> u32 {
        let index = level.saturating_sub(1) as usize;
        self.goals
            .get(index)
            .or_else(|| self.goals.last())
            .copied()
            .unwrap_or(u32::MAX)
    }
}
