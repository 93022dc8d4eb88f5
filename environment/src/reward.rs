//! Shaped reward derived from the events of a single tick.
//!
//! The values are game-balance constants and are not exposed as tuning knobs.

use std::collections::BTreeMap;

use zombie_arena_core::{Event, KillCause};

/// Reward for a tick in which the player changed position.
pub const MOVE_BONUS: f32 = 0.01;
/// Reward for a tick in which the player stayed in place.
pub const IDLE_PENALTY: f32 = -0.01;
/// Reward per zombie bite.
pub const BITE_PENALTY: f32 = -5.0;
/// Reward per projectile kill.
pub const PROJECTILE_KILL: f32 = 2.0;
/// Reward per projectile kill landed while an area burst is active.
pub const PROJECTILE_KILL_DURING_BURST: f32 = 3.0;
/// Reward per kill credited to melee, area burst or burning.
pub const SKILL_KILL: f32 = 1.0;
/// Bonus per extra kill when one skill activation defeats several zombies in a tick.
pub const MULTI_KILL_BONUS: f32 = 0.5;
/// Reward for opening a treasure chest.
pub const TREASURE_REWARD: f32 = 2.0;
/// Reward for collecting a health pickup.
pub const HEALTH_REWARD: f32 = 2.0;
/// Reward for clearing a level.
pub const LEVEL_CLEAR_REWARD: f32 = 20.0;

/// Sums every reward term triggered by the provided tick events.
#[must_use]
pub fn shape(events: &[Event]) -> f32 {
    let moved = events
        .iter()
        .any(|event| matches!(event, Event::PlayerMoved { .. }));
    let mut reward = if moved { MOVE_BONUS } else { IDLE_PENALTY };
    let mut kills_per_activation = BTreeMap::new();

    for event in events {
        reward += match event {
            Event::PlayerBitten { .. } => BITE_PENALTY,
            Event::ZombieKilled { cause, .. } => match *cause {
                KillCause::Projectile { during_burst: true } => PROJECTILE_KILL_DURING_BURST,
                KillCause::Projectile {
                    during_burst: false,
                } => PROJECTILE_KILL,
                KillCause::Melee { effect } | KillCause::AreaBurst { effect } => {
                    *kills_per_activation.entry(effect).or_insert(0_u32) += 1;
                    SKILL_KILL
                }
                KillCause::Burning => SKILL_KILL,
            },
            Event::TreasureOpened { .. } => TREASURE_REWARD,
            Event::HealthCollected { .. } => HEALTH_REWARD,
            Event::LevelAdvanced { .. } | Event::ArenaCleared { .. } => LEVEL_CLEAR_REWARD,
            _ => 0.0,
        };
    }

    for kills in kills_per_activation.into_values() {
        if kills > 1 {
            reward += MULTI_KILL_BONUS * (kills - 1) as f32;
        }
    }
    reward
}
