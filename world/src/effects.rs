//! Timed combat effects spawned by player skills.

use std::time::Duration;

use glam::Vec2;
use zombie_arena_core::{EffectId, Facing, Rect, ZombieId};

use crate::config::{BurstTuning, MeleeTuning};

/// Lifecycle stage of a melee strike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeleePhase {
    /// Waiting for the activation delay to pass.
    Pending,
    /// Hit window is open.
    Active,
    /// Hit window closed; the strike will be dropped.
    Expired,
}

/// Lifecycle stage of an area burst.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BurstPhase {
    /// Ring is still growing towards its maximum radius.
    Expanding,
    /// Ring is at full size while ignited zombies keep burning.
    Sustaining,
    /// Burst is over; it will be dropped.
    Expired,
}

#[derive(Clone, Debug)]
pub(crate) enum TimedEffect {
    Melee(MeleeStrike),
    AreaBurst(AreaBurst),
}

impl TimedEffect {
    pub(crate) fn id(&self) -> EffectId {
        match self {
            TimedEffect::Melee(strike) => strike.id,
            TimedEffect::AreaBurst(burst) => burst.id,
        }
    }

    pub(crate) fn is_expired(&self, now: Duration) -> bool {
        match self {
            TimedEffect::Melee(strike) => strike.phase(now) == MeleePhase::Expired,
            TimedEffect::AreaBurst(burst) => burst.phase(now) == BurstPhase::Expired,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct MeleeStrike {
    pub(crate) id: EffectId,
    started: Duration,
    delay: Duration,
    active: Duration,
    pub(crate) damage: u32,
    area: Rect,
    pub(crate) processed: bool,
}

impl MeleeStrike {
    /// Strike anchored to the caster's body at cast time.
    pub(crate) fn new(
        id: EffectId,
        started: Duration,
        caster: Rect,
        facing: Facing,
        tuning: &MeleeTuning,
    ) -> Self {
        Self {
            id,
            started,
            delay: Duration::from_millis(tuning.delay_ms),
            active: Duration::from_millis(tuning.active_ms),
            damage: tuning.damage,
            area: strike_area(caster, facing, tuning.reach),
            processed: false,
        }
    }

    pub(crate) fn phase(&self, now: Duration) -> MeleePhase {
        let elapsed = now.saturating_sub(self.started);
        if elapsed < self.delay {
            MeleePhase::Pending
        } else if elapsed < self.delay + self.active {
            MeleePhase::Active
        } else {
            MeleePhase::Expired
        }
    }

    pub(crate) const fn area(&self) -> Rect {
        self.area
    }
}

/// Square of side `reach` flush against the caster's edge in the facing direction.
fn strike_area(caster: Rect, facing: Facing, reach: f32) -> Rect {
    let origin = caster.origin();
    let size = caster.size();
    let center = caster.center();
    let half = reach * 0.5;
    let corner = match facing {
        Facing::Right => Vec2::new(origin.x + size.x, center.y - half),
        Facing::Left => Vec2::new(origin.x - reach, center.y - half),
        Facing::Up => Vec2::new(center.x - half, origin.y - reach),
        Facing::Down => Vec2::new(center.x - half, origin.y + size.y),
    };
    Rect::square(corner, reach)
}

#[derive(Clone, Debug)]
pub(crate) struct AreaBurst {
    pub(crate) id: EffectId,
    started: Duration,
    pub(crate) origin: Vec2,
    max_radius: f32,
    expand: Duration,
    pub(crate) damage: u32,
    pub(crate) dot_duration: Duration,
    pub(crate) dot_interval: Duration,
    pub(crate) dot_damage: u32,
    hit: Vec<ZombieId>,
}

impl AreaBurst {
    pub(crate) fn new(id: EffectId, started: Duration, origin: Vec2, tuning: &BurstTuning) -> Self {
        Self {
            id,
            started,
            origin,
            max_radius: tuning.max_radius,
            expand: Duration::from_millis(tuning.expand_ms),
            damage: tuning.damage,
            dot_duration: Duration::from_millis(tuning.dot_duration_ms),
            dot_interval: Duration::from_millis(tuning.dot_interval_ms),
            dot_damage: tuning.dot_damage,
            hit: Vec::new(),
        }
    }

    pub(crate) fn phase(&self, now: Duration) -> BurstPhase {
        let elapsed = now.saturating_sub(self.started);
        if elapsed < self.expand {
            BurstPhase::Expanding
        } else if elapsed <= self.expand + self.dot_duration {
            BurstPhase::Sustaining
        } else {
            BurstPhase::Expired
        }
    }

    /// Ring radius following a quadratic ease-out over the expansion window.
    pub(crate) fn radius(&self, now: Duration) -> f32 {
        if self.expand.is_zero() {
            return self.max_radius;
        }
        let elapsed = now.saturating_sub(self.started);
        let t = (elapsed.as_secs_f32() / self.expand.as_secs_f32()).min(1.0);
        self.max_radius * (1.0 - (1.0 - t) * (1.0 - t))
    }

    pub(crate) fn has_hit(&self, zombie: ZombieId) -> bool {
        self.hit.contains(&zombie)
    }

    pub(crate) fn register_hit(&mut self, zombie: ZombieId) {
        self.hit.push(zombie);
    }
}

/// Damage-over-time registration created by an area burst hit.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Burning {
    pub(crate) zombie: ZombieId,
    pub(crate) next_tick: Duration,
    pub(crate) end: Duration,
    pub(crate) interval: Duration,
    pub(crate) damage: u32,
}
