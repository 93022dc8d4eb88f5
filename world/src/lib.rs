#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for the Zombie Arena simulation.
//!
//! The world is mutated exclusively through [`apply`], which executes a
//! [`Command`] and reports what happened as [`Event`] values. Read access goes
//! through the [`query`] module. Every random draw the world makes (loot rolls,
//! chest contents, spawn jitter) comes from a generator seeded at construction.

mod config;
mod effects;
mod levels;

use std::time::Duration;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use zombie_arena_core::{
    Command, EffectId, Event, Facing, KillCause, PlayerSnapshot, Rect, SkillAdvisory, SkillKind,
    ZombieId, ZombieKind, ZombieSnapshot,
};

pub use config::{
    BurstTuning, LevelTuning, MeleeTuning, PickupTuning, PlayerTuning, ProjectileTuning,
    WorldConfig,
};
pub use effects::{BurstPhase, MeleePhase};

use effects::{AreaBurst, Burning, MeleeStrike, TimedEffect};

const SPAWN_JITTER: i32 = 5;
const MAX_SPAWN_ATTEMPTS: usize = 10_000;

/// Terminal state of an episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The player's health reached zero.
    Defeat,
    /// The player cleared the final level.
    Victory,
}

#[derive(Clone, Debug)]
struct Player {
    position: Vec2,
    size: f32,
    speed: f32,
    health: u32,
    score: u32,
    facing: Facing,
    last_melee: Option<Duration>,
    last_burst: Option<Duration>,
}

impl Player {
    fn spawn(position: Vec2, tuning: &PlayerTuning) -> Self {
        Self {
            position,
            size: tuning.size,
            speed: tuning.speed,
            health: tuning.health,
            score: 0,
            facing: Facing::Down,
            last_melee: None,
            last_burst: None,
        }
    }

    fn rect(&self) -> Rect {
        Rect::square(self.position, self.size)
    }
}

#[derive(Clone, Debug)]
struct Zombie {
    id: ZombieId,
    kind: ZombieKind,
    position: Vec2,
    health: u32,
    speed: f32,
    facing: Facing,
}

impl Zombie {
    fn rect(&self) -> Rect {
        Rect::square(self.position, self.kind.size())
    }

    fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Applies damage and reports whether this hit defeated the zombie.
    fn take_damage(&mut self, amount: u32) -> bool {
        let was_alive = self.is_alive();
        self.health = self.health.saturating_sub(amount);
        was_alive && !self.is_alive()
    }

    fn snapshot(&self) -> ZombieSnapshot {
        ZombieSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            health: self.health,
            speed: self.speed,
            facing: self.facing,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Projectile {
    position: Vec2,
    direction: Vec2,
    damage: u32,
    travelled: f32,
}

impl Projectile {
    fn rect(&self, size: f32) -> Rect {
        Rect::square(self.position, size)
    }
}

#[derive(Clone, Copy, Debug)]
struct Treasure {
    rect: Rect,
    opened_at: Option<Duration>,
}

#[derive(Clone, Copy, Debug)]
struct Advisory {
    kind: SkillAdvisory,
    raised_at: Duration,
}

/// Represents the authoritative Zombie Arena world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    rng: ChaCha8Rng,
    now: Duration,
    tick_index: u64,
    level: u32,
    walls: &'static [Rect],
    zombie_cap: usize,
    speed_ceiling: u32,
    player: Player,
    charges: u32,
    zombies: Vec<Zombie>,
    projectiles: Vec<Projectile>,
    effects: Vec<TimedEffect>,
    burning: Vec<Burning>,
    treasure: Option<Treasure>,
    health_pickup: Option<Rect>,
    advisory: Option<Advisory>,
    next_zombie_id: u32,
    next_effect_id: u32,
    outcome: Option<Outcome>,
}

impl World {
    /// Creates a world on level 1 with a freshly spawned player.
    #[must_use]
    pub fn new(config: WorldConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let walls = levels::walls_for(1);
        let position = spawn_point(&mut rng, walls, &config);
        let player = Player::spawn(position, &config.player);
        Self {
            rng,
            now: Duration::ZERO,
            tick_index: 0,
            level: 1,
            walls,
            zombie_cap: config.levels.base_zombie_cap,
            speed_ceiling: config.levels.base_speed_ceiling,
            player,
            charges: config.player.starting_charges,
            zombies: Vec::new(),
            projectiles: Vec::new(),
            effects: Vec::new(),
            burning: Vec::new(),
            treasure: None,
            health_pickup: None,
            advisory: None,
            next_zombie_id: 0,
            next_effect_id: 0,
            outcome: None,
            config,
        }
    }

    fn allocate_zombie_id(&mut self) -> ZombieId {
        let id = ZombieId::new(self.next_zombie_id);
        self.next_zombie_id = self.next_zombie_id.wrapping_add(1);
        id
    }

    fn allocate_effect_id(&mut self) -> EffectId {
        let id = EffectId::new(self.next_effect_id);
        self.next_effect_id = self.next_effect_id.wrapping_add(1);
        id
    }

    fn is_clear(&self, rect: &Rect) -> bool {
        is_clear(rect, self.walls)
    }

    fn reject(&mut self, skill: SkillKind, kind: SkillAdvisory, out_events: &mut Vec<Event>) {
        self.advisory = Some(Advisory {
            kind,
            raised_at: self.now,
        });
        out_events.push(Event::SkillRejected {
            skill,
            advisory: kind,
        });
    }

    fn use_skill(&mut self, skill: SkillKind, out_events: &mut Vec<Event>) {
        match skill {
            SkillKind::Melee => {
                let cooldown = self.config.melee.cooldown();
                if !cooldown_elapsed(self.player.last_melee, cooldown, self.now) {
                    self.reject(skill, SkillAdvisory::OnCooldown, out_events);
                    return;
                }

                let effect = self.allocate_effect_id();
                self.player.last_melee = Some(self.now);
                self.effects.push(TimedEffect::Melee(MeleeStrike::new(
                    effect,
                    self.now,
                    self.player.rect(),
                    self.player.facing,
                    &self.config.melee,
                )));
                out_events.push(Event::SkillActivated { skill, effect });
            }
            SkillKind::AreaBurst => {
                if self.charges == 0 {
                    self.reject(skill, SkillAdvisory::NoCharges, out_events);
                    return;
                }
                let cooldown = self.config.burst.cooldown();
                if !cooldown_elapsed(self.player.last_burst, cooldown, self.now) {
                    self.reject(skill, SkillAdvisory::OnCooldown, out_events);
                    return;
                }

                let effect = self.allocate_effect_id();
                self.charges -= 1;
                self.player.last_burst = Some(self.now);
                self.advisory = None;
                self.effects.push(TimedEffect::AreaBurst(AreaBurst::new(
                    effect,
                    self.now,
                    self.player.rect().center(),
                    &self.config.burst,
                )));
                out_events.push(Event::SkillActivated { skill, effect });
            }
        }
    }

    fn move_player(&mut self, direction: Facing, out_events: &mut Vec<Event>) {
        self.player.facing = direction;
        let from = self.player.position;
        let step = direction.unit() * self.player.speed;

        for axis_step in [Vec2::new(step.x, 0.0), Vec2::new(0.0, step.y)] {
            if axis_step == Vec2::ZERO {
                continue;
            }
            let candidate = self.player.rect().translated(axis_step);
            if candidate.within(self.config.width, self.config.height) && self.is_clear(&candidate)
            {
                self.player.position += axis_step;
            }
        }

        if self.player.position != from {
            out_events.push(Event::PlayerMoved {
                from,
                to: self.player.position,
            });
        }
    }

    /// Whether an area burst is still running; expired bursts awaiting removal do not count.
    fn burst_active(&self) -> bool {
        self.effects.iter().any(|effect| {
            matches!(effect, TimedEffect::AreaBurst(_)) && !effect.is_expired(self.now)
        })
    }

    fn resolve_projectiles(&mut self, out_events: &mut Vec<Event>) {
        let during_burst = self.burst_active();
        let size = self.config.projectile.size;
        let player_body = self.player.rect();
        let mut spent = vec![false; self.projectiles.len()];
        let mut kills = Vec::new();

        for zombie in self.zombies.iter_mut() {
            let body = zombie.rect();
            let hit = self
                .projectiles
                .iter()
                .enumerate()
                .find(|(index, projectile)| {
                    !spent[*index] && projectile.rect(size).intersects(&body)
                })
                .map(|(index, projectile)| (index, projectile.damage));

            if let Some((index, damage)) = hit {
                spent[index] = true;
                if zombie.take_damage(damage) {
                    kills.push((zombie.id, KillCause::Projectile { during_burst }));
                }
            } else if body.intersects(&player_body) {
                self.player.health = self.player.health.saturating_sub(1);
                out_events.push(Event::PlayerBitten {
                    zombie: zombie.id,
                    health: self.player.health,
                });
            }
        }

        let mut cursor = 0;
        self.projectiles.retain(|_| {
            let keep = !spent[cursor];
            cursor += 1;
            keep
        });
        self.reap(kills, out_events);

        let speed = self.config.projectile.speed;
        let max_range = self.config.projectile.max_range;
        let walls = self.walls;
        self.projectiles.retain_mut(|projectile| {
            projectile.position += projectile.direction * speed;
            projectile.travelled += speed;
            projectile.travelled <= max_range && is_clear(&projectile.rect(size), walls)
        });
    }

    fn resolve_effects(&mut self, out_events: &mut Vec<Event>) {
        let now = self.now;
        let mut kills = Vec::new();
        let mut effects = std::mem::take(&mut self.effects);

        effects.retain_mut(|effect| {
            if effect.is_expired(now) {
                out_events.push(Event::EffectExpired {
                    effect: effect.id(),
                });
                return false;
            }
            match effect {
                TimedEffect::Melee(strike) => self.strike(strike, &mut kills),
                TimedEffect::AreaBurst(burst) => self.ignite(burst, &mut kills),
            }
            true
        });

        self.effects = effects;
        self.reap(kills, out_events);
    }

    fn strike(&mut self, strike: &mut MeleeStrike, kills: &mut Vec<(ZombieId, KillCause)>) {
        if strike.processed || strike.phase(self.now) != MeleePhase::Active {
            return;
        }

        let area = strike.area();
        for zombie in self.zombies.iter_mut().filter(|zombie| zombie.is_alive()) {
            if !zombie.rect().intersects(&area) {
                continue;
            }
            strike.processed = true;
            if zombie.take_damage(strike.damage) {
                kills.push((zombie.id, KillCause::Melee { effect: strike.id }));
            }
        }
    }

    fn ignite(&mut self, burst: &mut AreaBurst, kills: &mut Vec<(ZombieId, KillCause)>) {
        let now = self.now;
        let radius = burst.radius(now);

        for zombie in self.zombies.iter_mut().filter(|zombie| zombie.is_alive()) {
            if burst.has_hit(zombie.id) || zombie.rect().center().distance(burst.origin) > radius {
                continue;
            }

            burst.register_hit(zombie.id);
            if zombie.take_damage(burst.damage) {
                kills.push((zombie.id, KillCause::AreaBurst { effect: burst.id }));
                continue;
            }
            self.burning.push(Burning {
                zombie: zombie.id,
                next_tick: now + burst.dot_interval,
                end: now + burst.dot_duration,
                interval: burst.dot_interval,
                damage: burst.dot_damage,
            });
        }
    }

    fn resolve_burning(&mut self, out_events: &mut Vec<Event>) {
        let now = self.now;
        let mut kills = Vec::new();
        let zombies = &mut self.zombies;

        self.burning.retain_mut(|burn| {
            let Some(zombie) = zombies
                .iter_mut()
                .find(|zombie| zombie.id == burn.zombie && zombie.is_alive())
            else {
                return false;
            };

            if now >= burn.next_tick {
                burn.next_tick += burn.interval;
                if zombie.take_damage(burn.damage) {
                    kills.push((burn.zombie, KillCause::Burning));
                    return false;
                }
            }
            now < burn.end
        });

        self.reap(kills, out_events);
    }

    fn resolve_pickups(&mut self, out_events: &mut Vec<Event>) {
        let body = self.player.rect();
        let linger = Duration::from_millis(self.config.pickups.treasure_linger_ms);
        let mut discard_treasure = false;

        if let Some(treasure) = self.treasure.as_mut() {
            let opened_at = treasure.opened_at;
            match opened_at {
                None if treasure.rect.intersects(&body) => {
                    let low = self.config.pickups.treasure_min_charges;
                    let high = self.config.pickups.treasure_max_charges.max(low);
                    let charges = self.rng.gen_range(low..=high);
                    self.charges = self.charges.saturating_add(charges);
                    treasure.opened_at = Some(self.now);
                    out_events.push(Event::TreasureOpened { charges });
                }
                Some(opened_at) => discard_treasure = self.now >= opened_at + linger,
                None => {}
            }
        }
        if discard_treasure {
            self.treasure = None;
        }

        if self
            .health_pickup
            .is_some_and(|pickup| pickup.intersects(&body))
        {
            self.health_pickup = None;
            let cap = self.config.player.health_cap;
            self.player.health = self.player.health.saturating_add(1).min(cap);
            out_events.push(Event::HealthCollected {
                health: self.player.health,
            });
        }
    }

    fn resolve_progress(&mut self, out_events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }

        if self.player.health == 0 {
            self.outcome = Some(Outcome::Defeat);
            out_events.push(Event::PlayerDefeated);
            return;
        }

        if self.player.score < self.config.levels.goal(self.level) {
            return;
        }

        if self.level >= self.config.levels.final_level {
            self.outcome = Some(Outcome::Victory);
            out_events.push(Event::ArenaCleared { level: self.level });
            return;
        }

        self.advance_level();
        out_events.push(Event::LevelAdvanced { level: self.level });
    }

    fn advance_level(&mut self) {
        self.level += 1;
        self.walls = levels::walls_for(self.level);
        self.zombies.clear();
        self.projectiles.clear();
        self.effects.clear();
        self.burning.clear();
        self.health_pickup = None;
        self.advisory = None;
        self.zombie_cap = self
            .zombie_cap
            .saturating_add(self.config.levels.zombie_cap_step);
        self.speed_ceiling = self
            .speed_ceiling
            .saturating_add(self.config.levels.speed_ceiling_step);

        let pickups = &self.config.pickups;
        let near = pickups.treasure_near_margin;
        let x = random_coordinate(
            &mut self.rng,
            near,
            self.config.width - pickups.treasure_far_margin,
        );
        let y = random_coordinate(
            &mut self.rng,
            near,
            self.config.height - pickups.treasure_far_margin,
        );
        self.treasure = Some(Treasure {
            rect: Rect::square(Vec2::new(x, y), pickups.treasure_size),
            opened_at: None,
        });

        let position = spawn_point(&mut self.rng, self.walls, &self.config);
        self.player = Player::spawn(position, &self.config.player);
    }

    /// Removes the zombies named in `kills`, crediting score and rolling loot.
    fn reap(&mut self, kills: Vec<(ZombieId, KillCause)>, out_events: &mut Vec<Event>) {
        for (id, cause) in kills {
            let Some(index) = self.zombies.iter().position(|zombie| zombie.id == id) else {
                continue;
            };
            let zombie = self.zombies.remove(index);
            self.player.score = self.player.score.saturating_add(1);
            out_events.push(Event::ZombieKilled {
                zombie: id,
                position: zombie.position,
                cause,
            });

            if self.rng.gen::<f64>() < self.config.pickups.loot_chance {
                self.health_pickup = Some(Rect::square(
                    zombie.position,
                    self.config.pickups.health_size,
                ));
                out_events.push(Event::HealthDropped {
                    position: zombie.position,
                });
            }
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.now = world.now.saturating_add(dt);
            world.tick_index = world.tick_index.saturating_add(1);
            let window = world.config.advisory_window();
            if world
                .advisory
                .is_some_and(|advisory| world.now >= advisory.raised_at + window)
            {
                world.advisory = None;
            }
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::UseSkill { skill } => world.use_skill(skill, out_events),
        Command::SpawnZombie {
            kind,
            position,
            speed,
        } => {
            if world.zombies.len() >= world.zombie_cap {
                return;
            }
            let id = world.allocate_zombie_id();
            world.zombies.push(Zombie {
                id,
                kind,
                position,
                health: kind.max_health(),
                speed,
                facing: Facing::Down,
            });
            out_events.push(Event::ZombieSpawned {
                zombie: id,
                kind,
                position,
            });
        }
        Command::MovePlayer { direction } => world.move_player(direction, out_events),
        Command::MoveZombie {
            zombie,
            position,
            facing,
        } => {
            let walls = world.walls;
            let Some(target) = world
                .zombies
                .iter_mut()
                .find(|candidate| candidate.id == zombie && candidate.is_alive())
            else {
                return;
            };

            target.facing = facing;
            let from = target.position;
            if position == from || !is_clear(&Rect::square(position, target.kind.size()), walls) {
                return;
            }
            target.position = position;
            out_events.push(Event::ZombieMoved {
                zombie,
                from,
                to: position,
            });
        }
        Command::FireProjectile { origin, direction } => {
            let direction = direction.normalize_or_zero();
            if direction == Vec2::ZERO {
                return;
            }
            let tuning = &world.config.projectile;
            world.projectiles.push(Projectile {
                position: origin - Vec2::splat(tuning.size * 0.5),
                direction,
                damage: tuning.damage,
                travelled: 0.0,
            });
        }
        Command::ResolveProjectiles => world.resolve_projectiles(out_events),
        Command::ResolveEffects => world.resolve_effects(out_events),
        Command::ResolveBurning => world.resolve_burning(out_events),
        Command::ResolvePickups => world.resolve_pickups(out_events),
        Command::ResolveProgress => world.resolve_progress(out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec2;
    use zombie_arena_core::{
        EffectId, PlayerSnapshot, Rect, SkillAdvisory, ZombieId, ZombieSnapshot,
    };

    use super::{BurstPhase, MeleePhase, Outcome, TimedEffect, World, WorldConfig};

    /// Provides read-only access to the tuning the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Captures the player's current state.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        PlayerSnapshot {
            position: world.player.position,
            size: world.player.size,
            health: world.player.health,
            score: world.player.score,
            facing: world.player.facing,
        }
    }

    /// Captures every zombie in ascending identifier order.
    #[must_use]
    pub fn zombies(world: &World) -> Vec<ZombieSnapshot> {
        let mut snapshots: Vec<ZombieSnapshot> =
            world.zombies.iter().map(|zombie| zombie.snapshot()).collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots
    }

    /// Number of zombies currently in the arena.
    #[must_use]
    pub fn zombie_count(world: &World) -> usize {
        world.zombies.len()
    }

    /// Maximum number of zombies allowed on the current level.
    #[must_use]
    pub fn zombie_cap(world: &World) -> usize {
        world.zombie_cap
    }

    /// Highest speed a zombie spawned on the current level may draw.
    #[must_use]
    pub fn speed_ceiling(world: &World) -> u32 {
        world.speed_ceiling
    }

    /// Wall rectangles of the current level.
    #[must_use]
    pub fn walls(world: &World) -> &[Rect] {
        world.walls
    }

    /// Width and height of the playable area.
    #[must_use]
    pub fn bounds(world: &World) -> Vec2 {
        Vec2::new(world.config.width, world.config.height)
    }

    /// Current level, starting at 1.
    #[must_use]
    pub fn level(world: &World) -> u32 {
        world.level
    }

    /// Score needed to clear the current level.
    #[must_use]
    pub fn level_goal(world: &World) -> u32 {
        world.config.levels.goal(world.level)
    }

    /// Area burst charges available to the player.
    #[must_use]
    pub fn charges(world: &World) -> u32 {
        world.charges
    }

    /// Bounding boxes of projectiles in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<Rect> {
        let size = world.config.projectile.size;
        world
            .projectiles
            .iter()
            .map(|projectile| projectile.rect(size))
            .collect()
    }

    /// Number of projectiles in flight.
    #[must_use]
    pub fn projectile_count(world: &World) -> usize {
        world.projectiles.len()
    }

    /// Presentation view of an active timed effect.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub enum EffectView {
        /// Melee strike and the area it covers.
        Melee {
            /// Identifier of the effect.
            id: EffectId,
            /// Lifecycle stage.
            phase: MeleePhase,
            /// Area the strike hits.
            area: Rect,
        },
        /// Area burst and its current ring.
        AreaBurst {
            /// Identifier of the effect.
            id: EffectId,
            /// Lifecycle stage.
            phase: BurstPhase,
            /// Centre of the ring.
            origin: Vec2,
            /// Current ring radius.
            radius: f32,
        },
    }

    /// Captures every active timed effect in creation order.
    #[must_use]
    pub fn effects(world: &World) -> Vec<EffectView> {
        world
            .effects
            .iter()
            .map(|effect| match effect {
                TimedEffect::Melee(strike) => EffectView::Melee {
                    id: strike.id,
                    phase: strike.phase(world.now),
                    area: strike.area(),
                },
                TimedEffect::AreaBurst(burst) => EffectView::AreaBurst {
                    id: burst.id,
                    phase: burst.phase(world.now),
                    origin: burst.origin,
                    radius: burst.radius(world.now),
                },
            })
            .collect()
    }

    /// Whether at least one area burst is in progress.
    #[must_use]
    pub fn area_burst_active(world: &World) -> bool {
        world.burst_active()
    }

    /// Zombies with a pending damage-over-time registration.
    #[must_use]
    pub fn burning_targets(world: &World) -> Vec<ZombieId> {
        world.burning.iter().map(|burn| burn.zombie).collect()
    }

    /// Presentation view of the treasure chest.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct TreasureView {
        /// Bounding box of the chest.
        pub rect: Rect,
        /// Whether the chest was already opened.
        pub opened: bool,
    }

    /// Treasure chest on the current level, if any.
    #[must_use]
    pub fn treasure(world: &World) -> Option<TreasureView> {
        world.treasure.map(|treasure| TreasureView {
            rect: treasure.rect,
            opened: treasure.opened_at.is_some(),
        })
    }

    /// Health pickup waiting to be collected, if any.
    #[must_use]
    pub fn health_pickup(world: &World) -> Option<Rect> {
        world.health_pickup
    }

    /// Advisory raised by the latest declined skill request, while it lasts.
    #[must_use]
    pub fn advisory(world: &World) -> Option<SkillAdvisory> {
        world.advisory.map(|advisory| advisory.kind)
    }

    /// Simulated time elapsed since the world was created.
    #[must_use]
    pub fn now(world: &World) -> Duration {
        world.now
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Terminal state reached by the episode, if any.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }
}

fn is_clear(rect: &Rect, walls: &[Rect]) -> bool {
    !walls.iter().any(|wall| wall.intersects(rect))
}

fn cooldown_elapsed(last: Option<Duration>, cooldown: Duration, now: Duration) -> bool {
    last.map_or(true, |used_at| now >= used_at.saturating_add(cooldown))
}

fn random_coordinate(rng: &mut ChaCha8Rng, low: f32, high: f32) -> f32 {
    let low = low.max(0.0) as u32;
    let high = (high.max(0.0) as u32).max(low);
    rng.gen_range(low..=high) as f32
}

/// Finds a wall-free spot for the player, starting at the world centre.
///
/// Falls back to a row-major scan when jittering fails to escape the walls.
fn spawn_point(rng: &mut ChaCha8Rng, walls: &[Rect], config: &WorldConfig) -> Vec2 {
    let size = config.player.size;
    let max = Vec2::new(config.width - size, config.height - size).max(Vec2::ZERO);
    let mut position = Vec2::new(config.width * 0.5, config.height * 0.5).min(max);

    for _ in 0..MAX_SPAWN_ATTEMPTS {
        if is_clear(&Rect::square(position, size), walls) {
            return position;
        }
        let jitter = Vec2::new(
            rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER) as f32,
            rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER) as f32,
        );
        position = (position + jitter).clamp(Vec2::ZERO, max);
    }

    let step = size.max(1.0);
    let mut y = 0.0;
    while y <= max.y {
        let mut x = 0.0;
        while x <= max.x {
            let candidate = Vec2::new(x, y);
            if is_clear(&Rect::square(candidate, size), walls) {
                return candidate;
            }
            x += step;
        }
        y += step;
    }
    position
}

#[cfg(test)]
mod tests {
    use super::*;
    use zombie_arena_core::TICK_DURATION;

    fn tick(world: &mut World, events: &mut Vec<Event>) {
        apply(world, Command::Tick { dt: TICK_DURATION }, events);
    }

    #[test]
    fn new_world_starts_on_level_one() {
        let world = World::new(WorldConfig::default(), 7);
        let player = query::player(&world);

        assert_eq!(player.health, 5);
        assert_eq!(player.score, 0);
        assert_eq!(player.position, Vec2::new(900.0, 600.0));
        assert_eq!(query::level(&world), 1);
        assert_eq!(query::level_goal(&world), 5);
        assert_eq!(query::charges(&world), 0);
        assert_eq!(query::zombie_cap(&world), 5);
        assert_eq!(query::speed_ceiling(&world), 2);
        assert!(query::zombies(&world).is_empty());
        assert!(query::treasure(&world).is_none());
        assert!(query::outcome(&world).is_none());
    }

    #[test]
    fn spawn_point_escapes_walls() {
        let walls = [Rect::new(850.0, 550.0, 200.0, 200.0)];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = WorldConfig::default();
        let position = spawn_point(&mut rng, &walls, &config);
        assert!(is_clear(&Rect::square(position, 70.0), &walls));
    }

    #[test]
    fn spawn_respects_zombie_cap() {
        let mut world = World::new(WorldConfig::default(), 1);
        let mut events = Vec::new();
        for _ in 0..8 {
            apply(
                &mut world,
                Command::SpawnZombie {
                    kind: ZombieKind::Ghost,
                    position: Vec2::new(0.0, 0.0),
                    speed: 1.0,
                },
                &mut events,
            );
        }
        assert_eq!(query::zombie_count(&world), 5);
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn player_is_blocked_by_walls() {
        let mut world = World::new(WorldConfig::default(), 1);
        let mut events = Vec::new();
        // Wall spans y 700..740 below the spawn point (900, 600).
        for _ in 0..40 {
            apply(
                &mut world,
                Command::MovePlayer {
                    direction: Facing::Down,
                },
                &mut events,
            );
            let body = query::player(&world).rect();
            assert!(query::walls(&world).iter().all(|wall| !wall.intersects(&body)));
        }
        assert_eq!(query::player(&world).position, Vec2::new(900.0, 630.0));
    }

    #[test]
    fn player_stays_inside_bounds() {
        let mut world = World::new(WorldConfig::default(), 1);
        let mut events = Vec::new();
        for _ in 0..300 {
            apply(
                &mut world,
                Command::MovePlayer {
                    direction: Facing::Right,
                },
                &mut events,
            );
        }
        let player = query::player(&world);
        assert_eq!(player.position.x, 1800.0 - 70.0);
        assert_eq!(player.facing, Facing::Right);
    }

    #[test]
    fn melee_respects_cooldown() {
        let mut world = World::new(WorldConfig::default(), 1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::UseSkill {
                skill: SkillKind::Melee,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::UseSkill {
                skill: SkillKind::Melee,
            },
            &mut events,
        );
        assert!(matches!(events[0], Event::SkillActivated { .. }));
        assert_eq!(
            events[1],
            Event::SkillRejected {
                skill: SkillKind::Melee,
                advisory: SkillAdvisory::OnCooldown,
            }
        );
        assert_eq!(query::advisory(&world), Some(SkillAdvisory::OnCooldown));
    }

    #[test]
    fn advisory_clears_after_window() {
        let mut world = World::new(WorldConfig::default(), 1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::UseSkill {
                skill: SkillKind::AreaBurst,
            },
            &mut events,
        );
        assert_eq!(query::advisory(&world), Some(SkillAdvisory::NoCharges));
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(2),
            },
            &mut events,
        );
        assert_eq!(query::advisory(&world), None);
    }

    #[test]
    fn melee_hits_zombie_in_front_once() {
        let mut world = World::new(WorldConfig::default(), 1);
        let mut events = Vec::new();
        // Player faces down by default; strike area is (895, 670)..(975, 750).
        apply(
            &mut world,
            Command::SpawnZombie {
                kind: ZombieKind::Bat,
                position: Vec2::new(880.0, 690.0),
                speed: 1.0,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::UseSkill {
                skill: SkillKind::Melee,
            },
            &mut events,
        );
        for _ in 0..3 {
            tick(&mut world, &mut events);
            apply(&mut world, Command::ResolveEffects, &mut events);
        }
        assert_eq!(query::zombies(&world)[0].health, 4);
    }

    #[test]
    fn burning_ticks_once_per_interval() {
        let config = WorldConfig {
            player: PlayerTuning {
                starting_charges: 1,
                ..PlayerTuning::default()
            },
            ..WorldConfig::default()
        };
        let mut world = World::new(config, 1);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnZombie {
                kind: ZombieKind::Ghost,
                position: Vec2::new(1000.0, 560.0),
                speed: 1.0,
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::UseSkill {
                skill: SkillKind::AreaBurst,
            },
            &mut events,
        );
        assert_eq!(query::charges(&world), 0);

        for _ in 0..240 {
            tick(&mut world, &mut events);
            apply(&mut world, Command::ResolveEffects, &mut events);
            apply(&mut world, Command::ResolveBurning, &mut events);
        }

        // One initial hit plus three burning ticks.
        assert_eq!(query::zombies(&world)[0].health, 8 - 4);
        assert!(query::burning_targets(&world).is_empty());
    }

    #[test]
    fn reaching_goal_advances_level() {
        let config = WorldConfig {
            levels: LevelTuning {
                goals: vec![1, 10],
                ..LevelTuning::default()
            },
            pickups: PickupTuning {
                loot_chance: 0.0,
                ..PickupTuning::default()
            },
            ..WorldConfig::default()
        };
        let mut world = World::new(config, 5);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnZombie {
                kind: ZombieKind::Bat,
                position: Vec2::new(1200.0, 100.0),
                speed: 1.0,
            },
            &mut events,
        );
        for _ in 0..6 {
            apply(
                &mut world,
                Command::FireProjectile {
                    origin: Vec2::new(1250.0, 150.0),
                    direction: Vec2::X,
                },
                &mut events,
            );
            apply(&mut world, Command::ResolveProjectiles, &mut events);
        }
        assert_eq!(query::player(&world).score, 1);

        let previous_cap = query::zombie_cap(&world);
        apply(&mut world, Command::ResolveProgress, &mut events);

        assert_eq!(query::level(&world), 2);
        assert!(query::zombie_cap(&world) > previous_cap);
        assert_eq!(query::speed_ceiling(&world), 3);
        assert_eq!(query::zombie_count(&world), 0);
        assert_eq!(query::projectile_count(&world), 0);
        assert!(query::effects(&world).is_empty());
        assert!(query::treasure(&world).is_some());
        assert_eq!(query::player(&world).score, 0);
        assert_eq!(events.last(), Some(&Event::LevelAdvanced { level: 2 }));
    }
}
