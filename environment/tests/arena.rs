use zombie_arena_core::{Action, SkillAdvisory, WeaponMode, OBSERVATION_LEN};
use zombie_arena_env::{outcome, Arena, ArenaConfig, ArenaError};
use zombie_arena_world::{query, LevelTuning, Outcome, PlayerTuning, WorldConfig};

fn quiet() -> ArenaConfig {
    ArenaConfig {
        spawn_chance: 0.0,
        ..ArenaConfig::default()
    }
}

fn with_levels(goals: Vec<u32>, final_level: u32) -> ArenaConfig {
    ArenaConfig {
        world: WorldConfig {
            levels: LevelTuning {
                goals,
                final_level,
                ..LevelTuning::default()
            },
            ..WorldConfig::default()
        },
        ..quiet()
    }
}

#[test]
fn reset_starts_a_fresh_episode() {
    let mut arena = Arena::new(ArenaConfig::default());
    let (observation, info) = arena.reset();

    assert_eq!(observation.as_bytes().len(), OBSERVATION_LEN);
    assert_eq!(info.health, 5);
    assert_eq!(info.area_skill_ammo, 0);
    assert_eq!(info.weapon_mode, WeaponMode::Single);
    assert_eq!(info.active_projectile_count, 0);

    let world = arena.world();
    assert_eq!(query::level(world), 1);
    assert_eq!(query::player(world).score, 0);
    assert_eq!(query::zombie_count(world), 0);
    assert!(query::effects(world).is_empty());
    assert!(!arena.is_done());
}

#[test]
fn idle_step_in_empty_arena_costs_a_little() {
    let mut arena = Arena::new(quiet());
    let _ = arena.reset();
    let outcome = arena.step(Action::NoOp, 1).expect("step");

    assert!((outcome.reward + 0.01).abs() < 1e-6);
    assert!(!outcome.done);
    assert!(!outcome.truncated);
    assert_eq!(outcome.info.health, 5);
}

#[test]
fn area_skill_without_charges_raises_advisory() {
    let mut arena = Arena::new(quiet());
    let _ = arena.reset();
    let outcome = arena.step(Action::AreaBurst, 1).expect("step");

    let world = arena.world();
    assert_eq!(query::advisory(world), Some(SkillAdvisory::NoCharges));
    assert!(query::effects(world).is_empty());
    assert!(!query::area_burst_active(world));
    assert_eq!(outcome.info.area_skill_ammo, 0);
    assert!((outcome.reward + 0.01).abs() < 1e-6);
}

#[test]
fn area_skill_with_charge_spends_it() {
    let config = ArenaConfig {
        world: WorldConfig {
            player: PlayerTuning {
                starting_charges: 2,
                ..PlayerTuning::default()
            },
            ..WorldConfig::default()
        },
        ..quiet()
    };
    let mut arena = Arena::new(config);
    let _ = arena.reset();
    let outcome = arena.step(Action::AreaBurst, 1).expect("step");

    assert_eq!(outcome.info.area_skill_ammo, 1);
    assert!(query::area_burst_active(arena.world()));
    assert_eq!(query::advisory(arena.world()), None);
}

#[test]
fn clearing_final_level_ends_the_episode() {
    let mut arena = Arena::new(with_levels(vec![0], 1));
    let _ = arena.reset();
    let step = arena.step(Action::NoOp, 4).expect("step");

    assert!(step.done);
    assert_eq!(outcome(&arena), Some(Outcome::Victory));
    assert_eq!(query::level(arena.world()), 1);
    assert!((step.reward - (20.0 - 0.01)).abs() < 1e-5);
    assert_eq!(arena.step(Action::NoOp, 1), Err(ArenaError::EpisodeOver));
}

#[test]
fn clearing_a_level_starts_the_next_one() {
    let mut arena = Arena::new(with_levels(vec![0, 10], 2));
    let _ = arena.reset();
    let step = arena.step(Action::NoOp, 1).expect("step");

    let world = arena.world();
    assert!(!step.done);
    assert_eq!(query::level(world), 2);
    assert_eq!(query::zombie_count(world), 0);
    assert_eq!(query::projectile_count(world), 0);
    assert!(query::effects(world).is_empty());
    assert!(query::treasure(world).is_some());
    assert_eq!(query::zombie_cap(world), 8);
    assert_eq!(query::speed_ceiling(world), 3);
    assert!((step.reward - (20.0 - 0.01)).abs() < 1e-5);
}

#[test]
fn zero_health_is_a_defeat() {
    let config = ArenaConfig {
        world: WorldConfig {
            player: PlayerTuning {
                health: 0,
                ..PlayerTuning::default()
            },
            ..WorldConfig::default()
        },
        ..quiet()
    };
    let mut arena = Arena::new(config);
    let _ = arena.reset();
    let step = arena.step(Action::Up, 3).expect("step");

    assert!(step.done);
    assert_eq!(outcome(&arena), Some(Outcome::Defeat));
}

#[test]
fn malformed_requests_are_rejected() {
    let mut arena = Arena::new(quiet());
    let _ = arena.reset();

    assert_eq!(arena.step(Action::Up, 0), Err(ArenaError::ZeroRepeat));
    match arena.step_code(7, 1) {
        Err(ArenaError::InvalidAction(error)) => assert_eq!(error.code(), 7),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(arena.step_code(6, 1).is_ok());
}

#[test]
fn reset_after_victory_restores_play() {
    let mut arena = Arena::new(with_levels(vec![0], 1));
    let _ = arena.reset();
    let _ = arena.step(Action::NoOp, 1).expect("step");
    assert!(arena.is_done());

    let (_, info) = arena.reset();
    assert!(!arena.is_done());
    assert_eq!(info.health, 5);
    assert!(arena.step(Action::NoOp, 1).expect("step").done);
}
