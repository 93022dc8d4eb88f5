use glam::Vec2;
use zombie_arena_core::{Command, Event, ZombieId, ZombieKind};
use zombie_arena_world::{apply, query, Outcome, World, WorldConfig};

/// Level one spawns the player at (900, 600), clear of every wall.
fn arena_with_zombies_on_player(count: usize) -> World {
    let mut world = World::new(WorldConfig::default(), 5);
    let position = query::player(&world).position;
    let mut events = Vec::new();
    for _ in 0..count {
        apply(
            &mut world,
            Command::SpawnZombie {
                kind: ZombieKind::Bat,
                position,
                speed: 1.0,
            },
            &mut events,
        );
    }
    assert_eq!(query::zombie_count(&world), count);
    world
}

fn bites(events: &[Event]) -> Vec<(ZombieId, u32)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::PlayerBitten { zombie, health } => Some((*zombie, *health)),
            _ => None,
        })
        .collect()
}

#[test]
fn overlapping_zombie_bites_once_per_tick_and_stays() {
    let mut world = arena_with_zombies_on_player(1);
    let starting = query::player(&world).health;

    for tick in 1..=3 {
        let mut events = Vec::new();
        apply(&mut world, Command::ResolveProjectiles, &mut events);
        assert_eq!(bites(&events), vec![(ZombieId::new(0), starting - tick)]);
    }
    assert_eq!(query::player(&world).health, starting - 3);
    assert_eq!(query::zombie_count(&world), 1);
}

#[test]
fn every_overlapping_zombie_bites() {
    let mut world = arena_with_zombies_on_player(2);
    let starting = query::player(&world).health;

    let mut events = Vec::new();
    apply(&mut world, Command::ResolveProjectiles, &mut events);

    assert_eq!(bites(&events).len(), 2);
    assert_eq!(query::player(&world).health, starting - 2);
}

#[test]
fn zombie_struck_by_projectile_does_not_bite() {
    let mut world = arena_with_zombies_on_player(1);
    let starting = query::player(&world).health;
    let target = query::zombies(&world)[0].rect().center();

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::FireProjectile {
            origin: target,
            direction: Vec2::X,
        },
        &mut events,
    );
    apply(&mut world, Command::ResolveProjectiles, &mut events);

    assert!(bites(&events).is_empty());
    assert_eq!(query::player(&world).health, starting);
}

#[test]
fn health_saturates_at_zero_and_ends_in_defeat() {
    let mut world = arena_with_zombies_on_player(1);
    let starting = query::player(&world).health;

    let mut events = Vec::new();
    for _ in 0..starting + 2 {
        apply(&mut world, Command::ResolveProjectiles, &mut events);
    }
    assert_eq!(query::player(&world).health, 0);
    assert_eq!(bites(&events).last(), Some(&(ZombieId::new(0), 0)));
    assert_eq!(query::outcome(&world), None);

    apply(&mut world, Command::ResolveProgress, &mut events);
    assert_eq!(query::outcome(&world), Some(Outcome::Defeat));
    assert_eq!(events.last(), Some(&Event::PlayerDefeated));
}
