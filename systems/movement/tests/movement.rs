use glam::Vec2;
use zombie_arena_core::{Command, Event, Facing, ZombieKind, TICK_DURATION};
use zombie_arena_system_movement::Movement;
use zombie_arena_world::{self as world, query, World, WorldConfig};

fn spawn(world: &mut World, kind: ZombieKind, position: Vec2, speed: f32) {
    let mut events = Vec::new();
    world::apply(
        world,
        Command::SpawnZombie {
            kind,
            position,
            speed,
        },
        &mut events,
    );
    assert_eq!(events.len(), 1, "spawn should be accepted");
}

fn step(world: &mut World, movement: &mut Movement) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, Command::Tick { dt: TICK_DURATION }, &mut events);

    let mut commands = Vec::new();
    movement.handle(
        &events,
        &query::player(world),
        &query::zombies(world),
        query::walls(world),
        &mut commands,
    );

    let mut moved = Vec::new();
    for command in commands {
        world::apply(world, command, &mut moved);
    }
    moved
}

#[test]
fn zombie_walks_straight_towards_player() {
    let mut world = World::new(WorldConfig::default(), 11);
    spawn(&mut world, ZombieKind::Ghost, Vec2::new(0.0, 600.0), 2.0);
    let mut movement = Movement::default();

    let events = step(&mut world, &mut movement);

    let zombie = query::zombies(&world)[0];
    assert_eq!(zombie.position, Vec2::new(2.0, 600.0));
    assert_eq!(zombie.facing, Facing::Right);
    assert!(matches!(events.as_slice(), [Event::ZombieMoved { .. }]));
}

#[test]
fn blocked_zombie_deviates_around_wall() {
    let mut world = World::new(WorldConfig::default(), 11);
    // Resting on top of the wall spanning x 400..800 at y 300.
    let start = Vec2::new(450.0, 200.0);
    spawn(&mut world, ZombieKind::Bat, start, 2.0);
    let mut movement = Movement::default();

    let _ = step(&mut world, &mut movement);

    let zombie = query::zombies(&world)[0];
    assert_ne!(zombie.position, start);
    assert!(zombie.position.y < start.y, "expected an upward deviation");
    let body = zombie.rect();
    assert!(query::walls(&world)
        .iter()
        .all(|wall| !wall.intersects(&body)));
    assert_eq!(zombie.facing, Facing::Right);
}

#[test]
fn zombies_hold_still_without_elapsed_time() {
    let mut world = World::new(WorldConfig::default(), 11);
    spawn(&mut world, ZombieKind::Demon, Vec2::new(0.0, 0.0), 2.0);
    let mut movement = Movement::default();

    let mut commands = Vec::new();
    movement.handle(
        &[],
        &query::player(&world),
        &query::zombies(&world),
        query::walls(&world),
        &mut commands,
    );

    assert!(commands.is_empty());
}

#[test]
fn pursuit_never_enters_walls() {
    let mut world = World::new(WorldConfig::default(), 11);
    spawn(&mut world, ZombieKind::Bat, Vec2::new(500.0, 0.0), 3.0);
    spawn(&mut world, ZombieKind::Monster, Vec2::new(1600.0, 1000.0), 2.0);
    let mut movement = Movement::default();

    for _ in 0..600 {
        let _ = step(&mut world, &mut movement);
        for zombie in query::zombies(&world) {
            let body = zombie.rect();
            assert!(
                query::walls(&world)
                    .iter()
                    .all(|wall| !wall.intersects(&body)),
                "zombie {:?} entered a wall at {:?}",
                zombie.id,
                zombie.position
            );
        }
    }
}
