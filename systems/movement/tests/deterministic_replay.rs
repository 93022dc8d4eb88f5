use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use glam::Vec2;
use zombie_arena_core::{Command, Event, ZombieId, ZombieKind, TICK_DURATION};
use zombie_arena_system_movement::Movement;
use zombie_arena_world::{self as world, query, World, WorldConfig};

#[test]
fn deterministic_replay_produces_identical_snapshots() {
    let first = replay(scripted_spawns());
    let second = replay(scripted_spawns());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert!(
        first
            .events
            .iter()
            .any(|record| matches!(record, EventRecord::ZombieMoved { .. })),
        "expected zombies to move during replay"
    );
}

fn replay(spawns: Vec<Command>) -> ReplayOutcome {
    let mut world = World::new(WorldConfig::default(), 0x5eed);
    let mut movement = Movement::default();
    let mut log = Vec::new();

    for command in spawns {
        let mut events = Vec::new();
        world::apply(&mut world, command, &mut events);
        record_events(&events, &mut log);
    }

    for _ in 0..240 {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: TICK_DURATION }, &mut events);
        record_events(&events, &mut log);

        let mut commands = Vec::new();
        movement.handle(
            &events,
            &query::player(&world),
            &query::zombies(&world),
            query::walls(&world),
            &mut commands,
        );
        for command in commands {
            let mut generated = Vec::new();
            world::apply(&mut world, command, &mut generated);
            record_events(&generated, &mut log);
        }
    }

    let zombies = query::zombies(&world)
        .into_iter()
        .map(|zombie| ZombieState {
            id: zombie.id,
            position: bits(zombie.position),
        })
        .collect();

    ReplayOutcome {
        zombies,
        events: log,
    }
}

fn scripted_spawns() -> Vec<Command> {
    vec![
        Command::SpawnZombie {
            kind: ZombieKind::Bat,
            position: Vec2::new(0.0, 0.0),
            speed: 2.0,
        },
        Command::SpawnZombie {
            kind: ZombieKind::Ghost,
            position: Vec2::new(1680.0, 300.0),
            speed: 1.0,
        },
        Command::SpawnZombie {
            kind: ZombieKind::Demon,
            position: Vec2::new(600.0, 1080.0),
            speed: 2.0,
        },
    ]
}

fn bits(vector: Vec2) -> (u32, u32) {
    (vector.x.to_bits(), vector.y.to_bits())
}

fn record_events(events: &[Event], log: &mut Vec<EventRecord>) {
    log.extend(events.iter().filter_map(EventRecord::from_event));
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    zombies: Vec<ZombieState>,
    events: Vec<EventRecord>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ZombieState {
    id: ZombieId,
    position: (u32, u32),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum EventRecord {
    TimeAdvanced { dt_micros: u128 },
    ZombieSpawned { zombie: ZombieId },
    ZombieMoved { zombie: ZombieId, to: (u32, u32) },
}

impl EventRecord {
    fn from_event(event: &Event) -> Option<Self> {
        match event {
            Event::TimeAdvanced { dt } => Some(Self::TimeAdvanced {
                dt_micros: dt.as_micros(),
            }),
            Event::ZombieSpawned { zombie, .. } => Some(Self::ZombieSpawned { zombie: *zombie }),
            Event::ZombieMoved { zombie, to, .. } => Some(Self::ZombieMoved {
                zombie: *zombie,
                to: bits(*to),
            }),
            _ => None,
        }
    }
}
