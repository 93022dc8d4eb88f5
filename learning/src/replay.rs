//! Fixed-capacity experience store.

use rand::{seq::index, Rng};
use zombie_arena_core::{Action, Observation, Transition};

#[derive(Clone, Debug)]
struct Entry {
    transition: Transition,
    index: u64,
}

/// Ring buffer of transitions that overwrites the oldest slot once full.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    capacity: usize,
    entries: Vec<Entry>,
    next_slot: usize,
    inserted: u64,
}

/// Transitions drawn by [`ReplayBuffer::sample`], batched field by field.
///
/// Position `i` of every vector belongs to the same transition.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// Observations before each action.
    pub states: Vec<Observation>,
    /// Actions that were applied.
    pub actions: Vec<Action>,
    /// Rewards accumulated by each action.
    pub rewards: Vec<f32>,
    /// Observations after each action.
    pub next_states: Vec<Observation>,
    /// Whether each action ended its episode.
    pub dones: Vec<bool>,
    /// Insertion index of each transition.
    pub indices: Vec<u64>,
}

impl Batch {
    /// Number of transitions in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the batch holds no transitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ReplayBuffer {
    /// Creates an empty store holding at most `capacity` transitions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity.min(1 << 16)),
            next_slot: 0,
            inserted: 0,
        }
    }

    /// Stores a transition, replacing the oldest one when full.
    pub fn store(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        let entry = Entry {
            transition,
            index: self.inserted,
        };
        self.inserted += 1;

        if self.entries.len() < self.capacity {
            self.entries.push(entry);
        } else {
            self.entries[self.next_slot] = entry;
        }
        self.next_slot = (self.next_slot + 1) % self.capacity;
    }

    /// Number of transitions currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no transitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of transitions held at once.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total transitions stored since creation, including overwritten ones.
    #[must_use]
    pub const fn inserted(&self) -> u64 {
        self.inserted
    }

    /// Whether a batch of `batch_size` distinct transitions can be drawn.
    #[must_use]
    pub fn can_sample(&self, batch_size: usize) -> bool {
        batch_size > 0 && self.entries.len() >= batch_size
    }

    /// Draws `batch_size` distinct transitions uniformly without replacement.
    ///
    /// Returns `None` when fewer than `batch_size` transitions are stored.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Option<Batch> {
        if !self.can_sample(batch_size) {
            return None;
        }

        let mut batch = Batch {
            states: Vec::with_capacity(batch_size),
            actions: Vec::with_capacity(batch_size),
            rewards: Vec::with_capacity(batch_size),
            next_states: Vec::with_capacity(batch_size),
            dones: Vec::with_capacity(batch_size),
            indices: Vec::with_capacity(batch_size),
        };
        for slot in index::sample(rng, self.entries.len(), batch_size) {
            let Entry { transition, index } = &self.entries[slot];
            batch.states.push(transition.state.clone());
            batch.actions.push(transition.action);
            batch.rewards.push(transition.reward);
            batch.next_states.push(transition.next_state.clone());
            batch.dones.push(transition.done);
            batch.indices.push(*index);
        }
        Some(batch)
    }
}
