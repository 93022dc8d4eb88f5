#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Double-Q learning for the Zombie Arena.
//!
//! The [`trainer::Trainer`] plays episodes against the arena, stores every
//! decision in a [`replay::ReplayBuffer`] and trains a
//! [`learner::TwinQLearner`] on uniformly sampled batches. Best estimators are
//! persisted through [`checkpoint`], every episode is appended to a CSV log
//! and scalar metrics flow into a [`metrics::MetricsSink`].

pub mod checkpoint;
pub mod config;
pub mod episode_log;
pub mod evaluation;
pub mod learner;
pub mod metrics;
pub mod network;
pub mod plot;
pub mod replay;
pub mod trainer;

pub use config::{ConfigError, TrainingConfig};
pub use learner::{LearnerConfig, TwinQLearner};
pub use trainer::{Trainer, TrainingSummary};
