//! Hyperparameters for training and evaluation runs.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zombie_arena_env::ArenaConfig;

/// Errors raised while loading or validating a [`TrainingConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse training configuration")]
    Parse(#[from] toml::de::Error),
    /// The run would not play a single episode.
    #[error("episodes must be at least 1")]
    ZeroEpisodes,
    /// Episodes would end before taking a step.
    #[error("max_steps_per_episode must be at least 1")]
    ZeroSteps,
    /// The experience store cannot hold any transition.
    #[error("replay_capacity must be at least 1")]
    ZeroCapacity,
    /// Learning would never draw a transition.
    #[error("batch_size must be at least 1")]
    ZeroBatch,
    /// The store could never fill a batch.
    #[error("batch_size {batch} exceeds replay_capacity {capacity}")]
    BatchExceedsCapacity {
        /// Requested batch size.
        batch: usize,
        /// Configured store capacity.
        capacity: usize,
    },
    /// Discount factor outside `[0, 1]`.
    #[error("gamma {0} must lie within [0, 1]")]
    Gamma(f64),
    /// Soft update rate outside `(0, 1]`.
    #[error("tau {0} must lie within (0, 1]")]
    Tau(f64),
    /// Learning rate that is not strictly positive.
    #[error("learning_rate {0} must be positive")]
    LearningRate(f64),
    /// Each decision must run at least one tick.
    #[error("frame_skip must be at least 1")]
    ZeroFrameSkip,
    /// Dropout probability outside `[0, 1)`.
    #[error("dropout_rate {0} must lie within [0, 1)")]
    Dropout(f32),
    /// Target networks would never be synchronised.
    #[error("target_sync_interval_ticks must be at least 1")]
    ZeroSyncInterval,
    /// The hidden layers would have no units.
    #[error("hidden_width must be at least 1")]
    ZeroHiddenWidth,
    /// Exploration schedule that is not a decaying probability.
    #[error("epsilon schedule start {start}, decay {decay}, min {min} is invalid")]
    Epsilon {
        /// Initial exploration rate.
        start: f64,
        /// Per-episode multiplier.
        decay: f64,
        /// Exploration floor.
        min: f64,
    },
}

/// Hyperparameters of a training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Episodes to play.
    pub episodes: u32,
    /// Agent decisions allowed per episode.
    pub max_steps_per_episode: u32,
    /// Transitions per learning update.
    pub batch_size: usize,
    /// Discount factor.
    pub gamma: f64,
    /// Optimiser learning rate.
    pub learning_rate: f64,
    /// Initial exploration rate.
    pub epsilon_start: f64,
    /// Per-episode exploration multiplier.
    pub epsilon_decay: f64,
    /// Exploration floor.
    pub epsilon_min: f64,
    /// Soft target update rate.
    pub tau: f64,
    /// Episode ticks between soft target updates.
    pub target_sync_interval_ticks: u32,
    /// Experience store capacity.
    pub replay_capacity: usize,
    /// Units in each hidden layer of the estimator head.
    pub hidden_width: usize,
    /// Dropout probability used in training forward passes.
    pub dropout_rate: f32,
    /// Ticks each decision is repeated for.
    pub frame_skip: u32,
    /// Seed for exploration and replay sampling.
    pub seed: u64,
    /// Directory receiving the episode log, metrics and plots.
    pub output_dir: PathBuf,
    /// Directory receiving estimator checkpoints.
    pub models_dir: PathBuf,
    /// Arena tuning.
    pub arena: ArenaConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            max_steps_per_episode: 10_000 / 4,
            batch_size: 64,
            gamma: 0.99,
            learning_rate: 1e-3,
            epsilon_start: 1.0,
            epsilon_decay: 0.99,
            epsilon_min: 0.1,
            tau: 0.005,
            target_sync_interval_ticks: 4,
            replay_capacity: 500_000,
            hidden_width: 1024,
            dropout_rate: 0.2,
            frame_skip: 4,
            seed: 0,
            output_dir: PathBuf::from("runs"),
            models_dir: PathBuf::from("models"),
            arena: ArenaConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Reads and validates a configuration from a TOML file.
    ///
    /// Keys that are absent keep their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects hyperparameters the trainer cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.episodes == 0 {
            return Err(ConfigError::ZeroEpisodes);
        }
        if self.max_steps_per_episode == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        if self.replay_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatch);
        }
        if self.batch_size > self.replay_capacity {
            return Err(ConfigError::BatchExceedsCapacity {
                batch: self.batch_size,
                capacity: self.replay_capacity,
            });
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::Gamma(self.gamma));
        }
        if !(self.tau > 0.0 && self.tau <= 1.0) {
            return Err(ConfigError::Tau(self.tau));
        }
        if !(self.learning_rate > 0.0) {
            return Err(ConfigError::LearningRate(self.learning_rate));
        }
        if self.frame_skip == 0 {
            return Err(ConfigError::ZeroFrameSkip);
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(ConfigError::Dropout(self.dropout_rate));
        }
        if self.target_sync_interval_ticks == 0 {
            return Err(ConfigError::ZeroSyncInterval);
        }
        if self.hidden_width == 0 {
            return Err(ConfigError::ZeroHiddenWidth);
        }
        let probability = 0.0..=1.0;
        if !probability.contains(&self.epsilon_start)
            || !probability.contains(&self.epsilon_min)
            || !probability.contains(&self.epsilon_decay)
            || self.epsilon_min > self.epsilon_start
        {
            return Err(ConfigError::Epsilon {
                start: self.epsilon_start,
                decay: self.epsilon_decay,
                min: self.epsilon_min,
            });
        }
        Ok(())
    }

    /// Exploration rate after one more episode.
    #[must_use]
    pub fn decay_epsilon(&self, epsilon: f64) -> f64 {
        (epsilon * self.epsilon_decay).max(self.epsilon_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = TrainingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_steps_per_episode, 2500);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TrainingConfig::from_toml_str(
            "episodes = 3\nbatch_size = 8\n\n[arena]\nspawn_chance = 0.5\n",
        )
        .expect("valid config");
        assert_eq!(config.episodes, 3);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.arena.spawn_chance, 0.5);
        assert_eq!(config.gamma, 0.99);
        assert_eq!(config.arena.world.levels.final_level, 5);
    }

    #[test]
    fn batch_larger_than_store_is_rejected() {
        let config = TrainingConfig {
            replay_capacity: 16,
            batch_size: 32,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::BatchExceedsCapacity {
                batch: 32,
                capacity: 16
            })
        ));
    }

    #[test]
    fn out_of_range_rates_are_rejected() {
        let gamma = TrainingConfig {
            gamma: 1.5,
            ..TrainingConfig::default()
        };
        let tau = TrainingConfig {
            tau: 0.0,
            ..TrainingConfig::default()
        };
        let dropout = TrainingConfig {
            dropout_rate: 1.0,
            ..TrainingConfig::default()
        };
        let epsilon = TrainingConfig {
            epsilon_min: 0.5,
            epsilon_start: 0.1,
            ..TrainingConfig::default()
        };
        assert!(matches!(gamma.validate(), Err(ConfigError::Gamma(_))));
        assert!(matches!(tau.validate(), Err(ConfigError::Tau(_))));
        assert!(matches!(dropout.validate(), Err(ConfigError::Dropout(_))));
        assert!(matches!(epsilon.validate(), Err(ConfigError::Epsilon { .. })));
    }

    #[test]
    fn epsilon_decays_to_floor() {
        let config = TrainingConfig::default();
        let mut epsilon = config.epsilon_start;
        for _ in 0..1000 {
            epsilon = config.decay_epsilon(epsilon);
        }
        assert_eq!(epsilon, config.epsilon_min);
        assert!((config.decay_epsilon(1.0) - 0.99).abs() < 1e-12);
    }
}
