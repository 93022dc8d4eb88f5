//! Episode loop tying the arena, experience store and learner together.

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use candle_core::Device;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use zombie_arena_core::Transition;
use zombie_arena_env::Arena;
use zombie_arena_world::query;

use crate::{
    checkpoint::{self, RecordMeta},
    config::TrainingConfig,
    episode_log::{EpisodeLog, EpisodeRecord},
    learner::{LearnerConfig, TwinQLearner},
    metrics::MetricsSink,
    plot,
    replay::ReplayBuffer,
};

/// File name of the episode log inside the output directory.
pub const EPISODE_LOG_FILE: &str = "training_log.csv";
/// File name of the training curve inside the output directory.
pub const TRAINING_CURVE_FILE: &str = "training_curve.png";

const CURVE_WIDTH: u32 = 800;
const CURVE_HEIGHT: u32 = 400;

/// Results of a completed training run.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingSummary {
    /// Episodes played.
    pub episodes: u32,
    /// Highest cumulative episode reward.
    pub best_score: f32,
    /// Episode that achieved the best score.
    pub best_episode: Option<u32>,
    /// Decisions taken across all episodes.
    pub total_steps: u64,
    /// Exploration rate after the last decay.
    pub final_epsilon: f64,
    /// Cumulative reward of every episode in order.
    pub scores: Vec<f32>,
    /// Combined record written for the best episode.
    pub best_checkpoint: Option<PathBuf>,
}

/// Runs the training loop described by a [`TrainingConfig`].
#[derive(Debug)]
pub struct Trainer<M> {
    config: TrainingConfig,
    arena: Arena,
    learner: TwinQLearner,
    replay: ReplayBuffer,
    rng: ChaCha8Rng,
    metrics: M,
    log: EpisodeLog,
}

impl<M: MetricsSink> Trainer<M> {
    /// Validates the configuration and prepares every collaborator of the run.
    pub fn new(config: TrainingConfig, device: &Device, metrics: M) -> Result<Self> {
        config.validate().context("invalid training configuration")?;
        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!(
                "failed to create output directory {}",
                config.output_dir.display()
            )
        })?;

        let learner = TwinQLearner::new(
            LearnerConfig {
                gamma: config.gamma,
                tau: config.tau,
                learning_rate: config.learning_rate,
                hidden_width: config.hidden_width,
                dropout_rate: config.dropout_rate,
            },
            device,
        )
        .context("failed to build estimators")?;
        let log_path = config.output_dir.join(EPISODE_LOG_FILE);
        let log = EpisodeLog::create(&log_path)
            .with_context(|| format!("failed to create {}", log_path.display()))?;

        Ok(Self {
            arena: Arena::new(config.arena.clone()),
            replay: ReplayBuffer::new(config.replay_capacity),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            learner,
            metrics,
            log,
            config,
        })
    }

    /// Learner being trained.
    #[must_use]
    pub fn learner(&self) -> &TwinQLearner {
        &self.learner
    }

    /// Warm-starts both estimators from the standalone files in `dir`.
    ///
    /// A missing or unreadable checkpoint is reported and training continues
    /// with the freshly initialised weights.
    pub fn resume_from(&mut self, dir: &Path) -> bool {
        match checkpoint::load_estimators(&self.learner, dir) {
            Ok(()) => {
                info!(dir = %dir.display(), "resumed estimators");
                true
            }
            Err(error) => {
                warn!(%error, "continuing without checkpoint");
                false
            }
        }
    }

    /// Plays every configured episode and returns the run summary.
    pub fn run(mut self) -> Result<TrainingSummary> {
        let mut epsilon = self.config.epsilon_start;
        let mut best_score = f32::NEG_INFINITY;
        let mut best_episode = None;
        let mut best_checkpoint = None;
        let mut total_steps = 0_u64;
        let mut scores = Vec::with_capacity(self.config.episodes as usize);

        for episode in 1..=self.config.episodes {
            let started = Instant::now();
            let (score, steps) = self.play_episode(epsilon, &mut total_steps)?;
            scores.push(score);

            if score > best_score {
                best_score = score;
                best_episode = Some(episode);
                let meta = RecordMeta {
                    best_score: score,
                    episode,
                };
                let path = checkpoint::save_best(&self.learner, &self.config.models_dir, meta)
                    .context("failed to save best estimators")?;
                best_checkpoint = Some(path);
            }

            self.log
                .append(&EpisodeRecord {
                    episode,
                    score,
                    epsilon,
                    steps,
                    duration_seconds: started.elapsed().as_secs_f64(),
                })
                .context("failed to append to episode log")?;
            self.metrics
                .emit("score", f64::from(score), u64::from(episode))?;
            self.metrics.emit("epsilon", epsilon, u64::from(episode))?;

            let recent = &scores[scores.len().saturating_sub(plot::MOVING_AVERAGE_WINDOW)..];
            let average = recent.iter().sum::<f32>() / recent.len() as f32;
            info!(
                episode,
                score,
                average,
                epsilon,
                steps,
                level = query::level(self.arena.world()),
                "episode finished"
            );

            epsilon = self.config.decay_epsilon(epsilon);
        }

        let curve = plot::training_curve(&scores, CURVE_WIDTH, CURVE_HEIGHT);
        let curve_path = self.config.output_dir.join(TRAINING_CURVE_FILE);
        curve
            .save(&curve_path)
            .with_context(|| format!("failed to write {}", curve_path.display()))?;
        self.metrics.emit_image("training_curve", &curve)?;

        Ok(TrainingSummary {
            episodes: self.config.episodes,
            best_score,
            best_episode,
            total_steps,
            final_epsilon: epsilon,
            scores,
            best_checkpoint,
        })
    }

    /// Plays one episode, learning after every decision once the store is ready.
    fn play_episode(&mut self, epsilon: f64, total_steps: &mut u64) -> Result<(f32, u32)> {
        let (mut state, _) = self.arena.reset();
        let mut score = 0.0;
        let mut steps = 0;

        while steps < self.config.max_steps_per_episode {
            let action = self
                .learner
                .select_action(&state, epsilon, &mut self.rng)?;
            let outcome = self.arena.step(action, self.config.frame_skip)?;
            steps += 1;
            *total_steps += 1;
            score += outcome.reward;

            self.replay.store(Transition {
                state,
                action,
                reward: outcome.reward,
                next_state: outcome.observation.clone(),
                done: outcome.done,
            });
            state = outcome.observation;

            if let Some(batch) = self
                .replay
                .sample(self.config.batch_size, &mut self.rng)
            {
                let losses = self.learner.learn(&batch)?;
                self.metrics
                    .emit("loss/q1", f64::from(losses.q1), *total_steps)?;
                self.metrics
                    .emit("loss/q2", f64::from(losses.q2), *total_steps)?;
                if steps % self.config.target_sync_interval_ticks == 0 {
                    self.learner.soft_update()?;
                }
            }

            if outcome.done {
                debug!(steps, score, "episode ended by the arena");
                break;
            }
        }
        Ok((score, steps))
    }
}
