//! Playback of trained estimators without learning.

use std::time::{Duration, Instant};

use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use zombie_arena_env::{outcome, Arena};
use zombie_arena_world::{query, Outcome};

use crate::learner::TwinQLearner;

/// Settings for an evaluation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Episodes to play.
    pub episodes: u32,
    /// Fixed exploration rate.
    pub epsilon: f64,
    /// Decisions allowed per episode.
    pub max_steps_per_episode: u32,
    /// Ticks each decision is repeated for.
    pub frame_skip: u32,
    /// Seed for exploration.
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            episodes: 5,
            epsilon: 0.05,
            max_steps_per_episode: 10_000 / 4,
            frame_skip: 4,
            seed: 0,
        }
    }
}

/// Result of one evaluation episode.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationEpisode {
    /// Episode number, starting at 1.
    pub episode: u32,
    /// Cumulative reward.
    pub score: f32,
    /// Decisions taken.
    pub steps: u32,
    /// Wall-clock duration.
    pub duration: Duration,
    /// Level the episode ended on.
    pub level: u32,
    /// How the episode ended, if the arena ended it.
    pub outcome: Option<Outcome>,
}

/// Plays `config.episodes` episodes with a fixed exploration rate.
pub fn evaluate(
    learner: &TwinQLearner,
    arena: &mut Arena,
    config: &EvaluationConfig,
) -> Result<Vec<EvaluationEpisode>> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut results = Vec::with_capacity(config.episodes as usize);

    for episode in 1..=config.episodes {
        let started = Instant::now();
        let (mut state, _) = arena.reset();
        let mut score = 0.0;
        let mut steps = 0;

        while steps < config.max_steps_per_episode {
            let action = learner.select_action(&state, config.epsilon, &mut rng)?;
            let step = arena.step(action, config.frame_skip.max(1))?;
            steps += 1;
            score += step.reward;
            state = step.observation;
            if step.done {
                break;
            }
        }

        let result = EvaluationEpisode {
            episode,
            score,
            steps,
            duration: started.elapsed(),
            level: query::level(arena.world()),
            outcome: outcome(arena),
        };
        info!(
            episode,
            score,
            steps,
            level = result.level,
            outcome = ?result.outcome,
            seconds = result.duration.as_secs_f64(),
            "evaluation episode finished"
        );
        results.push(result);
    }
    Ok(results)
}
