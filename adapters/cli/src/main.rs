#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that trains and evaluates Zombie Arena agents.

use std::path::PathBuf;

use anyhow::{Context, Result};
use candle_core::Device;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use zombie_arena_env::Arena;
use zombie_arena_learning::{
    checkpoint,
    evaluation::{self, EvaluationConfig},
    metrics::JsonlMetrics,
    LearnerConfig, Trainer, TrainingConfig, TwinQLearner,
};

/// Train and evaluate Zombie Arena agents.
#[derive(Debug, Parser)]
#[command(name = "zombie-arena", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Train twin estimators and persist the best ones.
    Train(TrainArgs),
    /// Play episodes with previously saved estimators.
    Evaluate(EvaluateArgs),
}

#[derive(Debug, Args)]
struct TrainArgs {
    /// TOML file with training hyperparameters.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the number of episodes.
    #[arg(long)]
    episodes: Option<u32>,
    /// Overrides the seed of the trainer and the arena.
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the directory receiving logs, metrics and plots.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Overrides the directory receiving checkpoints.
    #[arg(long)]
    models_dir: Option<PathBuf>,
    /// Warm-starts from the standalone estimator files in this directory.
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Runs on the CPU even when an accelerator is available.
    #[arg(long)]
    cpu: bool,
}

#[derive(Debug, Args)]
struct EvaluateArgs {
    /// TOML file with the hyperparameters the estimators were trained with.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory holding the standalone estimator files.
    #[arg(long)]
    models_dir: Option<PathBuf>,
    /// Episodes to play.
    #[arg(long, default_value_t = 5)]
    episodes: u32,
    /// Fixed exploration rate.
    #[arg(long, default_value_t = 0.05)]
    epsilon: f64,
    /// Overrides the seed of the arena and exploration.
    #[arg(long)]
    seed: Option<u64>,
    /// Runs on the CPU even when an accelerator is available.
    #[arg(long)]
    cpu: bool,
}

/// Entry point for the Zombie Arena command-line interface.
fn main() -> Result<()> {
    init_tracing();
    match Cli::parse().command {
        Command::Train(args) => train(args),
        Command::Evaluate(args) => evaluate(args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<TrainingConfig> {
    match path {
        Some(path) => TrainingConfig::from_toml_file(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(TrainingConfig::default()),
    }
}

fn select_device(cpu: bool) -> Result<Device> {
    if cpu {
        return Ok(Device::Cpu);
    }
    Device::cuda_if_available(0).context("failed to select a device")
}

fn train_config(args: &TrainArgs) -> Result<TrainingConfig> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(episodes) = args.episodes {
        config.episodes = episodes;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
        config.arena.seed = seed;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &args.models_dir {
        config.models_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn train(args: TrainArgs) -> Result<()> {
    let config = train_config(&args)?;
    let device = select_device(args.cpu)?;
    info!(?device, episodes = config.episodes, "starting training");

    let metrics = JsonlMetrics::create(&config.output_dir)
        .context("failed to open the metrics sink")?;
    let mut trainer = Trainer::new(config, &device, metrics)?;
    if let Some(dir) = &args.resume {
        let _ = trainer.resume_from(dir);
    }

    let summary = trainer.run()?;
    info!(
        best_score = summary.best_score,
        best_episode = ?summary.best_episode,
        total_steps = summary.total_steps,
        final_epsilon = summary.final_epsilon,
        "training finished"
    );
    Ok(())
}

fn evaluate(args: EvaluateArgs) -> Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        config.arena.seed = seed;
    }
    let models_dir = args.models_dir.unwrap_or_else(|| config.models_dir.clone());
    let device = select_device(args.cpu)?;

    let learner = TwinQLearner::new(
        LearnerConfig {
            gamma: config.gamma,
            tau: config.tau,
            learning_rate: config.learning_rate,
            hidden_width: config.hidden_width,
            dropout_rate: config.dropout_rate,
        },
        &device,
    )
    .context("failed to build estimators")?;
    if let Err(error) = checkpoint::load_estimators(&learner, &models_dir) {
        warn!(%error, "evaluating untrained estimators");
    }

    let mut arena = Arena::new(config.arena.clone());
    let results = evaluation::evaluate(
        &learner,
        &mut arena,
        &EvaluationConfig {
            episodes: args.episodes,
            epsilon: args.epsilon,
            max_steps_per_episode: config.max_steps_per_episode,
            frame_skip: config.frame_skip,
            seed: args.seed.unwrap_or(config.seed),
        },
    )?;

    if !results.is_empty() {
        let average =
            results.iter().map(|result| result.score).sum::<f32>() / results.len() as f32;
        info!(episodes = results.len(), average, "evaluation finished");
    }
    Ok(())
}
