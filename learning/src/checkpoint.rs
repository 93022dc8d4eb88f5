//! Safetensors persistence for the twin estimators.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use candle_core::{Device, Tensor, Var};
use thiserror::Error;
use tracing::debug;

use crate::learner::{lock, TwinQLearner};

/// File name of the first standalone estimator.
pub const FIRST_ESTIMATOR_FILE: &str = "best_model_1.safetensors";
/// File name of the second standalone estimator.
pub const SECOND_ESTIMATOR_FILE: &str = "best_model_2.safetensors";

const PREFIXES: [&str; 2] = ["q1", "q2"];
const BEST_SCORE_KEY: &str = "meta.best_score";
const EPISODE_KEY: &str = "meta.episode";

/// Errors raised while persisting or restoring estimator weights.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The requested checkpoint does not exist.
    #[error("checkpoint {0} does not exist")]
    Missing(PathBuf),
    /// The checkpoint lacks a parameter the estimator needs.
    #[error("checkpoint {path} has no tensor named {name}")]
    MissingTensor {
        /// Checkpoint that was read.
        path: PathBuf,
        /// Parameter that was expected.
        name: String,
    },
    /// A stored parameter has a different shape than the estimator's.
    #[error("checkpoint {path} stores {name} with an incompatible shape")]
    ShapeMismatch {
        /// Checkpoint that was read.
        path: PathBuf,
        /// Parameter whose shape differs.
        name: String,
    },
    /// The checkpoint directory could not be created.
    #[error("failed to create checkpoint directory {path}")]
    Directory {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The tensor library failed to read, write or convert weights.
    #[error(transparent)]
    Tensor(#[from] candle_core::Error),
}

/// Metadata stored next to the weights in a combined record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordMeta {
    /// Best cumulative episode reward at the time of saving.
    pub best_score: f32,
    /// Episode that produced the best score.
    pub episode: u32,
}

/// File name of the combined record for an episode and score.
#[must_use]
pub fn record_file_name(meta: RecordMeta) -> String {
    format!(
        "best_model_ep{}_score{:.2}.safetensors",
        meta.episode, meta.best_score
    )
}

/// Writes both standalone estimator files and the combined record into `dir`.
///
/// Returns the path of the combined record.
pub fn save_best(
    learner: &TwinQLearner,
    dir: &Path,
    meta: RecordMeta,
) -> Result<PathBuf, CheckpointError> {
    std::fs::create_dir_all(dir).map_err(|source| CheckpointError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let [q1, q2] = learner.estimators();
    q1.online_vars().save(dir.join(FIRST_ESTIMATOR_FILE))?;
    q2.online_vars().save(dir.join(SECOND_ESTIMATOR_FILE))?;

    let mut tensors = HashMap::new();
    for (prefix, estimator) in PREFIXES.iter().zip(learner.estimators()) {
        for (name, var) in lock(estimator.online_vars())?.iter() {
            let _ = tensors.insert(
                format!("{prefix}.{name}"),
                var.as_tensor().to_device(&Device::Cpu)?,
            );
        }
    }
    let _ = tensors.insert(
        BEST_SCORE_KEY.to_owned(),
        Tensor::new(&[meta.best_score], &Device::Cpu)?,
    );
    let _ = tensors.insert(
        EPISODE_KEY.to_owned(),
        Tensor::new(&[meta.episode], &Device::Cpu)?,
    );

    let path = dir.join(record_file_name(meta));
    candle_core::safetensors::save(&tensors, &path)?;
    debug!(path = %path.display(), episode = meta.episode, "saved checkpoint");
    Ok(path)
}

/// Restores both estimators from the standalone files in `dir`.
///
/// Every file is read and checked before any weight changes, so a failed
/// load leaves the learner untouched. Target copies are reset to the
/// restored weights.
pub fn load_estimators(learner: &TwinQLearner, dir: &Path) -> Result<(), CheckpointError> {
    let files = [FIRST_ESTIMATOR_FILE, SECOND_ESTIMATOR_FILE];
    let mut staged = Vec::new();
    for (file, estimator) in files.iter().zip(learner.estimators()) {
        let path = dir.join(file);
        let tensors = read(&path)?;
        staged.extend(stage(estimator.online_vars(), &tensors, "", &path)?);
    }
    commit(learner, staged)
}

/// Restores both estimators from a combined record and returns its metadata.
///
/// Nothing is assigned unless the record holds every parameter and both
/// metadata entries.
pub fn load_record(learner: &TwinQLearner, path: &Path) -> Result<RecordMeta, CheckpointError> {
    let tensors = read(path)?;
    let scalar = |name: &str| {
        tensors
            .get(name)
            .ok_or_else(|| CheckpointError::MissingTensor {
                path: path.to_path_buf(),
                name: name.to_owned(),
            })
    };
    let meta = RecordMeta {
        best_score: scalar(BEST_SCORE_KEY)?.squeeze(0)?.to_scalar::<f32>()?,
        episode: scalar(EPISODE_KEY)?.squeeze(0)?.to_scalar::<u32>()?,
    };

    let mut staged = Vec::new();
    for (prefix, estimator) in PREFIXES.iter().zip(learner.estimators()) {
        staged.extend(stage(estimator.online_vars(), &tensors, prefix, path)?);
    }
    commit(learner, staged)?;
    Ok(meta)
}

/// Reads every tensor of a safetensors file onto the host.
fn read(path: &Path) -> Result<HashMap<String, Tensor>, CheckpointError> {
    if !path.exists() {
        return Err(CheckpointError::Missing(path.to_path_buf()));
    }
    Ok(candle_core::safetensors::load(path, &Device::Cpu)?)
}

/// Pairs each parameter with its stored value, moved to the parameter's device.
fn stage(
    vars: &candle_nn::VarMap,
    tensors: &HashMap<String, Tensor>,
    prefix: &str,
    path: &Path,
) -> Result<Vec<(Var, Tensor)>, CheckpointError> {
    let mut staged = Vec::new();
    for (name, var) in lock(vars)?.iter() {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        let tensor = tensors
            .get(&key)
            .ok_or_else(|| CheckpointError::MissingTensor {
                path: path.to_path_buf(),
                name: key.clone(),
            })?;
        if tensor.dims() != var.dims() {
            return Err(CheckpointError::ShapeMismatch {
                path: path.to_path_buf(),
                name: key,
            });
        }
        staged.push((var.clone(), tensor.to_device(var.device())?));
    }
    Ok(staged)
}

fn commit(learner: &TwinQLearner, staged: Vec<(Var, Tensor)>) -> Result<(), CheckpointError> {
    for (var, tensor) in staged {
        var.set(&tensor)?;
    }
    learner.hard_update()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_names_carry_episode_and_score() {
        let name = record_file_name(RecordMeta {
            best_score: 41.5,
            episode: 12,
        });
        assert_eq!(name, "best_model_ep12_score41.50.safetensors");
    }
}
