//! Double-Q learner holding two estimators with lagging target copies.

use candle_core::{DType, Device, Result, Tensor, Var, D};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::Rng;
use zombie_arena_core::{Action, Observation, ACTION_COUNT, OBSERVATION_SIDE};

use crate::{network::QNetwork, replay::Batch};

/// Hyperparameters the learner needs from the run configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LearnerConfig {
    /// Discount factor.
    pub gamma: f64,
    /// Soft target update rate.
    pub tau: f64,
    /// Optimiser learning rate.
    pub learning_rate: f64,
    /// Units per hidden layer.
    pub hidden_width: usize,
    /// Dropout probability during training forward passes.
    pub dropout_rate: f32,
}

/// Huber losses of both estimators for one update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Losses {
    /// Loss of the first estimator.
    pub q1: f32,
    /// Loss of the second estimator.
    pub q2: f32,
}

/// Online network, its target copy and the optimiser driving it.
pub(crate) struct Estimator {
    online_vars: VarMap,
    online: QNetwork,
    target_vars: VarMap,
    target: QNetwork,
    optimizer: AdamW,
}

impl Estimator {
    fn new(config: &LearnerConfig, device: &Device) -> Result<Self> {
        let online_vars = VarMap::new();
        let target_vars = VarMap::new();
        let online = QNetwork::new(
            VarBuilder::from_varmap(&online_vars, DType::F32, device),
            config.hidden_width,
            config.dropout_rate,
        )?;
        let target = QNetwork::new(
            VarBuilder::from_varmap(&target_vars, DType::F32, device),
            config.hidden_width,
            config.dropout_rate,
        )?;
        let optimizer = AdamW::new(
            online_vars.all_vars(),
            ParamsAdamW {
                lr: config.learning_rate,
                weight_decay: 0.0,
                ..ParamsAdamW::default()
            },
        )?;

        let estimator = Self {
            online_vars,
            online,
            target_vars,
            target,
            optimizer,
        };
        estimator.blend_target(1.0)?;
        Ok(estimator)
    }

    pub(crate) fn online_vars(&self) -> &VarMap {
        &self.online_vars
    }

    /// Moves every target parameter `tau` of the way towards its online counterpart.
    pub(crate) fn blend_target(&self, tau: f64) -> Result<()> {
        let online = lock(&self.online_vars)?;
        let target = lock(&self.target_vars)?;
        for (name, target_var) in target.iter() {
            let online_var = online.get(name).ok_or_else(|| {
                candle_core::Error::Msg(format!("missing online parameter {name}"))
            })?;
            let blended = if tau >= 1.0 {
                online_var.as_tensor().detach()
            } else {
                ((target_var.as_tensor() * (1.0 - tau))? + (online_var.as_tensor() * tau)?)?
                    .detach()
            };
            target_var.set(&blended)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Estimator")
            .field("parameters", &self.online_vars.all_vars().len())
            .finish()
    }
}

pub(crate) fn lock(
    vars: &VarMap,
) -> Result<std::sync::MutexGuard<'_, std::collections::HashMap<String, Var>>> {
    vars.data()
        .lock()
        .map_err(|_| candle_core::Error::Msg("parameter store lock poisoned".to_owned()))
}

/// Twin estimators trained against the minimum of their target estimates.
#[derive(Debug)]
pub struct TwinQLearner {
    q1: Estimator,
    q2: Estimator,
    device: Device,
    gamma: f64,
    tau: f64,
}

impl TwinQLearner {
    /// Creates both estimators on `device` with targets equal to the online weights.
    pub fn new(config: LearnerConfig, device: &Device) -> Result<Self> {
        Ok(Self {
            q1: Estimator::new(&config, device)?,
            q2: Estimator::new(&config, device)?,
            device: device.clone(),
            gamma: config.gamma,
            tau: config.tau,
        })
    }

    /// Device the estimators live on.
    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    pub(crate) fn estimators(&self) -> [&Estimator; 2] {
        [&self.q1, &self.q2]
    }

    /// Chooses uniformly at random with probability `epsilon`, otherwise
    /// the action maximising `min(Q1, Q2)`.
    pub fn select_action<R: Rng + ?Sized>(
        &self,
        observation: &Observation,
        epsilon: f64,
        rng: &mut R,
    ) -> Result<Action> {
        if rng.gen::<f64>() < epsilon {
            let index = rng.gen_range(0..ACTION_COUNT);
            return Ok(Action::from_index(index).unwrap_or(Action::NoOp));
        }
        self.greedy_action(observation)
    }

    /// Action maximising `min(Q1, Q2)` for the observation.
    pub fn greedy_action(&self, observation: &Observation) -> Result<Action> {
        let state = self.observations(std::slice::from_ref(observation))?;
        let q1 = self.q1.online.forward(&state, false)?;
        let q2 = self.q2.online.forward(&state, false)?;
        let index = q1
            .minimum(&q2)?
            .argmax(D::Minus1)?
            .squeeze(0)?
            .to_scalar::<u32>()?;
        Ok(Action::from_index(index as usize).unwrap_or(Action::NoOp))
    }

    /// Runs one gradient step on each estimator.
    pub fn learn(&mut self, batch: &Batch) -> Result<Losses> {
        let states = self.observations(&batch.states)?;
        let next_states = self.observations(&batch.next_states)?;
        let actions: Vec<u32> = batch
            .actions
            .iter()
            .map(|action| action.index() as u32)
            .collect();
        let actions = Tensor::from_vec(actions, batch.len(), &self.device)?.unsqueeze(1)?;
        let rewards = Tensor::from_slice(&batch.rewards, batch.len(), &self.device)?;
        let dones: Vec<f32> = batch
            .dones
            .iter()
            .map(|&done| if done { 1.0 } else { 0.0 })
            .collect();
        let dones = Tensor::from_vec(dones, batch.len(), &self.device)?;

        let next_q1 = next_value(&self.q1, &next_states)?;
        let next_q2 = next_value(&self.q2, &next_states)?;
        let targets = bootstrap_targets(&rewards, &dones, &next_q1, &next_q2, self.gamma)?;

        let q1 = update(&mut self.q1, &states, &actions, &targets)?;
        let q2 = update(&mut self.q2, &states, &actions, &targets)?;
        Ok(Losses { q1, q2 })
    }

    /// Blends both target copies towards their online estimators.
    pub fn soft_update(&self) -> Result<()> {
        self.q1.blend_target(self.tau)?;
        self.q2.blend_target(self.tau)
    }

    /// Overwrites both target copies with their online estimators.
    pub fn hard_update(&self) -> Result<()> {
        self.q1.blend_target(1.0)?;
        self.q2.blend_target(1.0)
    }

    /// Online action values of the first and second estimator for a batch.
    pub fn action_values(&self, observations: &[Observation]) -> Result<(Tensor, Tensor)> {
        let states = self.observations(observations)?;
        Ok((
            self.q1.online.forward(&states, false)?,
            self.q2.online.forward(&states, false)?,
        ))
    }

    /// Target action values of the first and second estimator for a batch.
    pub fn target_values(&self, observations: &[Observation]) -> Result<(Tensor, Tensor)> {
        let states = self.observations(observations)?;
        Ok((
            self.q1.target.forward(&states, false)?,
            self.q2.target.forward(&states, false)?,
        ))
    }

    fn observations(&self, observations: &[Observation]) -> Result<Tensor> {
        let pixels: Vec<f32> = observations
            .iter()
            .flat_map(|observation| observation.as_bytes().iter().map(|&value| f32::from(value)))
            .collect();
        Tensor::from_vec(
            pixels,
            (observations.len(), 1, OBSERVATION_SIDE, OBSERVATION_SIDE),
            &self.device,
        )
    }
}

/// Target estimate of the online estimator's preferred next action.
fn next_value(estimator: &Estimator, next_states: &Tensor) -> Result<Tensor> {
    let preferred = estimator
        .online
        .forward(next_states, false)?
        .argmax(D::Minus1)?
        .unsqueeze(1)?;
    estimator
        .target
        .forward(next_states, false)?
        .gather(&preferred, 1)?
        .squeeze(1)
}

fn update(
    estimator: &mut Estimator,
    states: &Tensor,
    actions: &Tensor,
    targets: &Tensor,
) -> Result<f32> {
    let predicted = estimator
        .online
        .forward(states, true)?
        .gather(actions, 1)?
        .squeeze(1)?;
    let loss = huber(&predicted, targets)?;
    estimator.optimizer.backward_step(&loss)?;
    loss.to_scalar::<f32>()
}

/// Computes `r + (1 - done) * gamma * min(next_q1, next_q2)`, detached from the graph.
pub fn bootstrap_targets(
    rewards: &Tensor,
    dones: &Tensor,
    next_q1: &Tensor,
    next_q2: &Tensor,
    gamma: f64,
) -> Result<Tensor> {
    let continuing = dones.affine(-1.0, 1.0)?;
    let future = (next_q1.minimum(next_q2)? * gamma)?;
    Ok(rewards.add(&continuing.mul(&future)?)?.detach())
}

/// Smooth L1 loss with a threshold of 1, averaged over the batch.
pub fn huber(predicted: &Tensor, targets: &Tensor) -> Result<Tensor> {
    let diff = predicted.sub(targets)?;
    let abs = diff.abs()?;
    let ones = abs.ones_like()?;
    abs.lt(&ones)?
        .where_cond(&diff.sqr()?.affine(0.5, 0.0)?, &abs.affine(1.0, -0.5)?)?
        .mean_all()
}
