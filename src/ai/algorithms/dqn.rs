use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::{InferBackend, TrainBackend};
use crate::ai::agent::{Agent, Transition, UpdateMetrics};
use crate::ai::encoding::{encode_column, encode_repeated, encode_rows, tensor_to_vec};
use crate::ai::epsilon::EpsilonSchedule;
use crate::ai::networks::QValueModel;
use crate::ai::random::random_slate;
use crate::config::{AgentParams, LossType};
use crate::env::{CandidateSet, SlateItem};
use crate::error::TrainingError;
use crate::training::replay_buffer::ReplayBuffer;

/// TD loss between predicted and target Q-values, both `[batch, 1]`.
///
/// `SmoothL1` is the Huber loss with a threshold of 1.
pub fn td_loss<B: Backend>(
    predicted: Tensor<B, 2>,
    target: Tensor<B, 2>,
    loss_type: LossType,
) -> Tensor<B, 1> {
    let diff = predicted - target;
    match loss_type {
        LossType::Mse => (diff.clone() * diff).mean(),
        LossType::SmoothL1 => {
            let abs = diff.abs();
            let quadratic = abs.clone().clamp_max(1.0);
            let linear = abs - quadratic.clone();
            (quadratic.clone() * quadratic * 0.5 + linear).mean()
        }
    }
}

/// DQN agent over (user state, content) pairs with online + target networks,
/// a replay buffer, and an Adam optimizer.
///
/// Generic over the Q-network so the plain and dueling variants share one
/// training loop.
pub struct DqnAgent<M>
where
    M: AutodiffModule<TrainBackend> + QValueModel<TrainBackend>,
    M::InnerModule: QValueModel<InferBackend>,
{
    q_network: M,
    target_network: M::InnerModule,
    optimizer: OptimizerAdaptor<Adam, M, TrainBackend>,
    replay_buffer: ReplayBuffer<Transition>,
    params: AgentParams,
    schedule: EpsilonSchedule,
    device: <TrainBackend as Backend>::Device,
    epsilon: f32,
    step_count: usize,
    episode_count: usize,
    rng: StdRng,
    name: String,
}

impl<M> DqnAgent<M>
where
    M: AutodiffModule<TrainBackend> + QValueModel<TrainBackend>,
    M::InnerModule: QValueModel<InferBackend>,
{
    pub fn new(
        q_network: M,
        params: AgentParams,
        replay_capacity: usize,
        seed: u64,
        name: impl Into<String>,
    ) -> Self {
        let target_network = q_network.valid();
        let optimizer = AdamConfig::new().init();
        let schedule = EpsilonSchedule::new(params.eps_start, params.eps_min, params.eps_decay);

        DqnAgent {
            q_network,
            target_network,
            optimizer,
            replay_buffer: ReplayBuffer::with_seed(replay_capacity, seed.wrapping_add(1)),
            epsilon: params.eps_start,
            params,
            schedule,
            device: Default::default(),
            step_count: 0,
            episode_count: 0,
            rng: StdRng::seed_from_u64(seed),
            name: name.into(),
        }
    }

    pub fn episode_count(&self) -> usize {
        self.episode_count
    }

    pub fn replay_len(&self) -> usize {
        self.replay_buffer.len()
    }

    /// Set epsilon directly (e.g. 0.0 for pure greedy inference).
    /// Holds until the next `end_episode`, which returns to the schedule.
    pub fn set_epsilon(&mut self, eps: f32) {
        self.epsilon = eps;
    }

    fn explore(&mut self, training: bool) -> bool {
        training && self.rng.random::<f32>() < self.epsilon
    }

    /// Q-values of every candidate row for one user state, via the online network.
    fn score(&self, user_state: &[f32], rows: &[&[f32]]) -> Result<Vec<f32>, TrainingError> {
        let device = Default::default();
        let states = encode_repeated::<InferBackend>(user_state, rows.len(), &device);
        let contents = encode_rows::<InferBackend>(rows, &device);
        tensor_to_vec(self.q_network.valid().q_values(states, contents))
    }

    /// `max_c Q_target(s', c)` per transition; 0 when no next candidates exist.
    fn next_max_q(&self, batch: &[Transition]) -> Result<Vec<f32>, TrainingError> {
        let mut states: Vec<&[f32]> = Vec::new();
        let mut contents: Vec<&[f32]> = Vec::new();
        for t in batch {
            for c in &t.next_candidates {
                states.push(&t.next_state);
                contents.push(c);
            }
        }
        if contents.is_empty() {
            return Ok(vec![0.0; batch.len()]);
        }

        let device = Default::default();
        let q = self.target_network.q_values(
            encode_rows::<InferBackend>(&states, &device),
            encode_rows::<InferBackend>(&contents, &device),
        );
        let q = tensor_to_vec(q)?;

        let mut offset = 0;
        let maxes = batch
            .iter()
            .map(|t| {
                let n = t.next_candidates.len();
                let best = q[offset..offset + n]
                    .iter()
                    .copied()
                    .fold(f32::NEG_INFINITY, f32::max);
                offset += n;
                if n == 0 { 0.0 } else { best }
            })
            .collect();
        Ok(maxes)
    }

    /// Perform one gradient update step from the replay buffer.
    fn train_step(&mut self) -> Result<UpdateMetrics, TrainingError> {
        let batch = self.replay_buffer.sample(self.params.batch_size);

        let next_max = self.next_max_q(&batch)?;
        let targets: Vec<f32> = batch
            .iter()
            .zip(&next_max)
            .map(|(t, &max_q)| {
                let not_done = if t.done { 0.0 } else { 1.0 };
                t.reward + self.params.gamma * max_q * not_done
            })
            .collect();

        let states: Vec<&[f32]> = batch.iter().map(|t| t.state.as_slice()).collect();
        let contents: Vec<&[f32]> = batch.iter().map(|t| t.content.as_slice()).collect();
        let predicted = self.q_network.q_values(
            encode_rows::<TrainBackend>(&states, &self.device),
            encode_rows::<TrainBackend>(&contents, &self.device),
        );
        let targets = encode_column::<TrainBackend>(&targets, &self.device);

        let loss = td_loss(predicted, targets, self.params.loss_type);
        let loss_val = tensor_to_vec(loss.clone())?
            .first()
            .copied()
            .ok_or_else(|| TrainingError::Tensor("empty loss tensor".to_string()))?;

        let grads = GradientsParams::from_grads(loss.backward(), &self.q_network);
        self.q_network = self
            .optimizer
            .step(self.params.lr, self.q_network.clone(), grads);

        self.step_count += 1;
        let target_synced = self.step_count % self.params.update_freq == 0;
        if target_synced {
            self.target_network = self.q_network.valid();
            info!(agent = %self.name, step = self.step_count, "target network synced");
        }
        debug!(agent = %self.name, step = self.step_count, loss = loss_val, "learn step");

        Ok(UpdateMetrics {
            loss: loss_val,
            learn_step: self.step_count,
            target_synced,
        })
    }
}

impl<M> Agent for DqnAgent<M>
where
    M: AutodiffModule<TrainBackend> + QValueModel<TrainBackend>,
    M::InnerModule: QValueModel<InferBackend>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn select_action(
        &mut self,
        user_state: &[f32],
        candidates: &[Vec<f32>],
        training: bool,
    ) -> Result<usize, TrainingError> {
        if candidates.is_empty() {
            return Err(TrainingError::EmptyCandidates);
        }
        if self.explore(training) {
            return Ok(self.rng.random_range(0..candidates.len()));
        }

        let rows: Vec<&[f32]> = candidates.iter().map(Vec::as_slice).collect();
        let q = self.score(user_state, &rows)?;
        let mut best = 0;
        for (i, value) in q.iter().enumerate() {
            if *value > q[best] {
                best = i;
            }
        }
        Ok(best)
    }

    fn select_slate(
        &mut self,
        user_state: &[f32],
        candidates: &CandidateSet,
        max_recs: usize,
        training: bool,
    ) -> Result<Vec<SlateItem>, TrainingError> {
        if candidates.is_empty() || max_recs == 0 {
            return Ok(Vec::new());
        }
        if self.explore(training) {
            return Ok(random_slate(&mut self.rng, candidates, max_recs));
        }

        let (items, rows): (Vec<SlateItem>, Vec<&[f32]>) = candidates
            .iter()
            .map(|(item, content)| (item, content.embedding.as_slice()))
            .unzip();
        let q = self.score(user_state, &rows)?;

        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by(|&a, &b| q[b].total_cmp(&q[a]));
        Ok(order
            .into_iter()
            .take(max_recs)
            .map(|i| items[i].clone())
            .collect())
    }

    fn store(&mut self, transition: Transition) {
        self.replay_buffer.push(transition);
    }

    fn learn(&mut self) -> Result<Option<UpdateMetrics>, TrainingError> {
        if self.replay_buffer.len() < self.params.batch_size {
            return Ok(None);
        }
        self.train_step().map(Some)
    }

    fn end_episode(&mut self) {
        self.episode_count += 1;
        self.epsilon = self.schedule.value_at(self.episode_count);
    }

    fn epsilon(&self) -> f32 {
        self.epsilon
    }

    fn step_count(&self) -> usize {
        self.step_count
    }
}
