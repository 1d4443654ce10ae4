use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, info_span};

use crate::ai::{build_agent, Agent, RandomAgent};
use crate::config::{ExperimentConfig, SimulatorKind};
use crate::env::{random_catalog, DriftEmbedder, RecEnv, TopKGenerator};
use crate::error::{SimulatorError, TrainingError};
use crate::simulation::{
    CompletionClient, LlmResponseSimulator, Persona, RandomResponseSimulator, ResponseSimulator,
};
use crate::training::episode::{derive_seed, run_episode};
use crate::training::metrics::{SeedSummary, TrainingMetrics};

/// Builds a completion client for the LLM simulator, given a seed.
pub type ClientFactory = Box<dyn Fn(u64) -> Box<dyn CompletionClient>>;

// Sub-stream indices for `derive_seed`.
const CATALOG_STREAM: usize = 0;
const PERSONA_STREAM: usize = 1;
const AGENT_STREAM: usize = 2;
const TRAIN_ENV_STREAM: usize = 3;
const EVAL_ENV_STREAM: usize = 4;
const BASELINE_STREAM: usize = 5;

/// Runs an experiment: trains a fresh agent per seed, then evaluates it
/// greedily against a uniform-random baseline.
pub struct Trainer {
    config: ExperimentConfig,
    client_factory: Option<ClientFactory>,
}

impl Trainer {
    pub fn new(config: ExperimentConfig) -> Self {
        Trainer {
            config,
            client_factory: None,
        }
    }

    /// Supply the transport used when `response_simulator.type` is `llm`.
    pub fn with_completion_client<F>(mut self, factory: F) -> Self
    where
        F: Fn(u64) -> Box<dyn CompletionClient> + 'static,
    {
        self.client_factory = Some(Box::new(factory));
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Train and evaluate every configured seed in order.
    pub fn run(&self) -> Result<Vec<SeedSummary>, TrainingError> {
        self.config.validate()?;
        info!(
            experiment = %self.config.experiment.experiment_name,
            agent = ?self.config.agent.kind,
            simulator = ?self.config.response_simulator.kind,
            seeds = ?self.config.experiment.seeds,
            "starting experiment"
        );

        self.config
            .experiment
            .seeds
            .iter()
            .map(|&seed| self.run_seed(seed))
            .collect()
    }

    /// Train and evaluate one seed.
    pub fn run_seed(&self, seed: u64) -> Result<SeedSummary, TrainingError> {
        let span = info_span!("seed", seed);
        let _guard = span.enter();

        let experiment = &self.config.experiment;
        let window = experiment.log_interval;
        let max_recs = experiment.max_recommendations;

        let mut agent = build_agent(&self.config, derive_seed(seed, AGENT_STREAM));
        let mut env = self.build_env(seed, TRAIN_ENV_STREAM)?;
        let mut metrics = TrainingMetrics::with_capacity(window.max(1));
        let mut episodes = Vec::with_capacity(experiment.total_episodes);

        info!(
            agent = agent.name(),
            persona = env.persona().id,
            simulator = env.simulator_name(),
            "training"
        );

        for episode in 1..=experiment.total_episodes {
            let trace = run_episode(&mut env, agent.as_mut(), max_recs, true)?;
            episodes.push(trace.result.clone());
            metrics.record_episode(trace.result);

            if episode % window == 0 {
                info!(
                    episode,
                    total = experiment.total_episodes,
                    epsilon = agent.epsilon(),
                    loss = metrics.average_loss(window),
                    reward = metrics.average_reward(window),
                    ctr = metrics.click_through_rate(window),
                    learn_steps = agent.step_count(),
                    "episode"
                );
            }
        }

        let eval_reward = self.evaluate(agent.as_mut(), seed)?;
        let mut baseline = RandomAgent::with_seed(derive_seed(seed, BASELINE_STREAM));
        let random_reward = self.evaluate(&mut baseline, seed)?;
        info!(eval_reward, random_reward, "evaluation vs random");

        let log_paths = self.config.log_paths(seed);
        Ok(SeedSummary {
            seed,
            agent: agent.name().to_string(),
            persona: env.persona(),
            episodes,
            learn_steps: agent.step_count(),
            final_epsilon: agent.epsilon(),
            recent_reward: metrics.average_reward(window),
            recent_click_through_rate: metrics.click_through_rate(window),
            eval_reward,
            random_reward,
            step_log_path: log_paths.step_log,
            episode_log_path: log_paths.episode_log,
        })
    }

    /// Mean episode reward of `agent` acting greedily over `eval_episodes`.
    ///
    /// Every agent evaluated for the same seed sees the same environment
    /// stream, so rewards are comparable.
    pub fn evaluate(&self, agent: &mut dyn Agent, seed: u64) -> Result<f32, TrainingError> {
        let episodes = self.config.experiment.eval_episodes;
        if episodes == 0 {
            return Ok(0.0);
        }
        let mut env = self.build_env(seed, EVAL_ENV_STREAM)?;
        let mut total = 0.0;
        for _ in 0..episodes {
            let trace = run_episode(
                &mut env,
                agent,
                self.config.experiment.max_recommendations,
                false,
            )?;
            total += trace.result.total_reward;
        }
        Ok(total / episodes as f32)
    }

    /// The catalog and persona depend only on `seed`; `stream` picks the
    /// environment and simulator randomness.
    fn build_env(&self, seed: u64, stream: usize) -> Result<RecEnv, TrainingError> {
        let env_params = self.config.env.params.clone();
        let embedder = &self.config.embedder.params;

        let mut catalog_rng = StdRng::seed_from_u64(derive_seed(seed, CATALOG_STREAM));
        let catalog = random_catalog(
            &env_params.content_types,
            env_params.catalog_size,
            embedder.content_dim,
            &mut catalog_rng,
        );
        let mut persona_rng = StdRng::seed_from_u64(derive_seed(seed, PERSONA_STREAM));
        let persona = Persona::resolve(
            self.config.response_simulator.params.persona_id,
            &mut persona_rng,
        );

        let stream_seed = derive_seed(seed, stream);
        let simulator = self.build_simulator(derive_seed(stream_seed, 1))?;

        Ok(RecEnv::new(
            env_params,
            catalog,
            Box::new(DriftEmbedder::new(embedder.user_dim, embedder.update_rate)),
            Box::new(TopKGenerator::new(self.config.candidate_generator.params.top_k)),
            simulator,
            persona,
            stream_seed,
        ))
    }

    fn build_simulator(&self, seed: u64) -> Result<Box<dyn ResponseSimulator>, TrainingError> {
        let params = &self.config.response_simulator.params;
        match self.config.response_simulator.kind {
            SimulatorKind::Random => Ok(Box::new(RandomResponseSimulator::new(
                params.click_probability,
                seed,
            ))),
            SimulatorKind::Llm => {
                let factory = self
                    .client_factory
                    .as_ref()
                    .ok_or(SimulatorError::MissingClient)?;
                Ok(Box::new(LlmResponseSimulator::new(
                    factory(seed),
                    params.llm_simulator.params.clone(),
                    seed,
                )))
            }
        }
    }
}
