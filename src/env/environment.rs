use rand::rngs::StdRng;
use rand::SeedableRng;

use super::candidates::CandidateGenerator;
use super::content::{CandidateSet, Content, SlateItem};
use super::embedder::StateEmbedder;
use crate::config::EnvParams;
use crate::error::TrainingError;
use crate::simulation::{Persona, ResponseSimulator, UserResponse};

/// What the agent sees: the user state and the candidates it may recommend.
#[derive(Debug, Clone)]
pub struct Observation {
    pub user_state: Vec<f32>,
    pub candidates: CandidateSet,
}

/// Result of recommending one slate.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Recommended contents, in slate order.
    pub contents: Vec<Content>,
    pub responses: Vec<UserResponse>,
    /// Reward per slate item.
    pub rewards: Vec<f32>,
    pub next: Observation,
    pub done: bool,
}

impl StepOutcome {
    pub fn total_reward(&self) -> f32 {
        self.rewards.iter().sum()
    }

    pub fn clicks(&self) -> usize {
        self.responses.iter().filter(|r| r.clicked).count()
    }
}

/// Episodic recommendation environment.
///
/// Each step the agent recommends a slate, the response simulator reacts, the
/// embedder folds clicks into the user state, and fresh candidates are drawn.
/// An episode ends after `max_steps` steps.
pub struct RecEnv {
    params: EnvParams,
    catalog: Vec<Content>,
    embedder: Box<dyn StateEmbedder>,
    generator: Box<dyn CandidateGenerator>,
    simulator: Box<dyn ResponseSimulator>,
    persona: Persona,
    rng: StdRng,
    user_state: Vec<f32>,
    candidates: CandidateSet,
    step: usize,
}

impl RecEnv {
    pub fn new(
        params: EnvParams,
        catalog: Vec<Content>,
        embedder: Box<dyn StateEmbedder>,
        generator: Box<dyn CandidateGenerator>,
        simulator: Box<dyn ResponseSimulator>,
        persona: Persona,
        seed: u64,
    ) -> Self {
        RecEnv {
            params,
            catalog,
            embedder,
            generator,
            simulator,
            persona,
            rng: StdRng::seed_from_u64(seed),
            user_state: Vec::new(),
            candidates: CandidateSet::new(),
            step: 0,
        }
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn max_steps(&self) -> usize {
        self.params.max_steps
    }

    pub fn current_step(&self) -> usize {
        self.step
    }

    pub fn simulator_name(&self) -> &str {
        self.simulator.name()
    }

    /// Start a new episode.
    pub fn reset(&mut self) -> Observation {
        self.step = 0;
        self.user_state = self.embedder.initial_state(&mut self.rng);
        self.candidates = self.generator.generate(&self.user_state, &self.catalog);
        self.observation()
    }

    fn observation(&self) -> Observation {
        Observation {
            user_state: self.user_state.clone(),
            candidates: self.candidates.clone(),
        }
    }

    /// Reward for one item: flat click reward plus dwell reward per minute.
    pub fn reward(&self, response: &UserResponse) -> f32 {
        if !response.clicked {
            return 0.0;
        }
        self.params.click_reward + self.params.dwell_reward * response.dwell_time as f32 / 60.0
    }

    /// Recommend `slate` (positions into the current candidates).
    pub fn step(&mut self, slate: &[SlateItem]) -> Result<StepOutcome, TrainingError> {
        let contents = slate
            .iter()
            .map(|item| {
                self.candidates
                    .get(item)
                    .cloned()
                    .ok_or_else(|| TrainingError::InvalidSlate {
                        content_type: item.content_type.clone(),
                        index: item.index,
                    })
            })
            .collect::<Result<Vec<Content>, TrainingError>>()?;

        let responses = self.simulator.simulate(&self.persona, &contents)?;
        let rewards: Vec<f32> = responses.iter().map(|r| self.reward(r)).collect();

        let clicked: Vec<&Content> = contents
            .iter()
            .zip(&responses)
            .filter(|(_, r)| r.clicked)
            .map(|(c, _)| c)
            .collect();
        self.user_state = self.embedder.update(&self.user_state, &clicked);
        self.candidates = self.generator.generate(&self.user_state, &self.catalog);
        self.step += 1;

        Ok(StepOutcome {
            contents,
            responses,
            rewards,
            next: self.observation(),
            done: self.step >= self.params.max_steps,
        })
    }
}
