use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Keys a section does not model. Every section keeps them so that
/// `to_yaml` writes back everything that was read.
pub type ExtraKeys = BTreeMap<String, serde_yaml::Value>;

/// Top-level experiment configuration, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExperimentConfig {
    pub experiment: ExperimentSection,
    pub env: EnvConfig,
    pub agent: AgentConfig,
    pub replay: ReplayConfig,
    pub embedder: EmbedderConfig,
    pub candidate_generator: CandidateGeneratorConfig,
    pub response_simulator: ResponseSimulatorConfig,
    /// Top-level keys this crate does not read, kept for `to_yaml`.
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

/// Run-level settings: episode budget, slate size, seeds, log path templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentSection {
    pub experiment_name: String,
    pub total_episodes: usize,
    pub max_recommendations: usize,
    pub seeds: Vec<u64>,
    pub log_interval: usize,
    pub eval_episodes: usize,
    pub step_log_path: String,
    pub episode_log_path: String,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

impl Default for ExperimentSection {
    fn default() -> Self {
        ExperimentSection {
            experiment_name: "dqn_recommender".to_string(),
            total_episodes: 10,
            max_recommendations: 5,
            seeds: vec![0, 1, 2],
            log_interval: 1,
            eval_episodes: 2,
            step_log_path: "logs/{experiment_name}/step_log_seed_{seed}.csv".to_string(),
            episode_log_path: "logs/{experiment_name}/episode_log_seed_{seed}.csv".to_string(),
            extra: ExtraKeys::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EnvConfig {
    pub params: EnvParams,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

/// Recommendation environment parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvParams {
    pub max_steps: usize,
    pub content_types: Vec<String>,
    pub catalog_size: usize,
    pub click_reward: f32,
    pub dwell_reward: f32,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

impl Default for EnvParams {
    fn default() -> Self {
        EnvParams {
            max_steps: 20,
            content_types: vec![
                "news".to_string(),
                "video".to_string(),
                "shopping".to_string(),
            ],
            catalog_size: 50,
            click_reward: 1.0,
            dwell_reward: 0.1,
            extra: ExtraKeys::new(),
        }
    }
}

/// Network architecture variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    #[default]
    Dqn,
    DuelingDqn,
}

/// Temporal-difference loss kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mse,
    #[default]
    SmoothL1,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    #[serde(rename = "type")]
    pub kind: AgentKind,
    pub params: AgentParams,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

/// DQN hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentParams {
    pub lr: f64,
    pub batch_size: usize,
    pub eps_start: f32,
    pub eps_min: f32,
    pub eps_decay: f32,
    pub gamma: f32,
    pub update_freq: usize,
    pub loss_type: LossType,
    pub hidden_dim: usize,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

impl Default for AgentParams {
    fn default() -> Self {
        AgentParams {
            lr: 1e-3,
            batch_size: 32,
            eps_start: 1.0,
            eps_min: 0.05,
            eps_decay: 0.995,
            gamma: 0.99,
            update_freq: 100,
            loss_type: LossType::SmoothL1,
            hidden_dim: 128,
            extra: ExtraKeys::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub capacity: usize,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            capacity: 10_000,
            extra: ExtraKeys::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EmbedderConfig {
    pub params: EmbedderParams,
    /// `type` and any other embedder selection keys.
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

/// Embedding dimensions and the user-state drift rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderParams {
    pub user_dim: usize,
    pub content_dim: usize,
    pub update_rate: f32,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

impl Default for EmbedderParams {
    fn default() -> Self {
        EmbedderParams {
            user_dim: 32,
            content_dim: 32,
            update_rate: 0.3,
            extra: ExtraKeys::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CandidateGeneratorConfig {
    pub params: CandidateGeneratorParams,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateGeneratorParams {
    /// Candidates kept per content type.
    pub top_k: usize,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

impl Default for CandidateGeneratorParams {
    fn default() -> Self {
        CandidateGeneratorParams {
            top_k: 10,
            extra: ExtraKeys::new(),
        }
    }
}

/// Simulated-user behavior source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimulatorKind {
    #[default]
    Random,
    Llm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResponseSimulatorConfig {
    #[serde(rename = "type")]
    pub kind: SimulatorKind,
    pub params: ResponseSimulatorParams,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseSimulatorParams {
    pub persona_id: Option<u32>,
    pub click_probability: f64,
    pub llm_simulator: LlmSimulatorConfig,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

impl Default for ResponseSimulatorParams {
    fn default() -> Self {
        ResponseSimulatorParams {
            persona_id: None,
            click_probability: 0.2,
            llm_simulator: LlmSimulatorConfig::default(),
            extra: ExtraKeys::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LlmSimulatorConfig {
    pub params: LlmSimulatorParams,
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

/// LLM backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Ollama,
    OpenAi,
    OpenRouter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSimulatorParams {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f32,
    /// Provider-specific keys (endpoints, API key env names) carried through untouched.
    #[serde(flatten)]
    pub extra: ExtraKeys,
}

impl Default for LlmSimulatorParams {
    fn default() -> Self {
        LlmSimulatorParams {
            provider: LlmProvider::Ollama,
            model: "llama3".to_string(),
            temperature: 0.7,
            extra: ExtraKeys::new(),
        }
    }
}

/// Per-seed log file locations after template substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogPaths {
    pub step_log: PathBuf,
    pub episode_log: PathBuf,
}

/// Substitute `{experiment_name}` and `{seed}` in a path template.
pub fn render_path_template(template: &str, experiment_name: &str, seed: u64) -> PathBuf {
    PathBuf::from(
        template
            .replace("{experiment_name}", experiment_name)
            .replace("{seed}", &seed.to_string()),
    )
}

impl ExperimentConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: ExperimentConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if the
    /// file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Render the default configuration as YAML (useful for creating example
    /// config files).
    pub fn default_yaml() -> Result<String, ConfigError> {
        ExperimentConfig::default().to_yaml()
    }

    /// Resolved log paths for one seed.
    pub fn log_paths(&self, seed: u64) -> LogPaths {
        let name = &self.experiment.experiment_name;
        LogPaths {
            step_log: render_path_template(&self.experiment.step_log_path, name, seed),
            episode_log: render_path_template(&self.experiment.episode_log_path, name, seed),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let exp = &self.experiment;
        if exp.total_episodes == 0 {
            return Err(ConfigError::Validation(
                "experiment.total_episodes must be > 0".into(),
            ));
        }
        if exp.max_recommendations == 0 {
            return Err(ConfigError::Validation(
                "experiment.max_recommendations must be > 0".into(),
            ));
        }
        if exp.seeds.is_empty() {
            return Err(ConfigError::Validation(
                "experiment.seeds must not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = exp.seeds.iter().find(|s| !seen.insert(**s)) {
            return Err(ConfigError::Validation(format!(
                "experiment.seeds contains duplicate seed {dup}"
            )));
        }
        if exp.log_interval == 0 {
            return Err(ConfigError::Validation(
                "experiment.log_interval must be > 0".into(),
            ));
        }

        let env = &self.env.params;
        if env.max_steps == 0 {
            return Err(ConfigError::Validation(
                "env.params.max_steps must be > 0".into(),
            ));
        }
        if env.content_types.is_empty() {
            return Err(ConfigError::Validation(
                "env.params.content_types must not be empty".into(),
            ));
        }
        if env.catalog_size == 0 {
            return Err(ConfigError::Validation(
                "env.params.catalog_size must be > 0".into(),
            ));
        }

        let agent = &self.agent.params;
        if agent.lr <= 0.0 {
            return Err(ConfigError::Validation("agent.params.lr must be > 0".into()));
        }
        if agent.batch_size == 0 {
            return Err(ConfigError::Validation(
                "agent.params.batch_size must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&agent.gamma) {
            return Err(ConfigError::Validation(
                "agent.params.gamma must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&agent.eps_start) {
            return Err(ConfigError::Validation(
                "agent.params.eps_start must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&agent.eps_min) {
            return Err(ConfigError::Validation(
                "agent.params.eps_min must be in [0, 1]".into(),
            ));
        }
        if agent.eps_min > agent.eps_start {
            return Err(ConfigError::Validation(
                "agent.params.eps_min must be <= agent.params.eps_start".into(),
            ));
        }
        if agent.eps_decay <= 0.0 || agent.eps_decay > 1.0 {
            return Err(ConfigError::Validation(
                "agent.params.eps_decay must be in (0, 1]".into(),
            ));
        }
        if agent.update_freq == 0 {
            return Err(ConfigError::Validation(
                "agent.params.update_freq must be > 0".into(),
            ));
        }
        if agent.hidden_dim == 0 {
            return Err(ConfigError::Validation(
                "agent.params.hidden_dim must be > 0".into(),
            ));
        }
        if self.replay.capacity <= agent.batch_size {
            return Err(ConfigError::Validation(
                "replay.capacity must be > agent.params.batch_size".into(),
            ));
        }

        let emb = &self.embedder.params;
        if emb.user_dim == 0 || emb.content_dim == 0 {
            return Err(ConfigError::Validation(
                "embedder.params dimensions must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&emb.update_rate) {
            return Err(ConfigError::Validation(
                "embedder.params.update_rate must be in [0, 1]".into(),
            ));
        }
        if self.candidate_generator.params.top_k == 0 {
            return Err(ConfigError::Validation(
                "candidate_generator.params.top_k must be > 0".into(),
            ));
        }

        let sim = &self.response_simulator.params;
        if let Some(id) = sim.persona_id {
            if !(1..=100).contains(&id) {
                return Err(ConfigError::Validation(format!(
                    "response_simulator.params.persona_id must be in [1, 100], got {id}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&sim.click_probability) {
            return Err(ConfigError::Validation(
                "response_simulator.params.click_probability must be in [0, 1]".into(),
            ));
        }

        let mut paths = HashSet::new();
        for &seed in &exp.seeds {
            let resolved = self.log_paths(seed);
            if resolved.step_log == resolved.episode_log
                || !paths.insert(resolved.step_log.clone())
                || !paths.insert(resolved.episode_log.clone())
            {
                return Err(ConfigError::Validation(format!(
                    "log paths are not unique per seed (seed {seed}); include {{seed}} in the templates"
                )));
            }
        }

        Ok(())
    }
}
