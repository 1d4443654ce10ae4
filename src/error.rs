use std::path::PathBuf;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors raised by user-response simulators.
#[derive(Debug, thiserror::Error)]
pub enum SimulatorError {
    #[error("completion request failed: {0}")]
    Completion(String),

    #[error("malformed LLM response: {0}")]
    MalformedResponse(String),

    #[error("response count mismatch: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("llm response simulator requires a completion client")]
    MissingClient,
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("tensor data extraction failed: {0}")]
    Tensor(String),

    #[error("no candidates to choose from")]
    EmptyCandidates,

    #[error("slate item {content_type}[{index}] is not a known candidate")]
    InvalidSlate { content_type: String, index: usize },

    #[error("simulator error: {0}")]
    Simulator(#[from] SimulatorError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
