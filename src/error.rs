/// Errors raised while building an engine or loading its inputs.
///
/// Analysis itself never fails; these only surface from configuration,
/// dataset handling and caller-side input validation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid lexicon pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reasons a caller should refuse a message before analysis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Message cannot be empty")]
    Empty,
    #[error("Message too long ({chars} characters, max {max})")]
    TooLong { chars: usize, max: usize },
}
