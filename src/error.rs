use thiserror::Error;

pub type Result<T, E = YatraError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum YatraError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Malformed JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Prompt error: {0}")]
    PromptError(#[from] dialoguer::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Backend returned {status}: {body}")]
    BackendError { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl YatraError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        YatraError::InvalidInput(msg.into())
    }
}
