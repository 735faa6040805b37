use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Invalid stream identifier '{0}': {1}")]
    InvalidStream(String, url::ParseError),
    #[error("Media backend error: {0}")]
    Backend(String),
    #[error("Audio session error: {0}")]
    Session(String),
    #[error("Artwork client error: {0}")]
    Artwork(#[from] clrartwork::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
    #[error("Player service is not running")]
    ServiceStopped,
}

impl PlayerError {
    pub fn backend(msg: impl Into<String>) -> Self {
        PlayerError::Backend(msg.into())
    }

    pub fn session(msg: impl Into<String>) -> Self {
        PlayerError::Session(msg.into())
    }
}
