//! Error types for the artwork client

/// Result type alias for artwork operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving artwork
///
/// None of these reach the player: [`crate::ArtworkClient::resolve`] folds
/// every variant into [`crate::Artwork::Placeholder`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed (includes timeouts)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// API returned an error status
    #[error("API error: {0}")]
    ApiError(String),

    /// Nothing to search for
    #[error("Empty search term")]
    EmptyQuery,

    /// The search returned no usable thumbnail
    #[error("No artwork found for '{0}'")]
    NoArtwork(String),

    /// Downloaded bytes are not a decodable image
    #[error("Image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// Background decode task failed
    #[error("Decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Configuration error (from clrconfig/anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl Error {
    /// Create an API error
    pub fn api_error(msg: impl Into<String>) -> Self {
        Self::ApiError(msg.into())
    }

    /// True when the failure came from the network layer
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
