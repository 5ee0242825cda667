//! huginn error types

/// Errors surfaced by the client, the registry and the configuration layer.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// The API key handed to the registry was empty or whitespace.
    #[error("invalid API key: {0}")]
    InvalidCredential(String),

    /// Building a client instance failed (fetcher setup, missing runtime).
    ///
    /// Nothing is registered when this is returned.
    #[error("failed to initialize client: {0}")]
    InitializationFailed(String),

    /// The remote fetch failed. Never retried by the client.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Failure of a single remote weather fetch.
///
/// The variants exist for logging; the client treats them all alike.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    // Transport errors (DNS, connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}) for {city}: {message}")]
    Api {
        status: u16,
        city: String,
        message: String,
    },

    #[error("failed to parse weather payload: {0}")]
    Parse(String),
}

impl WeatherError {
    /// Whether this error came from the remote fetch.
    pub fn is_remote(&self) -> bool {
        matches!(self, WeatherError::Remote(_))
    }
}

/// Result type alias for huginn operations
pub type Result<T> = std::result::Result<T, WeatherError>;
