//! Error type shared by the client, the endpoint catalogue and the record store.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    /// The client is not ready to send (no parameters, no token).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The HTTP call failed below the HTTP status level.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream body was not a JSON object.
    #[error("Failed to decode upstream response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;

impl WeatherError {
    pub fn invalid_state<S: Into<String>>(message: S) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Short message suitable for a CLI or an HTTP error body.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidState(msg) => format!("Request is not ready: {msg}"),
            Self::Transport(_) => {
                "Unable to reach WeatherAPI.com. Check your connection.".to_string()
            }
            Self::Decode(_) => "WeatherAPI.com returned a response that is not JSON.".to_string(),
            Self::Validation(msg) => format!("Invalid input: {msg}"),
            Self::NotFound(msg) => format!("Not found: {msg}"),
            Self::Config(msg) => format!("Configuration error: {msg}"),
        }
    }

    /// Whether repeating the same call could succeed. The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
