use thiserror::Error;

/// Errors that can occur when using the archive realtime client.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// WebSocket protocol error (connection failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// Token endpoint refused or returned no token
    #[error("Authentication error: {0}")]
    Auth(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request error (token endpoint)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Attempted operation while not connected to the server
    #[error("Not connected")]
    NotConnected,
}

/// Convenience type alias for `Result<T, RealtimeError>`.
pub type Result<T> = std::result::Result<T, RealtimeError>;
