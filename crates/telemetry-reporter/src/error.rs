//! Reporter error types.

use thiserror::Error;

/// Reporter error type.
///
/// Only construction paths are fallible; the flush cycle absorbs delivery
/// failures into the retry queue instead of surfacing them.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The configured collector endpoint is not a valid URL.
    #[error("Invalid collector endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// The flush worker thread could not be spawned.
    #[error("Failed to spawn flush worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

/// Result type alias using TelemetryError.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
