/*!
 * Error types for the histomap viewer.
 *
 * This module contains custom error types for the different components,
 * using the thiserror crate for ergonomic error definitions. Failures are
 * handled by the component that detects them; nothing here is meant to
 * reach a global error boundary.
 */

use thiserror::Error;

/// Errors that can occur when querying the events backend
///
/// A failed fetch carries no partial data.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read
    #[error("Event query failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status
    #[error("Backend responded with error: {status_code} - {message}")]
    Status {
        /// HTTP status code
        status_code: u16,
        /// Body or reason returned by the backend
        message: String,
    },

    /// The payload was not a JSON array of events
    #[error("Failed to decode events payload: {0}")]
    Decode(String),

    /// The backend base address could not be joined with the query path
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

/// Errors raised at the native media boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// The media resource refused to start playing
    #[error("Playback rejected: {0}")]
    PlayRejected(String),

    /// The media resource could not be opened
    #[error("Media unavailable: {0}")]
    MediaUnavailable(String),

    /// No playback session is attached to the given detail view
    #[error("No playback session for view {0}")]
    SessionNotFound(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from the events backend
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Error from audio playback
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reading input or writing output
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Config(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}
