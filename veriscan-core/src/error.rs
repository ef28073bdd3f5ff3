//! Error types for veriscan-core

use thiserror::Error;

/// Common result type for veriscan operations
pub type Result<T> = std::result::Result<T, DetectError>;

/// Errors surfaced by the detection client
///
/// Precondition failures (`NoMedia`, `Unauthenticated`, `InvalidMedia`,
/// `AnalysisInFlight`) are raised locally and never reach the network.
#[derive(Debug, Error)]
pub enum DetectError {
    /// No media file is currently selected
    #[error("No media selected")]
    NoMedia,

    /// No bearer credential is available for the analysis service
    #[error("Not authenticated")]
    Unauthenticated,

    /// Selected file is not an acceptable upload
    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    /// A primary analysis is already in flight for this orchestrator
    #[error("An analysis is already in flight")]
    AnalysisInFlight,

    /// The response belongs to a superseded selection and was discarded
    #[error("Analysis superseded by a newer selection")]
    Superseded,

    /// Network or connection failure, including undecodable success bodies
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-success HTTP status from the analysis service
    #[error("Service error {status}: {message}")]
    Service { status: u16, message: String },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DetectError {
    /// Message suitable for the single user-visible failure surface
    ///
    /// Prefers the service-provided message when one exists, otherwise a
    /// generic retry-prompting message.
    pub fn user_message(&self) -> String {
        match self {
            DetectError::Service { message, .. } if !message.trim().is_empty() => message.clone(),
            DetectError::Unauthenticated => "Not authenticated".to_string(),
            _ => "Analysis failed. Please try again.".to_string(),
        }
    }
}
