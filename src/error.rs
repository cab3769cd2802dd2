//! Error types for the player core

use thiserror::Error;

/// Result of a pure transition function: the next state, or a rejection
/// that leaves the caller's state untouched.
pub type TransitionResult = std::result::Result<crate::state::PlayerState, TransitionError>;

/// Rejection returned by a pure transition function when its preconditions
/// are violated. Never maps to a state change on its own.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    #[error("state '{tag}' is not playable")]
    NotPlayable { tag: &'static str },

    #[error("seek target {target}s out of range (duration {duration}s)")]
    SeekOutOfRange { target: f64, duration: f64 },

    #[error("cannot {operation} from state '{from}'")]
    InvalidTransition {
        from: &'static str,
        operation: &'static str,
    },

    #[error("variant not found in manifest: {url}")]
    VariantNotFound { url: String },

    #[error("representation not found in MPD: {id}")]
    RepresentationNotFound { id: String },
}

/// Failure reported by a playback adapter. The runtime maps these, where
/// applicable, into `Error/*` player states so consumers observe failures
/// uniformly through matchers instead of through exceptions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    #[error("failed to load {url}: {message}")]
    LoadFailed { url: String, message: String },

    #[error("play failed: {message}")]
    PlayFailed { message: String },

    #[error("pause failed: {message}")]
    PauseFailed { message: String },

    #[error("seek to {time}s failed: {message}")]
    SeekFailed { time: f64, message: String },

    #[error("volume change failed: {message}")]
    VolumeFailed { message: String },

    #[error("destroy failed: {message}")]
    DestroyFailed { message: String },

    #[error("adapter is not mounted")]
    NotMounted,
}

/// Errors surfaced by the runtime itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("runtime has been destroyed")]
    Destroyed,
}
