//! Core transport transitions: load, play, pause, seek, buffer, end

use crate::error::{TransitionError, TransitionResult};
use crate::matchers;
use crate::state::PlayerState;
use crate::types::{PlaybackError, SourceFormat};
use tracing::{debug, warn};

/// Begin loading a source. Valid from any state; a malformed URL goes
/// straight to `Error/Network` rather than `Loading`.
pub fn load_source(url: &str, format: SourceFormat) -> PlayerState {
    if url.trim().is_empty() || url.contains(char::is_whitespace) {
        warn!(url, "rejecting malformed source URL");
        return PlayerState::NetworkError {
            error: PlaybackError::new("NETWORK", format!("malformed source URL: {url:?}")),
            retry_count: 0,
        };
    }

    debug!(url, %format, "source load started");
    PlayerState::Loading {
        url: url.to_string(),
        progress: 0.0,
    }
}

/// Fold a finished load into the format-specific first source state
pub fn complete_loading(state: &PlayerState, format: SourceFormat) -> TransitionResult {
    match state {
        PlayerState::Loading { url, .. } => Ok(match format {
            SourceFormat::Native => PlayerState::NativeReady {
                url: url.clone(),
                duration: None,
            },
            SourceFormat::Hls => PlayerState::HlsManifestLoading { url: url.clone() },
            SourceFormat::Dash => PlayerState::DashMpdLoading { url: url.clone() },
        }),
        other => Err(TransitionError::InvalidTransition {
            from: other.tag(),
            operation: "complete_loading",
        }),
    }
}

/// Start or resume playback.
///
/// `Paused` and `Buffering` carry their position over; restarting from
/// `Ended` always resets to 0 regardless of prior seek history; `Playing`
/// is a no-op. Any other playable state starts at 0.
pub fn play(state: &PlayerState) -> TransitionResult {
    if !matchers::is_playable(state) {
        return Err(TransitionError::NotPlayable { tag: state.tag() });
    }

    Ok(match state {
        PlayerState::Playing { .. } => state.clone(),
        PlayerState::Paused {
            current_time,
            duration,
            buffered,
        }
        | PlayerState::Buffering {
            current_time,
            duration,
            buffered,
        } => PlayerState::Playing {
            current_time: *current_time,
            duration: *duration,
            buffered: buffered.clone(),
            playback_rate: 1.0,
        },
        PlayerState::Ended { duration, .. } => PlayerState::Playing {
            current_time: 0.0,
            duration: *duration,
            buffered: Vec::new(),
            playback_rate: 1.0,
        },
        other => PlayerState::Playing {
            current_time: 0.0,
            duration: matchers::duration(other).unwrap_or(0.0),
            buffered: Vec::new(),
            playback_rate: 1.0,
        },
    })
}

/// Pause playback, preserving position, duration and buffered ranges
pub fn pause(state: &PlayerState) -> TransitionResult {
    match state {
        PlayerState::Playing {
            current_time,
            duration,
            buffered,
            ..
        } => Ok(PlayerState::Paused {
            current_time: *current_time,
            duration: *duration,
            buffered: buffered.clone(),
        }),
        other => Err(TransitionError::InvalidTransition {
            from: other.tag(),
            operation: "pause",
        }),
    }
}

/// Begin a seek. Bounds are strict: out-of-range targets are rejected,
/// never clamped, and the state is left unchanged.
pub fn seek(target_time: f64, state: &PlayerState) -> TransitionResult {
    if !matchers::can_seek(state) {
        return Err(TransitionError::InvalidTransition {
            from: state.tag(),
            operation: "seek",
        });
    }

    // can_seek guarantees a duration-carrying variant
    let duration = matchers::duration(state).unwrap_or(0.0);
    // Inclusion test rather than exclusion: a NaN target fails it.
    if !(target_time >= 0.0 && target_time <= duration) {
        return Err(TransitionError::SeekOutOfRange {
            target: target_time,
            duration,
        });
    }

    Ok(PlayerState::Seeking {
        from_time: matchers::current_time(state).unwrap_or(0.0),
        to_time: target_time,
        duration,
    })
}

/// Settle an in-flight seek. Success lands at the target; failure falls
/// back to a pause at the origin.
pub fn complete_seek(state: &PlayerState, success: bool) -> TransitionResult {
    match state {
        PlayerState::Seeking {
            from_time,
            to_time,
            duration,
        } => Ok(if success {
            PlayerState::Playing {
                current_time: *to_time,
                duration: *duration,
                buffered: Vec::new(),
                playback_rate: 1.0,
            }
        } else {
            PlayerState::Paused {
                current_time: *from_time,
                duration: *duration,
                buffered: Vec::new(),
            }
        }),
        other => Err(TransitionError::InvalidTransition {
            from: other.tag(),
            operation: "complete_seek",
        }),
    }
}

/// Playback stalled waiting for data
pub fn start_buffering(state: &PlayerState) -> TransitionResult {
    match state {
        PlayerState::Playing {
            current_time,
            duration,
            buffered,
            ..
        } => Ok(PlayerState::Buffering {
            current_time: *current_time,
            duration: *duration,
            buffered: buffered.clone(),
        }),
        other => Err(TransitionError::InvalidTransition {
            from: other.tag(),
            operation: "start_buffering",
        }),
    }
}

/// Enough data arrived; resume from a stall
pub fn resume_from_buffering(state: &PlayerState) -> TransitionResult {
    match state {
        PlayerState::Buffering {
            current_time,
            duration,
            buffered,
        } => Ok(PlayerState::Playing {
            current_time: *current_time,
            duration: *duration,
            buffered: buffered.clone(),
            playback_rate: 1.0,
        }),
        other => Err(TransitionError::InvalidTransition {
            from: other.tag(),
            operation: "resume_from_buffering",
        }),
    }
}

/// Playback reached the end of the content
pub fn end(state: &PlayerState) -> TransitionResult {
    match state {
        PlayerState::Playing { duration, .. } => Ok(PlayerState::Ended {
            duration: *duration,
            was_looping: false,
        }),
        other => Err(TransitionError::InvalidTransition {
            from: other.tag(),
            operation: "end",
        }),
    }
}

/// Stop and reset to `Idle`. Valid from any state.
pub fn stop(state: &PlayerState) -> PlayerState {
    debug!(from = state.tag(), "stopping playback");
    PlayerState::Idle
}

/// Apply an engine time update to a position-carrying state.
/// Returns `None` when the state has no position to update.
pub fn update_time(state: &PlayerState, time: f64) -> Option<PlayerState> {
    match state {
        PlayerState::Playing {
            duration,
            buffered,
            playback_rate,
            ..
        } => Some(PlayerState::Playing {
            current_time: time,
            duration: *duration,
            buffered: buffered.clone(),
            playback_rate: *playback_rate,
        }),
        PlayerState::Paused {
            duration, buffered, ..
        } => Some(PlayerState::Paused {
            current_time: time,
            duration: *duration,
            buffered: buffered.clone(),
        }),
        PlayerState::Buffering {
            duration, buffered, ..
        } => Some(PlayerState::Buffering {
            current_time: time,
            duration: *duration,
            buffered: buffered.clone(),
        }),
        _ => None,
    }
}

/// Apply an engine duration update.
/// Returns `None` when the state has no duration to update.
pub fn update_duration(state: &PlayerState, duration: f64) -> Option<PlayerState> {
    match state {
        PlayerState::Playing {
            current_time,
            buffered,
            playback_rate,
            ..
        } => Some(PlayerState::Playing {
            current_time: *current_time,
            duration,
            buffered: buffered.clone(),
            playback_rate: *playback_rate,
        }),
        PlayerState::Paused {
            current_time,
            buffered,
            ..
        } => Some(PlayerState::Paused {
            current_time: *current_time,
            duration,
            buffered: buffered.clone(),
        }),
        PlayerState::Buffering {
            current_time,
            buffered,
            ..
        } => Some(PlayerState::Buffering {
            current_time: *current_time,
            duration,
            buffered: buffered.clone(),
        }),
        PlayerState::NativeReady { url, .. } => Some(PlayerState::NativeReady {
            url: url.clone(),
            duration: Some(duration),
        }),
        _ => None,
    }
}

/// Enter `Error/Network`. Repeated failures while already in that state
/// increment the retry count; re-dispatching the originating intent is the
/// recovery path.
pub fn fail_network(state: &PlayerState, message: impl Into<String>) -> PlayerState {
    let retry_count = match state {
        PlayerState::NetworkError { retry_count, .. } => retry_count + 1,
        _ => 0,
    };
    PlayerState::NetworkError {
        error: PlaybackError::new("NETWORK", message),
        retry_count,
    }
}

/// Enter fatal `Error/NotSupported`
pub fn fail_not_supported(message: impl Into<String>) -> PlayerState {
    PlayerState::NotSupportedError {
        error: PlaybackError::new("NOT_SUPPORTED", message),
    }
}

/// Enter fatal `Error/DRM`
pub fn fail_drm(message: impl Into<String>) -> PlayerState {
    PlayerState::DrmError {
        error: PlaybackError::new("DRM", message),
    }
}

/// Enter fatal `Error/Abort`
pub fn fail_abort(message: impl Into<String>) -> PlayerState {
    PlayerState::AbortError {
        error: PlaybackError::new("ABORT", message),
    }
}
