//! Read-only predicates and queries over player states
//!
//! Consumers branch on these instead of depending on the internal tag
//! shape. Every function is total over the closed `PlayerState` union and
//! pure; `description` deliberately has no fallback arm so that adding a
//! variant without describing it fails to compile.

use crate::state::{PlayerState, TagGroup};
use crate::types::PlaybackError;

/// True iff the state belongs to the `Playable` group
pub fn is_playable(state: &PlayerState) -> bool {
    state.tag_group() == TagGroup::Playable
}

/// True for every `Error/*` state
pub fn is_error(state: &PlayerState) -> bool {
    state.is_error()
}

/// True iff the error is expected to be retried by re-dispatching the
/// originating intent
pub fn is_recoverable(state: &PlayerState) -> bool {
    state.tag_group() == TagGroup::RecoverableError
}

/// True iff recovery requires a fresh load
pub fn is_fatal(state: &PlayerState) -> bool {
    state.tag_group() == TagGroup::FatalError
}

/// True only for the states a seek may originate from
pub fn can_seek(state: &PlayerState) -> bool {
    matches!(
        state,
        PlayerState::Playing { .. } | PlayerState::Paused { .. } | PlayerState::Buffering { .. }
    )
}

/// True iff transport controls are permitted
pub fn can_control(state: &PlayerState) -> bool {
    is_playable(state)
}

/// Playback position, if the variant carries one
pub fn current_time(state: &PlayerState) -> Option<f64> {
    match state {
        PlayerState::Playing { current_time, .. }
        | PlayerState::Paused { current_time, .. }
        | PlayerState::Buffering { current_time, .. } => Some(*current_time),
        PlayerState::Seeking { from_time, .. } => Some(*from_time),
        _ => None,
    }
}

/// Content duration, if the variant carries one
pub fn duration(state: &PlayerState) -> Option<f64> {
    match state {
        PlayerState::Playing { duration, .. }
        | PlayerState::Paused { duration, .. }
        | PlayerState::Buffering { duration, .. }
        | PlayerState::Seeking { duration, .. }
        | PlayerState::Ended { duration, .. } => Some(*duration),
        PlayerState::NativeReady { duration, .. }
        | PlayerState::HlsManifestParsed { duration, .. }
        | PlayerState::DashMpdParsed { duration, .. } => *duration,
        _ => None,
    }
}

/// Retry count of a recoverable error state
pub fn retry_count(state: &PlayerState) -> Option<u32> {
    match state {
        PlayerState::NetworkError { retry_count, .. }
        | PlayerState::HlsManifestParseError { retry_count, .. }
        | PlayerState::HlsSegmentError { retry_count, .. }
        | PlayerState::DashMpdParseError { retry_count, .. } => Some(*retry_count),
        _ => None,
    }
}

/// The underlying error value of an `Error/*` state
pub fn state_error(state: &PlayerState) -> Option<&PlaybackError> {
    match state {
        PlayerState::NetworkError { error, .. }
        | PlayerState::NotSupportedError { error }
        | PlayerState::DrmError { error }
        | PlayerState::AbortError { error }
        | PlayerState::HlsManifestParseError { error, .. }
        | PlayerState::HlsSegmentError { error, .. }
        | PlayerState::DashMpdParseError { error, .. }
        | PlayerState::DashDecodeError { error } => Some(error),
        _ => None,
    }
}

/// Human-readable description of the state. Exhaustive over every variant.
pub fn description(state: &PlayerState) -> String {
    match state {
        PlayerState::Idle => "Idle, no content loaded".to_string(),
        PlayerState::Loading { url, progress } => {
            format!("Loading {} ({:.0}%)", url, progress * 100.0)
        }
        PlayerState::Playing {
            current_time,
            duration,
            playback_rate,
            ..
        } => format!(
            "Playing at {:.1}s of {:.1}s (rate {:.2})",
            current_time, duration, playback_rate
        ),
        PlayerState::Paused {
            current_time,
            duration,
            ..
        } => format!("Paused at {:.1}s of {:.1}s", current_time, duration),
        PlayerState::Buffering { current_time, .. } => {
            format!("Buffering at {:.1}s", current_time)
        }
        PlayerState::Seeking {
            from_time, to_time, ..
        } => format!("Seeking from {:.1}s to {:.1}s", from_time, to_time),
        PlayerState::Ended { duration, .. } => {
            format!("Ended after {:.1}s", duration)
        }
        PlayerState::NativeProgressiveLoading { url, loaded_bytes } => {
            format!("Progressively loading {} ({} bytes)", url, loaded_bytes)
        }
        PlayerState::NativeReady { url, .. } => format!("Ready to play {}", url),
        PlayerState::HlsManifestLoading { url } => {
            format!("Loading HLS manifest {}", url)
        }
        PlayerState::HlsManifestParsed { variants, .. } => {
            format!("HLS manifest parsed, {} variant(s)", variants.len())
        }
        PlayerState::HlsVariantSelected { variant, reason } => format!(
            "HLS variant selected ({} bps, {})",
            variant.bandwidth, reason
        ),
        PlayerState::HlsAdaptiveSwitching { from, to, reason } => format!(
            "Switching HLS variant {} -> {} bps ({})",
            from.bandwidth, to.bandwidth, reason
        ),
        PlayerState::DashMpdLoading { url } => format!("Loading DASH MPD {}", url),
        PlayerState::DashMpdParsed {
            representations, ..
        } => format!(
            "DASH MPD parsed, {} representation(s)",
            representations.len()
        ),
        PlayerState::DashRepresentationSelected {
            representation,
            reason,
        } => format!(
            "DASH representation '{}' selected ({})",
            representation.id, reason
        ),
        PlayerState::DashQualitySwitching { from, to, reason } => format!(
            "Switching DASH representation '{}' -> '{}' ({})",
            from.id, to.id, reason
        ),
        PlayerState::NetworkError { error, retry_count } => {
            format!("Network error: {} (retry {})", error.message, retry_count)
        }
        PlayerState::NotSupportedError { error } => {
            format!("Source not supported: {}", error.message)
        }
        PlayerState::DrmError { error } => format!("DRM error: {}", error.message),
        PlayerState::AbortError { error } => format!("Load aborted: {}", error.message),
        PlayerState::HlsManifestParseError { error, retry_count } => format!(
            "HLS manifest parse error: {} (retry {})",
            error.message, retry_count
        ),
        PlayerState::HlsSegmentError { error, retry_count } => format!(
            "HLS segment error: {} (retry {})",
            error.message, retry_count
        ),
        PlayerState::DashMpdParseError { error, retry_count } => format!(
            "DASH MPD parse error: {} (retry {})",
            error.message, retry_count
        ),
        PlayerState::DashDecodeError { error } => {
            format!("DASH decode error: {}", error.message)
        }
    }
}
