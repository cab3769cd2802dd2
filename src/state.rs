//! Player state model
//!
//! `PlayerState` is a closed tagged union covering:
//! - Control states: transport status, independent of source format
//! - Source states: per-format loading/quality progress (Native/HLS/DASH)
//! - Error states: classified as recoverable (retried by the same intent)
//!   or fatal (a fresh load is required)
//!
//! Exactly one value is current at a time, owned by the runtime; consumers
//! receive immutable snapshots and branch on it through the matchers.

use crate::types::{DashRepresentation, HlsVariant, PlaybackError, SwitchReason, TimeRange};
use serde::{Deserialize, Serialize};

/// Coarse category used for cross-cutting queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagGroup {
    /// Any non-error state; control is permitted
    Playable,
    /// Error expected to be retried by re-dispatching the originating intent
    RecoverableError,
    /// Terminal error; requires a fresh load to recover
    FatalError,
}

/// The player state machine value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum PlayerState {
    // --- Control states ---
    /// Initial state, no content loaded
    Idle,
    /// Manifest/source loading in progress
    Loading { url: String, progress: f64 },
    /// Content is playing
    Playing {
        current_time: f64,
        duration: f64,
        buffered: Vec<TimeRange>,
        playback_rate: f64,
    },
    /// Playback paused
    Paused {
        current_time: f64,
        duration: f64,
        buffered: Vec<TimeRange>,
    },
    /// Stalled waiting for data
    Buffering {
        current_time: f64,
        duration: f64,
        buffered: Vec<TimeRange>,
    },
    /// Seek in flight
    Seeking {
        from_time: f64,
        to_time: f64,
        duration: f64,
    },
    /// Playback reached the end of the content
    Ended { duration: f64, was_looping: bool },

    // --- Source states: native progressive ---
    /// Progressive download in progress
    NativeProgressiveLoading { url: String, loaded_bytes: u64 },
    /// Native element ready to play
    NativeReady { url: String, duration: Option<f64> },

    // --- Source states: HLS ---
    /// Master playlist fetch in progress
    HlsManifestLoading { url: String },
    /// Master playlist parsed; variant ladder known
    HlsManifestParsed {
        variants: Vec<HlsVariant>,
        duration: Option<f64>,
    },
    /// A variant was selected from the parsed manifest
    HlsVariantSelected {
        variant: HlsVariant,
        reason: SwitchReason,
    },
    /// Adapter-driven ABR switch in flight
    HlsAdaptiveSwitching {
        from: HlsVariant,
        to: HlsVariant,
        reason: SwitchReason,
    },

    // --- Source states: DASH ---
    /// MPD fetch in progress
    DashMpdLoading { url: String },
    /// MPD parsed; representation ladder known
    DashMpdParsed {
        representations: Vec<DashRepresentation>,
        duration: Option<f64>,
    },
    /// A representation was selected from the parsed MPD
    DashRepresentationSelected {
        representation: DashRepresentation,
        reason: SwitchReason,
    },
    /// Adapter-driven quality switch in flight
    DashQualitySwitching {
        from: DashRepresentation,
        to: DashRepresentation,
        reason: SwitchReason,
    },

    // --- Error states ---
    /// Recoverable network failure
    NetworkError {
        error: PlaybackError,
        retry_count: u32,
    },
    /// Source or codec cannot be played on this device
    NotSupportedError { error: PlaybackError },
    /// Rights/license failure
    DrmError { error: PlaybackError },
    /// Load was aborted
    AbortError { error: PlaybackError },
    /// HLS master playlist failed to parse
    HlsManifestParseError {
        error: PlaybackError,
        retry_count: u32,
    },
    /// An HLS media segment failed to load
    HlsSegmentError {
        error: PlaybackError,
        retry_count: u32,
    },
    /// DASH MPD failed to parse
    DashMpdParseError {
        error: PlaybackError,
        retry_count: u32,
    },
    /// DASH content failed to decode
    DashDecodeError { error: PlaybackError },
}

impl PlayerState {
    /// Unique string discriminator for this variant.
    ///
    /// Exhaustive by construction: adding a variant without extending this
    /// match is a compile error.
    pub fn tag(&self) -> &'static str {
        match self {
            PlayerState::Idle => "Control/Idle",
            PlayerState::Loading { .. } => "Control/Loading",
            PlayerState::Playing { .. } => "Control/Playing",
            PlayerState::Paused { .. } => "Control/Paused",
            PlayerState::Buffering { .. } => "Control/Buffering",
            PlayerState::Seeking { .. } => "Control/Seeking",
            PlayerState::Ended { .. } => "Control/Ended",
            PlayerState::NativeProgressiveLoading { .. } => "Source/Native/ProgressiveLoading",
            PlayerState::NativeReady { .. } => "Source/Native/Ready",
            PlayerState::HlsManifestLoading { .. } => "Source/HLS/ManifestLoading",
            PlayerState::HlsManifestParsed { .. } => "Source/HLS/ManifestParsed",
            PlayerState::HlsVariantSelected { .. } => "Source/HLS/VariantSelected",
            PlayerState::HlsAdaptiveSwitching { .. } => "Source/HLS/AdaptiveSwitching",
            PlayerState::DashMpdLoading { .. } => "Source/DASH/MPDLoading",
            PlayerState::DashMpdParsed { .. } => "Source/DASH/MPDParsed",
            PlayerState::DashRepresentationSelected { .. } => "Source/DASH/RepresentationSelected",
            PlayerState::DashQualitySwitching { .. } => "Source/DASH/QualitySwitching",
            PlayerState::NetworkError { .. } => "Error/Network",
            PlayerState::NotSupportedError { .. } => "Error/NotSupported",
            PlayerState::DrmError { .. } => "Error/DRM",
            PlayerState::AbortError { .. } => "Error/Abort",
            PlayerState::HlsManifestParseError { .. } => "Error/HLS/ManifestParse",
            PlayerState::HlsSegmentError { .. } => "Error/HLS/Segment",
            PlayerState::DashMpdParseError { .. } => "Error/DASH/MPDParse",
            PlayerState::DashDecodeError { .. } => "Error/DASH/Decode",
        }
    }

    /// Coarse category for cross-cutting queries
    pub fn tag_group(&self) -> TagGroup {
        match self {
            PlayerState::Idle
            | PlayerState::Loading { .. }
            | PlayerState::Playing { .. }
            | PlayerState::Paused { .. }
            | PlayerState::Buffering { .. }
            | PlayerState::Seeking { .. }
            | PlayerState::Ended { .. }
            | PlayerState::NativeProgressiveLoading { .. }
            | PlayerState::NativeReady { .. }
            | PlayerState::HlsManifestLoading { .. }
            | PlayerState::HlsManifestParsed { .. }
            | PlayerState::HlsVariantSelected { .. }
            | PlayerState::HlsAdaptiveSwitching { .. }
            | PlayerState::DashMpdLoading { .. }
            | PlayerState::DashMpdParsed { .. }
            | PlayerState::DashRepresentationSelected { .. }
            | PlayerState::DashQualitySwitching { .. } => TagGroup::Playable,
            PlayerState::NetworkError { .. }
            | PlayerState::HlsManifestParseError { .. }
            | PlayerState::HlsSegmentError { .. }
            | PlayerState::DashMpdParseError { .. } => TagGroup::RecoverableError,
            PlayerState::NotSupportedError { .. }
            | PlayerState::DrmError { .. }
            | PlayerState::AbortError { .. }
            | PlayerState::DashDecodeError { .. } => TagGroup::FatalError,
        }
    }

    /// True for every `Error/*` variant
    pub fn is_error(&self) -> bool {
        !matches!(self.tag_group(), TagGroup::Playable)
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        PlayerState::Idle
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    //! One instance of every variant, used by exhaustiveness tests.

    use super::*;
    use crate::types::Resolution;

    pub fn sample_variant() -> HlsVariant {
        HlsVariant {
            bandwidth: 2_800_000,
            resolution: Some(Resolution::new(1280, 720)),
            codecs: Some("avc1.64001f,mp4a.40.2".to_string()),
            url: "https://example.com/720p.m3u8".to_string(),
        }
    }

    pub fn sample_representation() -> DashRepresentation {
        DashRepresentation {
            id: "video-720".to_string(),
            bandwidth: 2_800_000,
            resolution: Some(Resolution::new(1280, 720)),
            codecs: Some("avc1.64001f".to_string()),
        }
    }

    fn err(code: &str) -> PlaybackError {
        PlaybackError::new(code, "test error")
    }

    /// Every `PlayerState` variant exactly once
    pub fn all_states() -> Vec<PlayerState> {
        let v = sample_variant();
        let r = sample_representation();
        vec![
            PlayerState::Idle,
            PlayerState::Loading {
                url: "video.mp4".to_string(),
                progress: 0.0,
            },
            PlayerState::Playing {
                current_time: 10.0,
                duration: 120.0,
                buffered: vec![TimeRange::new(0.0, 30.0)],
                playback_rate: 1.0,
            },
            PlayerState::Paused {
                current_time: 10.0,
                duration: 120.0,
                buffered: vec![],
            },
            PlayerState::Buffering {
                current_time: 10.0,
                duration: 120.0,
                buffered: vec![],
            },
            PlayerState::Seeking {
                from_time: 10.0,
                to_time: 50.0,
                duration: 120.0,
            },
            PlayerState::Ended {
                duration: 120.0,
                was_looping: false,
            },
            PlayerState::NativeProgressiveLoading {
                url: "video.mp4".to_string(),
                loaded_bytes: 1024,
            },
            PlayerState::NativeReady {
                url: "video.mp4".to_string(),
                duration: Some(120.0),
            },
            PlayerState::HlsManifestLoading {
                url: "master.m3u8".to_string(),
            },
            PlayerState::HlsManifestParsed {
                variants: vec![v.clone()],
                duration: Some(120.0),
            },
            PlayerState::HlsVariantSelected {
                variant: v.clone(),
                reason: SwitchReason::Manual,
            },
            PlayerState::HlsAdaptiveSwitching {
                from: v.clone(),
                to: v,
                reason: SwitchReason::Bandwidth,
            },
            PlayerState::DashMpdLoading {
                url: "manifest.mpd".to_string(),
            },
            PlayerState::DashMpdParsed {
                representations: vec![r.clone()],
                duration: Some(120.0),
            },
            PlayerState::DashRepresentationSelected {
                representation: r.clone(),
                reason: SwitchReason::Manual,
            },
            PlayerState::DashQualitySwitching {
                from: r.clone(),
                to: r,
                reason: SwitchReason::Bandwidth,
            },
            PlayerState::NetworkError {
                error: err("NETWORK"),
                retry_count: 0,
            },
            PlayerState::NotSupportedError {
                error: err("NOT_SUPPORTED"),
            },
            PlayerState::DrmError { error: err("DRM") },
            PlayerState::AbortError { error: err("ABORT") },
            PlayerState::HlsManifestParseError {
                error: err("HLS_MANIFEST_PARSE"),
                retry_count: 0,
            },
            PlayerState::HlsSegmentError {
                error: err("HLS_SEGMENT"),
                retry_count: 0,
            },
            PlayerState::DashMpdParseError {
                error: err("DASH_MPD_PARSE"),
                retry_count: 0,
            },
            PlayerState::DashDecodeError {
                error: err("DASH_DECODE"),
            },
        ]
    }
}
