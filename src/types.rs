//! Core value types for the player state machine
//!
//! Everything here is an immutable value object: variants and
//! representations are produced by parsing and referenced by
//! selection/switching transitions, never mutated in place.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a runtime instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuntimeId(pub Uuid);

impl RuntimeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RuntimeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns quality tier name
    pub fn quality_name(&self) -> &'static str {
        match self.height {
            0..=240 => "240p",
            241..=360 => "360p",
            361..=480 => "480p",
            481..=720 => "720p",
            721..=1080 => "1080p",
            1081..=1440 => "1440p",
            _ => "4K",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A single buffered time range in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Check if a position falls within this range
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// One quality rendition in an HLS master playlist. Identity is the
/// variant playlist URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HlsVariant {
    /// Bandwidth in bits per second
    pub bandwidth: u64,
    /// Video resolution, if declared
    pub resolution: Option<Resolution>,
    /// RFC 6381 codecs string
    pub codecs: Option<String>,
    /// URI of the variant playlist
    pub url: String,
}

/// One quality rendition in a DASH MPD. Identity is the representation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashRepresentation {
    /// Representation `id` attribute
    pub id: String,
    /// Bandwidth in bits per second
    pub bandwidth: u64,
    /// Video resolution, if declared
    pub resolution: Option<Resolution>,
    /// RFC 6381 codecs string
    pub codecs: Option<String>,
}

/// Why a quality switch happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchReason {
    /// Adapter-driven ABR decision
    Bandwidth,
    /// Explicit user/API request
    Manual,
    /// Device or policy constraint (resolution cap, bitrate cap)
    Constraint,
}

impl std::fmt::Display for SwitchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwitchReason::Bandwidth => write!(f, "bandwidth"),
            SwitchReason::Manual => write!(f, "manual"),
            SwitchReason::Constraint => write!(f, "constraint"),
        }
    }
}

/// Source format, chosen by sniffing the URL when a load is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Progressive playback through the native element
    Native,
    Hls,
    Dash,
}

impl SourceFormat {
    /// Detect the format from a URL extension. Query strings and fragments
    /// are ignored; anything unrecognized plays progressively.
    pub fn detect(url: &str) -> SourceFormat {
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_lowercase();

        if path.ends_with(".m3u8") || path.ends_with(".m3u") {
            SourceFormat::Hls
        } else if path.ends_with(".mpd") {
            SourceFormat::Dash
        } else {
            SourceFormat::Native
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Native => write!(f, "native"),
            SourceFormat::Hls => write!(f, "hls"),
            SourceFormat::Dash => write!(f, "dash"),
        }
    }
}

/// Error value carried by every `Error/*` player state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackError {
    /// Stable machine-readable code, e.g. `"NETWORK"`, `"HLS_MANIFEST_PARSE"`
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl PlaybackError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Opaque handle to the rendering target the extension attached to.
/// Stands in for the DOM `<object>`/`<video>` element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoElementHandle {
    /// Element identifier assigned by the element matcher
    pub id: String,
    /// MIME type the element was detected by, e.g. `"video/mp4"`
    pub mime_type: String,
}

impl VideoElementHandle {
    pub fn new(id: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Inputs to the runtime: user intents, adapter-reported engine events,
/// and adapter-reported errors. Events are transient; the runtime keeps
/// only a bounded ring of recent ones for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    // User intents
    PlayRequested,
    PauseRequested,
    SeekRequested { time: f64 },
    LoadRequested { url: String },
    StopRequested,
    SetVolumeRequested { volume: u8 },
    SetMutedRequested { muted: bool },

    // Adapter-reported engine events
    Mounted,
    TimeUpdate { time: f64 },
    DurationChanged { duration: f64 },
    VolumeChanged { volume: u8, muted: bool },
    Stalled { time: f64 },
    Resumed { time: f64 },
    Seeked { success: bool },
    PlaybackEnded,
    SegmentLoaded { sequence: u64 },
    ManifestLoaded {
        variants: Vec<HlsVariant>,
        duration: Option<f64>,
    },
    MpdLoaded {
        representations: Vec<DashRepresentation>,
        duration: Option<f64>,
    },
    VariantSwitched {
        from: HlsVariant,
        to: HlsVariant,
        reason: SwitchReason,
    },
    RepresentationSwitched {
        from: DashRepresentation,
        to: DashRepresentation,
        reason: SwitchReason,
    },

    // Adapter-reported errors
    NetworkErrorReported { message: String },
    NotSupportedReported { message: String },
    DrmErrorReported { message: String },
    AbortReported { message: String },
    HlsSegmentErrorReported { sequence: u64, message: String },
    DashDecodeErrorReported { message: String },

    // Runtime diagnostics
    TransitionRejected { operation: String, message: String },
}

impl PlayerEvent {
    /// True for user-initiated intents, false for engine/error events
    pub fn is_intent(&self) -> bool {
        matches!(
            self,
            PlayerEvent::PlayRequested
                | PlayerEvent::PauseRequested
                | PlayerEvent::SeekRequested { .. }
                | PlayerEvent::LoadRequested { .. }
                | PlayerEvent::StopRequested
                | PlayerEvent::SetVolumeRequested { .. }
                | PlayerEvent::SetMutedRequested { .. }
        )
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Retry attempts before a recoverable error is surfaced as hopeless
    pub retry_attempts: u32,
    /// Request timeout for manifest/MPD fetches in milliseconds
    pub request_timeout_ms: u64,
    /// Capacity of the diagnostics event ring
    pub event_ring_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            request_timeout_ms: 10_000,
            event_ring_capacity: 200,
        }
    }
}
