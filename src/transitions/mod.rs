//! Pure transition functions
//!
//! Each transition computes the next `PlayerState` from a current state and
//! an intent or engine event. Precondition violations come back as
//! `Err(TransitionError)` and never change state; parse failures transition
//! *into* the matching recoverable `Error/*` state. The async variants
//! (manifest/MPD parsing) are deterministic given their input; the only
//! suspension point is a cooperative yield standing in for network/parse
//! latency.

pub mod core;
pub mod dash;
pub mod hls;

pub use self::core::{
    complete_loading, complete_seek, end, fail_abort, fail_drm, fail_network,
    fail_not_supported, load_source, pause, play, resume_from_buffering, seek, start_buffering,
    stop, update_duration, update_time,
};
pub use self::dash::{
    fail_dash_decode, mpd_parsed, parse_mpd, select_representation, switch_representation,
};
pub use self::hls::{
    fail_hls_segment, manifest_parsed, parse_manifest, select_variant, switch_variant,
};
