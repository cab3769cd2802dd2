//! HLS transitions: manifest parsing, variant selection, ABR switching
//!
//! Selection is validated against the parsed manifest by variant URL.
//! Switching is not validated at all: ABR switches are reported by the
//! adapter, which is trusted for what it can switch to.

use crate::error::{TransitionError, TransitionResult};
use crate::state::PlayerState;
use crate::types::{HlsVariant, PlaybackError, Resolution, SwitchReason};
use tracing::{debug, warn};
use url::Url;

/// Parse a fetched HLS master playlist.
///
/// Valid only from `Source/HLS/ManifestLoading`. A playlist that fails to
/// parse transitions into `Error/HLS/ManifestParse` with a fresh retry
/// count of 0.
pub async fn parse_manifest(state: &PlayerState, manifest: &str) -> TransitionResult {
    let url = match state {
        PlayerState::HlsManifestLoading { url } => url.clone(),
        other => {
            return Err(TransitionError::InvalidTransition {
                from: other.tag(),
                operation: "parse_manifest",
            })
        }
    };

    // Suspension point standing in for network/parse latency.
    tokio::task::yield_now().await;

    match parse_master_variants(&url, manifest) {
        Ok(variants) => {
            debug!(url, variants = variants.len(), "HLS manifest parsed");
            manifest_parsed(state, variants, None)
        }
        Err(message) => {
            warn!(url, "HLS manifest parse failed");
            Ok(PlayerState::HlsManifestParseError {
                error: PlaybackError::new(
                    "HLS_MANIFEST_PARSE",
                    format!("failed to parse master playlist {url}: {message}"),
                ),
                retry_count: 0,
            })
        }
    }
}

/// Parse a master playlist into the variant ladder, sorted by bandwidth.
/// Shared between the pure parse transition and the HLS adapter.
pub(crate) fn parse_master_variants(
    base_url: &str,
    manifest: &str,
) -> Result<Vec<HlsVariant>, String> {
    let master =
        m3u8_rs::parse_master_playlist_res(manifest.as_bytes()).map_err(|e| format!("{e:?}"))?;

    let mut variants: Vec<HlsVariant> = master
        .variants
        .iter()
        .map(|v| HlsVariant {
            bandwidth: v.bandwidth,
            resolution: v.resolution.map(|r| Resolution {
                width: r.width as u32,
                height: r.height as u32,
            }),
            codecs: v.codecs.clone(),
            url: resolve_uri(base_url, &v.uri),
        })
        .collect();
    variants.sort_by_key(|v| v.bandwidth);
    Ok(variants)
}

/// Fold an adapter-reported parsed variant set into `ManifestParsed`.
/// Used both by `parse_manifest` and by the runtime for engine events.
pub fn manifest_parsed(
    state: &PlayerState,
    variants: Vec<HlsVariant>,
    duration: Option<f64>,
) -> TransitionResult {
    match state {
        PlayerState::HlsManifestLoading { .. } => {
            Ok(PlayerState::HlsManifestParsed { variants, duration })
        }
        other => Err(TransitionError::InvalidTransition {
            from: other.tag(),
            operation: "manifest_parsed",
        }),
    }
}

/// Select a variant out of the parsed manifest. The target must be
/// URL-equal to one of the parsed variants; anything else is rejected.
pub fn select_variant(
    state: &PlayerState,
    variant: &HlsVariant,
    reason: SwitchReason,
) -> TransitionResult {
    match state {
        PlayerState::HlsManifestParsed { variants, .. } => {
            if variants.iter().any(|v| v.url == variant.url) {
                debug!(
                    url = variant.url,
                    bandwidth = variant.bandwidth,
                    %reason,
                    "HLS variant selected"
                );
                Ok(PlayerState::HlsVariantSelected {
                    variant: variant.clone(),
                    reason,
                })
            } else {
                Err(TransitionError::VariantNotFound {
                    url: variant.url.clone(),
                })
            }
        }
        other => Err(TransitionError::InvalidTransition {
            from: other.tag(),
            operation: "select_variant",
        }),
    }
}

/// Record an adapter-driven variant switch.
///
/// Infallible: unlike selection, the target is never validated against the
/// manifest. The adapter drives ABR and is the source of truth for what it
/// can switch to.
pub fn switch_variant(from: &HlsVariant, to: &HlsVariant, reason: SwitchReason) -> PlayerState {
    debug!(
        from_bandwidth = from.bandwidth,
        to_bandwidth = to.bandwidth,
        %reason,
        "HLS adaptive switch"
    );
    PlayerState::HlsAdaptiveSwitching {
        from: from.clone(),
        to: to.clone(),
        reason,
    }
}

/// Enter `Error/HLS/Segment`. Repeated segment failures increment the
/// retry count.
pub fn fail_hls_segment(
    state: &PlayerState,
    sequence: u64,
    message: impl Into<String>,
) -> PlayerState {
    let retry_count = match state {
        PlayerState::HlsSegmentError { retry_count, .. } => retry_count + 1,
        _ => 0,
    };
    PlayerState::HlsSegmentError {
        error: PlaybackError::new(
            "HLS_SEGMENT",
            format!("segment {sequence}: {}", message.into()),
        ),
        retry_count,
    }
}

/// Resolve a variant URI against the playlist URL it came from.
/// Relative URIs stay untouched when the base itself is not absolute.
fn resolve_uri(base: &str, uri: &str) -> String {
    if Url::parse(uri).is_ok() {
        return uri.to_string();
    }
    if let Ok(base_url) = Url::parse(base) {
        if let Ok(joined) = base_url.join(uri) {
            return joined.to_string();
        }
    }
    uri.to_string()
}
