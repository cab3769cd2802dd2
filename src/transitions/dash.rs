//! DASH transitions: MPD parsing, representation selection, quality switching
//!
//! Mirrors the HLS transitions: selection validates the target against the
//! parsed MPD by representation id, switching trusts the adapter and never
//! validates.

use crate::error::{TransitionError, TransitionResult};
use crate::state::PlayerState;
use crate::types::{DashRepresentation, PlaybackError, Resolution, SwitchReason};
use tracing::{debug, warn};

/// Parse a fetched MPD.
///
/// Valid only from `Source/DASH/MPDLoading`. MPD extraction uses simple
/// attribute scanning; a document without an `<MPD` root or without any
/// `<Representation>` transitions into `Error/DASH/MPDParse` with a fresh
/// retry count of 0.
pub async fn parse_mpd(state: &PlayerState, mpd: &str) -> TransitionResult {
    let url = match state {
        PlayerState::DashMpdLoading { url } => url.clone(),
        other => {
            return Err(TransitionError::InvalidTransition {
                from: other.tag(),
                operation: "parse_mpd",
            })
        }
    };

    // Suspension point standing in for network/parse latency.
    tokio::task::yield_now().await;

    if !mpd.contains("<MPD") {
        warn!(url, "document has no MPD root");
        return Ok(parse_error(&url, "document has no <MPD> root element"));
    }

    let representations = extract_representations(mpd);
    if representations.is_empty() {
        warn!(url, "MPD declares no representations");
        return Ok(parse_error(&url, "MPD declares no representations"));
    }

    let duration = parse_duration_attr(mpd, "mediaPresentationDuration");

    debug!(
        url,
        representations = representations.len(),
        ?duration,
        "DASH MPD parsed"
    );
    mpd_parsed(state, representations, duration)
}

fn parse_error(url: &str, message: &str) -> PlayerState {
    PlayerState::DashMpdParseError {
        error: PlaybackError::new("DASH_MPD_PARSE", format!("{url}: {message}")),
        retry_count: 0,
    }
}

/// Fold an adapter-reported parsed representation set into `MPDParsed`.
pub fn mpd_parsed(
    state: &PlayerState,
    representations: Vec<DashRepresentation>,
    duration: Option<f64>,
) -> TransitionResult {
    match state {
        PlayerState::DashMpdLoading { .. } => Ok(PlayerState::DashMpdParsed {
            representations,
            duration,
        }),
        other => Err(TransitionError::InvalidTransition {
            from: other.tag(),
            operation: "mpd_parsed",
        }),
    }
}

/// Select a representation out of the parsed MPD. The target must match one
/// of the parsed representations by id; anything else is rejected.
pub fn select_representation(
    state: &PlayerState,
    representation: &DashRepresentation,
    reason: SwitchReason,
) -> TransitionResult {
    match state {
        PlayerState::DashMpdParsed {
            representations, ..
        } => {
            if representations.iter().any(|r| r.id == representation.id) {
                debug!(
                    id = representation.id,
                    bandwidth = representation.bandwidth,
                    %reason,
                    "DASH representation selected"
                );
                Ok(PlayerState::DashRepresentationSelected {
                    representation: representation.clone(),
                    reason,
                })
            } else {
                Err(TransitionError::RepresentationNotFound {
                    id: representation.id.clone(),
                })
            }
        }
        other => Err(TransitionError::InvalidTransition {
            from: other.tag(),
            operation: "select_representation",
        }),
    }
}

/// Record an adapter-driven quality switch.
///
/// Infallible by the same reasoning as HLS variant switching: the adapter
/// drives ABR and is trusted for what it can switch to.
pub fn switch_representation(
    from: &DashRepresentation,
    to: &DashRepresentation,
    reason: SwitchReason,
) -> PlayerState {
    debug!(from_id = from.id, to_id = to.id, %reason, "DASH quality switch");
    PlayerState::DashQualitySwitching {
        from: from.clone(),
        to: to.clone(),
        reason,
    }
}

/// Enter fatal `Error/DASH/Decode`
pub fn fail_dash_decode(message: impl Into<String>) -> PlayerState {
    PlayerState::DashDecodeError {
        error: PlaybackError::new("DASH_DECODE", message),
    }
}

/// Pull every `<Representation>` out of the MPD by attribute scanning.
/// Shared between the pure parse transition and the DASH adapter.
pub(crate) fn extract_representations(mpd: &str) -> Vec<DashRepresentation> {
    let mut representations = Vec::new();

    for (idx, chunk) in mpd.split("<Representation").enumerate().skip(1) {
        let tag = chunk.split('>').next().unwrap_or("");

        let id = extract_attr(tag, "id").unwrap_or_else(|| format!("rep_{idx}"));
        let bandwidth = extract_attr(tag, "bandwidth")
            .and_then(|b| b.parse::<u64>().ok())
            .unwrap_or(0);

        let width = extract_attr(tag, "width").and_then(|w| w.parse::<u32>().ok());
        let height = extract_attr(tag, "height").and_then(|h| h.parse::<u32>().ok());
        let resolution = match (width, height) {
            (Some(width), Some(height)) => Some(Resolution { width, height }),
            _ => None,
        };

        representations.push(DashRepresentation {
            id,
            bandwidth,
            resolution,
            codecs: extract_attr(tag, "codecs"),
        });
    }

    representations.sort_by_key(|r| r.bandwidth);
    representations
}

/// Extract a quoted attribute value from a tag string. The name must be
/// preceded by whitespace so `width` cannot match inside `bandwidth`.
fn extract_attr(tag: &str, name: &str) -> Option<String> {
    let needle = format!(" {name}=\"");
    let start = tag.find(&needle)? + needle.len();
    let rest = &tag[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

/// Parse an ISO 8601 duration attribute (`PT1H2M3.5S`) into seconds
pub(crate) fn parse_duration_attr(mpd: &str, name: &str) -> Option<f64> {
    let value = extract_attr(mpd.split('>').next().unwrap_or(mpd), name)
        .or_else(|| extract_attr(mpd, name))?;
    parse_iso8601_duration(&value)
}

fn parse_iso8601_duration(value: &str) -> Option<f64> {
    let rest = value.strip_prefix("PT")?;
    let mut total = 0.0;
    let mut number = String::new();

    for c in rest.chars() {
        match c {
            '0'..='9' | '.' => number.push(c),
            'H' => {
                total += number.parse::<f64>().ok()? * 3600.0;
                number.clear();
            }
            'M' => {
                total += number.parse::<f64>().ok()? * 60.0;
                number.clear();
            }
            'S' => {
                total += number.parse::<f64>().ok()?;
                number.clear();
            }
            _ => return None,
        }
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    const MPD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" type="static" mediaPresentationDuration="PT2M0S">
  <Period>
    <AdaptationSet mimeType="video/mp4">
      <Representation id="video-360" bandwidth="800000" width="640" height="360" codecs="avc1.4d401e"/>
      <Representation id="video-720" bandwidth="2800000" width="1280" height="720" codecs="avc1.64001f"/>
      <Representation id="video-1080" bandwidth="5000000" width="1920" height="1080" codecs="avc1.640028"/>
    </AdaptationSet>
  </Period>
</MPD>"#;

    fn loading() -> PlayerState {
        PlayerState::DashMpdLoading {
            url: "https://example.com/manifest.mpd".to_string(),
        }
    }

    #[test]
    fn test_parse_mpd_extracts_sorted_representations() {
        let state = block_on(parse_mpd(&loading(), MPD)).unwrap();
        match &state {
            PlayerState::DashMpdParsed {
                representations,
                duration,
            } => {
                assert_eq!(representations.len(), 3);
                assert_eq!(representations[0].id, "video-360");
                assert_eq!(representations[2].bandwidth, 5_000_000);
                assert_eq!(
                    representations[1].resolution,
                    Some(Resolution::new(1280, 720))
                );
                assert_eq!(*duration, Some(120.0));
            }
            other => panic!("unexpected state {}", other.tag()),
        }
    }

    #[test]
    fn test_parse_mpd_failure_becomes_error_state() {
        let state = block_on(parse_mpd(&loading(), "<html>not an mpd</html>")).unwrap();
        assert_eq!(state.tag(), "Error/DASH/MPDParse");
        assert_eq!(crate::matchers::retry_count(&state), Some(0));

        let empty = block_on(parse_mpd(&loading(), "<MPD></MPD>")).unwrap();
        assert_eq!(empty.tag(), "Error/DASH/MPDParse");
    }

    #[test]
    fn test_parse_mpd_wrong_state_rejected() {
        let result = block_on(parse_mpd(&PlayerState::Idle, MPD));
        assert!(matches!(
            result,
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_select_representation_by_id() {
        let parsed = block_on(parse_mpd(&loading(), MPD)).unwrap();
        let rep = match &parsed {
            PlayerState::DashMpdParsed {
                representations, ..
            } => representations[1].clone(),
            _ => unreachable!(),
        };

        let state = select_representation(&parsed, &rep, SwitchReason::Manual).unwrap();
        assert_eq!(state.tag(), "Source/DASH/RepresentationSelected");
    }

    #[test]
    fn test_select_unknown_representation_rejected() {
        let parsed = block_on(parse_mpd(&loading(), MPD)).unwrap();
        let fabricated = DashRepresentation {
            id: "video-4k".to_string(),
            bandwidth: 20_000_000,
            resolution: Some(Resolution::new(3840, 2160)),
            codecs: None,
        };

        assert_eq!(
            select_representation(&parsed, &fabricated, SwitchReason::Manual),
            Err(TransitionError::RepresentationNotFound {
                id: "video-4k".to_string()
            })
        );
    }

    #[test]
    fn test_switch_representation_never_fails() {
        let from = DashRepresentation {
            id: "video-360".to_string(),
            bandwidth: 800_000,
            resolution: None,
            codecs: None,
        };
        // Deliberately absent from any MPD.
        let to = DashRepresentation {
            id: "video-8k".to_string(),
            bandwidth: 99_000_000,
            resolution: Some(Resolution::new(7680, 4320)),
            codecs: None,
        };

        let state = switch_representation(&from, &to, SwitchReason::Constraint);
        assert_eq!(state.tag(), "Source/DASH/QualitySwitching");
    }

    #[test]
    fn test_parse_iso8601_duration() {
        assert_eq!(parse_iso8601_duration("PT2M0S"), Some(120.0));
        assert_eq!(parse_iso8601_duration("PT1H2M3.5S"), Some(3723.5));
        assert_eq!(parse_iso8601_duration("PT30S"), Some(30.0));
        assert_eq!(parse_iso8601_duration("2M"), None);
    }

    #[test]
    fn test_extract_attr() {
        assert_eq!(
            extract_attr(r#" id="video-1" bandwidth="800""#, "id"),
            Some("video-1".to_string())
        );
        assert_eq!(extract_attr(r#" id="video-1""#, "codecs"), None);
    }
}
