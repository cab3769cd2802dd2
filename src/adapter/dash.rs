//! DASH playback adapter
//!
//! Plays the role a dash.js engine has in the real runtime: fetches and
//! scans the MPD, keeps the representation ladder, reports parsed MPDs and
//! quality switches as engine events.

use super::{AdapterSubscription, PlaybackAdapter};
use crate::error::AdapterError;
use crate::events::ListenerSet;
use crate::transitions::dash::{extract_representations, parse_duration_attr};
use crate::types::{
    DashRepresentation, PlayerEvent, SourceFormat, SwitchReason, VideoElementHandle,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct DashInner {
    element: Option<VideoElementHandle>,
    url: Option<String>,
    representations: Vec<DashRepresentation>,
    current_representation: usize,
    position: f64,
    playing: bool,
    volume: u8,
    muted: bool,
}

/// Adapter for `application/dash+xml` sources
pub struct DashAdapter {
    client: Client,
    inner: RwLock<DashInner>,
    events: ListenerSet<PlayerEvent>,
}

impl DashAdapter {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            inner: RwLock::new(DashInner {
                volume: 100,
                ..Default::default()
            }),
            events: ListenerSet::new(),
        }
    }

    /// The representation ladder from the last parsed MPD
    pub async fn representations(&self) -> Vec<DashRepresentation> {
        self.inner.read().await.representations.clone()
    }

    /// Switch to another representation of the loaded ladder and report it
    pub async fn switch_to(
        &self,
        representation_index: usize,
        reason: SwitchReason,
    ) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        let from = inner
            .representations
            .get(inner.current_representation)
            .cloned()
            .ok_or_else(|| AdapterError::LoadFailed {
                url: inner.url.clone().unwrap_or_default(),
                message: "no MPD loaded".to_string(),
            })?;
        let to = inner
            .representations
            .get(representation_index)
            .cloned()
            .ok_or_else(|| AdapterError::LoadFailed {
                url: inner.url.clone().unwrap_or_default(),
                message: format!("representation index {representation_index} out of range"),
            })?;
        inner.current_representation = representation_index;
        drop(inner);

        info!(from_id = from.id, to_id = to.id, %reason, "representation switch");
        self.events
            .emit(&PlayerEvent::RepresentationSwitched { from, to, reason });
        Ok(())
    }
}

impl Default for DashAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackAdapter for DashAdapter {
    async fn mount(&self, element: &VideoElementHandle) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        if inner.element.is_some() {
            return Ok(());
        }
        debug!(element = element.id, "DASH adapter mounted");
        inner.element = Some(element.clone());
        drop(inner);
        self.events.emit(&PlayerEvent::Mounted);
        Ok(())
    }

    async fn load(&self, url: &str) -> Result<(), AdapterError> {
        if self.inner.read().await.element.is_none() {
            return Err(AdapterError::NotMounted);
        }

        let mpd = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AdapterError::LoadFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?
            .text()
            .await
            .map_err(|e| AdapterError::LoadFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !mpd.contains("<MPD") {
            return Err(AdapterError::LoadFailed {
                url: url.to_string(),
                message: "document has no <MPD> root element".to_string(),
            });
        }

        let representations = extract_representations(&mpd);
        if representations.is_empty() {
            return Err(AdapterError::LoadFailed {
                url: url.to_string(),
                message: "MPD declares no representations".to_string(),
            });
        }
        let duration = parse_duration_attr(&mpd, "mediaPresentationDuration");

        info!(
            url,
            representations = representations.len(),
            "DASH MPD loaded"
        );

        let mut inner = self.inner.write().await;
        inner.url = Some(url.to_string());
        inner.representations = representations.clone();
        inner.current_representation = 0;
        inner.position = 0.0;
        drop(inner);

        self.events.emit(&PlayerEvent::MpdLoaded {
            representations,
            duration,
        });
        Ok(())
    }

    async fn play(&self) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        if inner.url.is_none() {
            return Err(AdapterError::PlayFailed {
                message: "no MPD loaded".to_string(),
            });
        }
        inner.playing = true;
        Ok(())
    }

    async fn pause(&self) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        if inner.url.is_none() {
            return Err(AdapterError::PauseFailed {
                message: "no MPD loaded".to_string(),
            });
        }
        inner.playing = false;
        Ok(())
    }

    async fn seek(&self, time: f64) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        if inner.url.is_none() {
            return Err(AdapterError::SeekFailed {
                time,
                message: "no MPD loaded".to_string(),
            });
        }
        inner.position = time;
        drop(inner);
        self.events.emit(&PlayerEvent::Seeked { success: true });
        self.events.emit(&PlayerEvent::TimeUpdate { time });
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> Result<(), AdapterError> {
        if volume > 100 {
            return Err(AdapterError::VolumeFailed {
                message: format!("volume {volume} out of range 0..=100"),
            });
        }
        let mut inner = self.inner.write().await;
        inner.volume = volume;
        let muted = inner.muted;
        drop(inner);
        self.events.emit(&PlayerEvent::VolumeChanged { volume, muted });
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        inner.muted = muted;
        let volume = inner.volume;
        drop(inner);
        self.events.emit(&PlayerEvent::VolumeChanged { volume, muted });
        Ok(())
    }

    async fn destroy(&self) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        *inner = DashInner {
            volume: 100,
            ..Default::default()
        };
        debug!("DASH adapter destroyed");
        Ok(())
    }

    fn subscribe(&self, listener: Box<dyn Fn(&PlayerEvent) + Send + Sync>) -> AdapterSubscription {
        self.events.subscribe(move |event| listener(event))
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Dash
    }
}
