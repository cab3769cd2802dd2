//! HLS playback adapter
//!
//! Plays the role an hls.js engine has in the real runtime: fetches and
//! parses the master playlist, keeps the variant ladder, reports parsed
//! manifests and ABR switches as engine events. Segment handling and
//! decoding stay out of scope.

use super::{AdapterSubscription, PlaybackAdapter};
use crate::error::AdapterError;
use crate::events::ListenerSet;
use crate::transitions::hls::parse_master_variants;
use crate::types::{HlsVariant, PlayerEvent, SourceFormat, SwitchReason, VideoElementHandle};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct HlsInner {
    element: Option<VideoElementHandle>,
    url: Option<String>,
    variants: Vec<HlsVariant>,
    current_variant: usize,
    position: f64,
    playing: bool,
    volume: u8,
    muted: bool,
}

/// Adapter for `application/vnd.apple.mpegurl` sources
pub struct HlsAdapter {
    client: Client,
    inner: RwLock<HlsInner>,
    events: ListenerSet<PlayerEvent>,
}

impl HlsAdapter {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            inner: RwLock::new(HlsInner {
                volume: 100,
                ..Default::default()
            }),
            events: ListenerSet::new(),
        }
    }

    /// The variant ladder from the last parsed manifest
    pub async fn variants(&self) -> Vec<HlsVariant> {
        self.inner.read().await.variants.clone()
    }

    /// Switch to another variant of the loaded ladder and report it.
    /// This is the ABR decision surface; the runtime only observes it.
    pub async fn switch_to(
        &self,
        variant_index: usize,
        reason: SwitchReason,
    ) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        let from = inner
            .variants
            .get(inner.current_variant)
            .cloned()
            .ok_or_else(|| AdapterError::LoadFailed {
                url: inner.url.clone().unwrap_or_default(),
                message: "no manifest loaded".to_string(),
            })?;
        let to = inner
            .variants
            .get(variant_index)
            .cloned()
            .ok_or_else(|| AdapterError::LoadFailed {
                url: inner.url.clone().unwrap_or_default(),
                message: format!("variant index {variant_index} out of range"),
            })?;
        inner.current_variant = variant_index;
        drop(inner);

        info!(
            from_bandwidth = from.bandwidth,
            to_bandwidth = to.bandwidth,
            %reason,
            "variant switch"
        );
        self.events
            .emit(&PlayerEvent::VariantSwitched { from, to, reason });
        Ok(())
    }
}

impl Default for HlsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackAdapter for HlsAdapter {
    async fn mount(&self, element: &VideoElementHandle) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        if inner.element.is_some() {
            return Ok(());
        }
        debug!(element = element.id, "HLS adapter mounted");
        inner.element = Some(element.clone());
        drop(inner);
        self.events.emit(&PlayerEvent::Mounted);
        Ok(())
    }

    async fn load(&self, url: &str) -> Result<(), AdapterError> {
        if self.inner.read().await.element.is_none() {
            return Err(AdapterError::NotMounted);
        }

        let manifest = self
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

        let variants =
            parse_master_variants(url, &manifest).map_err(|message| AdapterError::LoadFailed {
                url: url.to_string(),
                message,
            })?;

        info!(url, variants = variants.len(), "HLS manifest loaded");

        let mut inner = self.inner.write().await;
        inner.url = Some(url.to_string());
        inner.variants = variants.clone();
        inner.current_variant = 0;
        inner.position = 0.0;
        drop(inner);

        self.events.emit(&PlayerEvent::ManifestLoaded {
            variants,
            duration: None,
        });
        Ok(())
    }

    async fn play(&self) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        if inner.url.is_none() {
            return Err(AdapterError::PlayFailed {
                message: "no manifest loaded".to_string(),
            });
        }
        inner.playing = true;
        Ok(())
    }

    async fn pause(&self) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        if inner.url.is_none() {
            return Err(AdapterError::PauseFailed {
                message: "no manifest loaded".to_string(),
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
                message: "no manifest loaded".to_string(),
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
        *inner = HlsInner {
            volume: 100,
            ..Default::default()
        };
        debug!("HLS adapter destroyed");
        Ok(())
    }

    fn subscribe(&self, listener: Box<dyn Fn(&PlayerEvent) + Send + Sync>) -> AdapterSubscription {
        self.events.subscribe(move |event| listener(event))
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Hls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_requires_mount() {
        let adapter = HlsAdapter::new();
        assert_eq!(
            adapter.load("https://example.com/master.m3u8").await,
            Err(AdapterError::NotMounted)
        );
    }

    #[tokio::test]
    async fn test_switch_without_manifest_fails() {
        let adapter = HlsAdapter::new();
        assert!(adapter.switch_to(1, SwitchReason::Manual).await.is_err());
    }

    #[tokio::test]
    async fn test_format() {
        assert_eq!(HlsAdapter::new().format(), SourceFormat::Hls);
    }
}
