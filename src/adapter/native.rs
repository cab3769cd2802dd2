//! Progressive playback adapter over the native element
//!
//! Wraps the page's `<video>` element: no manifests, no quality ladder,
//! just transport operations mirrored onto a simulated playhead.

use super::{AdapterSubscription, PlaybackAdapter};
use crate::error::AdapterError;
use crate::events::ListenerSet;
use crate::types::{PlayerEvent, SourceFormat, VideoElementHandle};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct NativeInner {
    element: Option<VideoElementHandle>,
    url: Option<String>,
    position: f64,
    playing: bool,
    volume: u8,
    muted: bool,
}

/// Adapter for progressive sources (`video/mp4` and friends)
pub struct NativeAdapter {
    inner: RwLock<NativeInner>,
    events: ListenerSet<PlayerEvent>,
}

impl NativeAdapter {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(NativeInner {
                volume: 100,
                ..Default::default()
            }),
            events: ListenerSet::new(),
        }
    }
}

impl Default for NativeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybackAdapter for NativeAdapter {
    async fn mount(&self, element: &VideoElementHandle) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        if inner.element.is_some() {
            return Ok(());
        }
        debug!(element = element.id, "native adapter mounted");
        inner.element = Some(element.clone());
        drop(inner);
        self.events.emit(&PlayerEvent::Mounted);
        Ok(())
    }

    async fn load(&self, url: &str) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        if inner.element.is_none() {
            return Err(AdapterError::NotMounted);
        }
        debug!(url, "native source attached");
        inner.url = Some(url.to_string());
        inner.position = 0.0;
        inner.playing = false;
        Ok(())
    }

    async fn play(&self) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        if inner.url.is_none() {
            return Err(AdapterError::PlayFailed {
                message: "no source loaded".to_string(),
            });
        }
        inner.playing = true;
        Ok(())
    }

    async fn pause(&self) -> Result<(), AdapterError> {
        let mut inner = self.inner.write().await;
        if inner.url.is_none() {
            return Err(AdapterError::PauseFailed {
                message: "no source loaded".to_string(),
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
                message: "no source loaded".to_string(),
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
        *inner = NativeInner {
            volume: 100,
            ..Default::default()
        };
        debug!("native adapter destroyed");
        Ok(())
    }

    fn subscribe(&self, listener: Box<dyn Fn(&PlayerEvent) + Send + Sync>) -> AdapterSubscription {
        self.events.subscribe(move |event| listener(event))
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Native
    }
}
