//! Playback adapter boundary
//!
//! Adapters are the format-specific backends the runtime delegates actual
//! media operations to (native element, hls.js-style engine, dash.js-style
//! engine). They are thin: per-format bookkeeping and event reporting, no
//! demuxing or decoding. All adapter operations are suspension points; the
//! runtime awaits them before considering a dispatch complete.

mod dash;
mod hls;
pub mod mock;
mod native;

pub use dash::DashAdapter;
pub use hls::HlsAdapter;
pub use mock::MockAdapter;
pub use native::NativeAdapter;

use crate::error::AdapterError;
use crate::events::Subscription;
use crate::types::{PlayerEvent, SourceFormat, VideoElementHandle};
use async_trait::async_trait;
use std::sync::Arc;

/// Subscription to an adapter's event stream; unsubscribes on drop
pub type AdapterSubscription = Subscription<PlayerEvent>;

/// Factory choosing an adapter implementation for a sniffed source format.
/// The runtime takes one of these at construction so tests can substitute
/// scripted adapters.
pub type AdapterFactory = Arc<dyn Fn(SourceFormat) -> Box<dyn PlaybackAdapter> + Send + Sync>;

/// Contract between the runtime and a playback backend
#[async_trait]
pub trait PlaybackAdapter: Send + Sync {
    /// Bind the rendering target. Must be called before `load`.
    async fn mount(&self, element: &VideoElementHandle) -> Result<(), AdapterError>;

    /// Load a source URL
    async fn load(&self, url: &str) -> Result<(), AdapterError>;

    async fn play(&self) -> Result<(), AdapterError>;

    async fn pause(&self) -> Result<(), AdapterError>;

    /// Seek to an absolute position in seconds
    async fn seek(&self, time: f64) -> Result<(), AdapterError>;

    /// Set output volume, 0..=100
    async fn set_volume(&self, volume: u8) -> Result<(), AdapterError>;

    async fn set_muted(&self, muted: bool) -> Result<(), AdapterError>;

    /// Tear down the backend. Best-effort; the runtime never lets a failure
    /// here block its own teardown.
    async fn destroy(&self) -> Result<(), AdapterError>;

    /// Observe every event this adapter reports
    fn subscribe(&self, listener: Box<dyn Fn(&PlayerEvent) + Send + Sync>) -> AdapterSubscription;

    /// The format this adapter plays
    fn format(&self) -> SourceFormat;
}

/// Default factory: one adapter implementation per source format
pub fn create_adapter(format: SourceFormat) -> Box<dyn PlaybackAdapter> {
    match format {
        SourceFormat::Native => Box::new(NativeAdapter::new()),
        SourceFormat::Hls => Box::new(HlsAdapter::new()),
        SourceFormat::Dash => Box::new(DashAdapter::new()),
    }
}

/// The default `AdapterFactory` used by the runtime
pub fn default_adapter_factory() -> AdapterFactory {
    Arc::new(create_adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_picks_format_matching_adapter() {
        assert_eq!(
            create_adapter(SourceFormat::Native).format(),
            SourceFormat::Native
        );
        assert_eq!(create_adapter(SourceFormat::Hls).format(), SourceFormat::Hls);
        assert_eq!(
            create_adapter(SourceFormat::Dash).format(),
            SourceFormat::Dash
        );
    }
}
