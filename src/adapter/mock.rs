//! Scriptable adapter for runtime tests
//!
//! Records every call, can be told to fail individual operations, and lets
//! a test inject engine events as if the backend had reported them.

use super::{AdapterSubscription, PlaybackAdapter};
use crate::error::AdapterError;
use crate::events::ListenerSet;
use crate::types::{PlayerEvent, SourceFormat, VideoElementHandle};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
struct MockState {
    calls: Vec<String>,
    mounted: bool,
    loaded_url: Option<String>,
}

/// Adapter double shared between a test and the runtime under test
pub struct MockAdapter {
    format: SourceFormat,
    state: Mutex<MockState>,
    fail_load: AtomicBool,
    fail_play: AtomicBool,
    fail_seek: AtomicBool,
    fail_destroy: AtomicBool,
    hold_load: AtomicBool,
    load_gate: Notify,
    events: ListenerSet<PlayerEvent>,
}

impl MockAdapter {
    pub fn new(format: SourceFormat) -> Arc<Self> {
        Arc::new(Self {
            format,
            state: Mutex::new(MockState::default()),
            fail_load: AtomicBool::new(false),
            fail_play: AtomicBool::new(false),
            fail_seek: AtomicBool::new(false),
            fail_destroy: AtomicBool::new(false),
            hold_load: AtomicBool::new(false),
            load_gate: Notify::new(),
            events: ListenerSet::new(),
        })
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_play(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_seek(&self, fail: bool) {
        self.fail_seek.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_destroy(&self, fail: bool) {
        self.fail_destroy.store(fail, Ordering::SeqCst);
    }

    /// Make `load` suspend until `release_load` is called, so a test can
    /// act while the load is in flight.
    pub fn set_hold_load(&self, hold: bool) {
        self.hold_load.store(hold, Ordering::SeqCst);
    }

    /// Release one held `load` call
    pub fn release_load(&self) {
        self.load_gate.notify_one();
    }

    /// Every trait method invoked so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().expect("mock state poisoned").calls.clone()
    }

    pub fn loaded_url(&self) -> Option<String> {
        self.state
            .lock()
            .expect("mock state poisoned")
            .loaded_url
            .clone()
    }

    /// Inject an engine event as if the backend had reported it
    pub fn emit(&self, event: &PlayerEvent) {
        self.events.emit(event);
    }

    fn record(&self, call: impl Into<String>) {
        self.state
            .lock()
            .expect("mock state poisoned")
            .calls
            .push(call.into());
    }
}

#[async_trait]
impl PlaybackAdapter for Arc<MockAdapter> {
    async fn mount(&self, element: &VideoElementHandle) -> Result<(), AdapterError> {
        self.record(format!("mount({})", element.id));
        self.state.lock().expect("mock state poisoned").mounted = true;
        Ok(())
    }

    async fn load(&self, url: &str) -> Result<(), AdapterError> {
        self.record(format!("load({url})"));
        if self.hold_load.load(Ordering::SeqCst) {
            self.load_gate.notified().await;
        }
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(AdapterError::LoadFailed {
                url: url.to_string(),
                message: "scripted load failure".to_string(),
            });
        }
        self.state.lock().expect("mock state poisoned").loaded_url = Some(url.to_string());
        Ok(())
    }

    async fn play(&self) -> Result<(), AdapterError> {
        self.record("play");
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(AdapterError::PlayFailed {
                message: "scripted play failure".to_string(),
            });
        }
        Ok(())
    }

    async fn pause(&self) -> Result<(), AdapterError> {
        self.record("pause");
        Ok(())
    }

    async fn seek(&self, time: f64) -> Result<(), AdapterError> {
        self.record(format!("seek({time})"));
        if self.fail_seek.load(Ordering::SeqCst) {
            return Err(AdapterError::SeekFailed {
                time,
                message: "scripted seek failure".to_string(),
            });
        }
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> Result<(), AdapterError> {
        self.record(format!("set_volume({volume})"));
        Ok(())
    }

    async fn set_muted(&self, muted: bool) -> Result<(), AdapterError> {
        self.record(format!("set_muted({muted})"));
        Ok(())
    }

    async fn destroy(&self) -> Result<(), AdapterError> {
        self.record("destroy");
        if self.fail_destroy.load(Ordering::SeqCst) {
            return Err(AdapterError::DestroyFailed {
                message: "scripted destroy failure".to_string(),
            });
        }
        Ok(())
    }

    fn subscribe(&self, listener: Box<dyn Fn(&PlayerEvent) + Send + Sync>) -> AdapterSubscription {
        self.events.subscribe(move |event| listener(event))
    }

    fn format(&self) -> SourceFormat {
        self.format
    }
}
