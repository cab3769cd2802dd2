//! Player runtime - orchestrator for a single emulated player
//!
//! Owns the one current `PlayerState`, the active playback adapter and the
//! listener registries. External callers (OIPF A/V objects, UI controls)
//! submit `PlayerEvent`s through `dispatch`; the runtime routes them
//! through the pure transition functions and the adapter boundary, then
//! publishes the new state to subscribers.
//!
//! Dispatches against one runtime are processed to completion in
//! submission order: the dispatch mutex is FIFO, the current state is
//! captured synchronously before any adapter await, and write-back happens
//! only after the awaited operation settles.

use crate::adapter::{default_adapter_factory, AdapterFactory, AdapterSubscription, PlaybackAdapter};
use crate::error::{AdapterError, RuntimeError, TransitionError, TransitionResult};
use crate::events::{ListenerSet, Subscription};
use crate::state::PlayerState;
use crate::transitions;
use crate::types::{PlayerEvent, RuntimeConfig, RuntimeId, SourceFormat, VideoElementHandle};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock as StdRwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Subscription handle returned by [`PlayerRuntime::subscribe_to_state`]
pub type StateSubscription = Subscription<Arc<PlayerState>>;

/// Subscription handle returned by [`PlayerRuntime::subscribe_to_events`]
pub type EventSubscription = Subscription<PlayerEvent>;

/// Runtime lifecycle, orthogonal to the `PlayerState` value it holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimePhase {
    Uninitialized,
    Mounted,
    Destroyed,
}

/// Bounded diagnostics log shared with adapter event forwarding
#[derive(Clone)]
struct EventLog {
    ring: Arc<StdMutex<VecDeque<PlayerEvent>>>,
    capacity: usize,
    listeners: ListenerSet<PlayerEvent>,
}

impl EventLog {
    fn new(capacity: usize) -> Self {
        Self {
            ring: Arc::new(StdMutex::new(VecDeque::with_capacity(capacity))),
            capacity,
            listeners: ListenerSet::new(),
        }
    }

    /// Append to the ring (evicting the oldest entry at capacity) and
    /// notify event listeners.
    fn record(&self, event: &PlayerEvent) {
        {
            let mut ring = self.ring.lock().expect("event ring poisoned");
            if ring.len() >= self.capacity {
                ring.pop_front();
            }
            ring.push_back(event.clone());
        }
        self.listeners.emit(event);
    }

    fn snapshot(&self) -> Vec<PlayerEvent> {
        self.ring
            .lock()
            .expect("event ring poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

struct AdapterSlot {
    adapter: Option<Box<dyn PlaybackAdapter>>,
    mounted: bool,
    _subscription: Option<AdapterSubscription>,
}

/// The stateful orchestrator holding the single current player state
pub struct PlayerRuntime {
    id: RuntimeId,
    config: RuntimeConfig,
    factory: AdapterFactory,
    phase: StdRwLock<RuntimePhase>,
    /// Current state snapshot. The `Arc` is replaced wholesale on every
    /// transition, so repeated `state()` calls between changes return the
    /// same allocation and callers may rely on pointer equality.
    state: StdRwLock<Arc<PlayerState>>,
    /// Bumped on every commit, on adapter teardown, and at the start of
    /// `destroy`; async results observed against a newer generation are
    /// discarded.
    generation: AtomicU64,
    dispatch_lock: Mutex<()>,
    adapter: Mutex<AdapterSlot>,
    element: StdRwLock<Option<VideoElementHandle>>,
    playback_type: StdRwLock<Option<SourceFormat>>,
    state_listeners: ListenerSet<Arc<PlayerState>>,
    events: EventLog,
}

impl PlayerRuntime {
    /// Create a runtime with the default per-format adapters
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_adapter_factory(config, default_adapter_factory())
    }

    /// Create a runtime with a custom adapter factory. Tests use this to
    /// substitute scripted adapters.
    pub fn with_adapter_factory(config: RuntimeConfig, factory: AdapterFactory) -> Self {
        let capacity = config.event_ring_capacity;
        Self {
            id: RuntimeId::new(),
            config,
            factory,
            phase: StdRwLock::new(RuntimePhase::Uninitialized),
            state: StdRwLock::new(Arc::new(PlayerState::Idle)),
            generation: AtomicU64::new(0),
            dispatch_lock: Mutex::new(()),
            adapter: Mutex::new(AdapterSlot {
                adapter: None,
                mounted: false,
                _subscription: None,
            }),
            element: StdRwLock::new(None),
            playback_type: StdRwLock::new(None),
            state_listeners: ListenerSet::new(),
            events: EventLog::new(capacity),
        }
    }

    /// Runtime instance id
    pub fn id(&self) -> RuntimeId {
        self.id
    }

    /// The configuration this runtime was created with
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> RuntimePhase {
        *self.phase.read().expect("phase lock poisoned")
    }

    /// Current immutable state snapshot. Referentially stable between
    /// state changes.
    pub fn state(&self) -> Arc<PlayerState> {
        Arc::clone(&self.state.read().expect("state lock poisoned"))
    }

    /// Active adapter format; absent until a load succeeds and after
    /// destroy.
    pub fn playback_type(&self) -> Option<SourceFormat> {
        *self.playback_type.read().expect("playback type lock poisoned")
    }

    /// Diagnostics snapshot of the bounded recent-event ring
    pub fn recent_events(&self) -> Vec<PlayerEvent> {
        self.events.snapshot()
    }

    /// Bind the rendering target. Idempotent: a second mount keeps the
    /// first element. Never suspends; the active adapter (if any) is
    /// mounted lazily on the next dispatch.
    pub fn mount(&self, element: &VideoElementHandle) -> Result<(), RuntimeError> {
        if self.phase() == RuntimePhase::Destroyed {
            return Err(RuntimeError::Destroyed);
        }
        let mut slot = self.element.write().expect("element lock poisoned");
        if slot.is_some() {
            return Ok(());
        }
        debug!(runtime_id = %self.id, element = element.id, "runtime mounted");
        *slot = Some(element.clone());
        drop(slot);
        *self.phase.write().expect("phase lock poisoned") = RuntimePhase::Mounted;
        Ok(())
    }

    /// Register a state listener. It is invoked immediately with the
    /// current state so new subscribers never miss it, then once per
    /// subsequent change.
    pub fn subscribe_to_state(
        &self,
        listener: impl Fn(&Arc<PlayerState>) + Send + Sync + 'static,
    ) -> StateSubscription {
        let listener = Arc::new(listener);
        listener(&self.state());
        let forward = Arc::clone(&listener);
        self.state_listeners.subscribe(move |state| forward(state))
    }

    /// Register an event listener observing every dispatched
    /// `PlayerEvent`: externally submitted intents, adapter-sourced engine
    /// events and runtime diagnostics alike.
    pub fn subscribe_to_events(
        &self,
        listener: impl Fn(&PlayerEvent) + Send + Sync + 'static,
    ) -> EventSubscription {
        self.events.listeners.subscribe(listener)
    }

    /// Route one event through the transition engine and the adapter
    /// boundary. Dispatches are serialized per instance: a second call
    /// never observes a half-applied transition from the first.
    #[instrument(skip(self, event), fields(runtime_id = %self.id))]
    pub async fn dispatch(&self, event: PlayerEvent) -> Result<(), RuntimeError> {
        let _guard = self.dispatch_lock.lock().await;
        if self.phase() == RuntimePhase::Destroyed {
            return Err(RuntimeError::Destroyed);
        }

        debug!(event = ?event, "dispatch");
        self.events.record(&event);
        self.ensure_adapter_mounted().await;

        match event {
            // --- Intents ---
            PlayerEvent::LoadRequested { url } => self.handle_load(url).await,
            PlayerEvent::PlayRequested => {
                // No active adapter is fine; the pure transition still runs.
                let slot = self.adapter.lock().await;
                let outcome = match slot.adapter.as_ref() {
                    Some(adapter) => adapter.play().await,
                    None => Ok(()),
                };
                drop(slot);
                if let Err(e) = outcome {
                    self.report_adapter_error("play", e);
                    return Ok(());
                }
                let current = self.state();
                self.apply(transitions::play(&current), "play");
            }
            PlayerEvent::PauseRequested => {
                let slot = self.adapter.lock().await;
                let outcome = match slot.adapter.as_ref() {
                    Some(adapter) => adapter.pause().await,
                    None => Ok(()),
                };
                drop(slot);
                if let Err(e) = outcome {
                    self.report_adapter_error("pause", e);
                    return Ok(());
                }
                let current = self.state();
                self.apply(transitions::pause(&current), "pause");
            }
            PlayerEvent::SeekRequested { time } => {
                // Validate before touching the adapter so an out-of-range
                // target never reaches the backend.
                let current = self.state();
                let seeking = match transitions::seek(time, &current) {
                    Ok(next) => next,
                    Err(e) => {
                        self.reject("seek", e);
                        return Ok(());
                    }
                };
                let slot = self.adapter.lock().await;
                if let Some(adapter) = slot.adapter.as_ref() {
                    if let Err(e) = adapter.seek(time).await {
                        drop(slot);
                        self.report_adapter_error("seek", e);
                        return Ok(());
                    }
                }
                self.commit(seeking);
            }
            PlayerEvent::StopRequested => {
                self.teardown_adapter().await;
                let current = self.state();
                self.commit(transitions::stop(&current));
            }
            PlayerEvent::SetVolumeRequested { volume } => {
                let slot = self.adapter.lock().await;
                if let Some(adapter) = slot.adapter.as_ref() {
                    if let Err(e) = adapter.set_volume(volume).await {
                        drop(slot);
                        self.report_adapter_error("set_volume", e);
                    }
                }
            }
            PlayerEvent::SetMutedRequested { muted } => {
                let slot = self.adapter.lock().await;
                if let Some(adapter) = slot.adapter.as_ref() {
                    if let Err(e) = adapter.set_muted(muted).await {
                        drop(slot);
                        self.report_adapter_error("set_muted", e);
                    }
                }
            }

            // --- Engine events ---
            PlayerEvent::Mounted
            | PlayerEvent::VolumeChanged { .. }
            | PlayerEvent::SegmentLoaded { .. }
            | PlayerEvent::TransitionRejected { .. } => {
                // Diagnostics only; already recorded above.
            }
            PlayerEvent::TimeUpdate { time } => {
                let current = self.state();
                if let Some(next) = transitions::update_time(&current, time) {
                    self.commit(next);
                }
            }
            PlayerEvent::DurationChanged { duration } => {
                let current = self.state();
                if let Some(next) = transitions::update_duration(&current, duration) {
                    self.commit(next);
                }
            }
            PlayerEvent::Stalled { .. } => {
                let current = self.state();
                self.apply(transitions::start_buffering(&current), "start_buffering");
            }
            PlayerEvent::Resumed { .. } => {
                let current = self.state();
                self.apply(
                    transitions::resume_from_buffering(&current),
                    "resume_from_buffering",
                );
            }
            PlayerEvent::Seeked { success } => {
                let current = self.state();
                if matches!(*current, PlayerState::Seeking { .. }) {
                    self.apply(transitions::complete_seek(&current, success), "complete_seek");
                }
            }
            PlayerEvent::PlaybackEnded => {
                let current = self.state();
                self.apply(transitions::end(&current), "end");
            }
            PlayerEvent::ManifestLoaded { variants, duration } => {
                let current = self.state();
                self.apply(
                    transitions::manifest_parsed(&current, variants, duration),
                    "manifest_parsed",
                );
            }
            PlayerEvent::MpdLoaded {
                representations,
                duration,
            } => {
                let current = self.state();
                self.apply(
                    transitions::mpd_parsed(&current, representations, duration),
                    "mpd_parsed",
                );
            }
            PlayerEvent::VariantSwitched { from, to, reason } => {
                self.commit(transitions::switch_variant(&from, &to, reason));
            }
            PlayerEvent::RepresentationSwitched { from, to, reason } => {
                self.commit(transitions::switch_representation(&from, &to, reason));
            }

            // --- Adapter-reported errors ---
            PlayerEvent::NetworkErrorReported { message } => {
                let current = self.state();
                self.commit(transitions::fail_network(&current, message));
            }
            PlayerEvent::NotSupportedReported { message } => {
                self.commit(transitions::fail_not_supported(message));
            }
            PlayerEvent::DrmErrorReported { message } => {
                self.commit(transitions::fail_drm(message));
            }
            PlayerEvent::AbortReported { message } => {
                self.commit(transitions::fail_abort(message));
            }
            PlayerEvent::HlsSegmentErrorReported { sequence, message } => {
                let current = self.state();
                self.commit(transitions::fail_hls_segment(&current, sequence, message));
            }
            PlayerEvent::DashDecodeErrorReported { message } => {
                self.commit(transitions::fail_dash_decode(message));
            }
        }

        Ok(())
    }

    /// Tear down the active adapter and reach `Destroyed`. Idempotent;
    /// adapter teardown failures are reported but never block completion.
    #[instrument(skip(self), fields(runtime_id = %self.id))]
    pub async fn destroy(&self) -> Result<(), RuntimeError> {
        // Invalidate any in-flight load before waiting for the dispatch
        // lock; its result will be discarded when it settles.
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _guard = self.dispatch_lock.lock().await;
        if self.phase() == RuntimePhase::Destroyed {
            return Ok(());
        }

        self.teardown_adapter().await;
        *self.phase.write().expect("phase lock poisoned") = RuntimePhase::Destroyed;
        info!("runtime destroyed");
        Ok(())
    }

    /// Drive the `LoadRequested` intent: tear down the old adapter, sniff
    /// the format, instantiate and load the new adapter, fold the result
    /// back into the state machine.
    async fn handle_load(&self, url: String) {
        self.teardown_adapter().await;

        let format = SourceFormat::detect(&url);
        let loading = transitions::load_source(&url, format);
        let load_rejected = loading.is_error();
        self.commit(loading);
        if load_rejected {
            return;
        }

        let adapter = (self.factory)(format);
        let subscription = adapter.subscribe(Box::new({
            let events = self.events.clone();
            move |event| events.record(event)
        }));

        let element = self.element.read().expect("element lock poisoned").clone();
        let mut mounted = false;
        if let Some(element) = element {
            match adapter.mount(&element).await {
                Ok(()) => mounted = true,
                Err(e) => warn!(error = %e, "adapter mount failed"),
            }
        }

        // Guard against committing a result that a concurrent destroy or
        // an adapter teardown has already superseded.
        let generation = self.generation.load(Ordering::SeqCst);
        let outcome = adapter.load(&url).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(url, "discarding stale load result");
            if let Err(e) = adapter.destroy().await {
                warn!(error = %e, "adapter teardown failed");
            }
            return;
        }

        let current = self.state();
        match outcome {
            Ok(()) => {
                self.apply(transitions::complete_loading(&current, format), "complete_loading");
                let mut slot = self.adapter.lock().await;
                slot.adapter = Some(adapter);
                slot.mounted = mounted;
                slot._subscription = Some(subscription);
                drop(slot);
                *self
                    .playback_type
                    .write()
                    .expect("playback type lock poisoned") = Some(format);
            }
            Err(e) => {
                warn!(url, error = %e, "adapter load failed");
                if let Err(e) = adapter.destroy().await {
                    warn!(error = %e, "adapter teardown failed");
                }
                self.commit(transitions::fail_network(&current, e.to_string()));
            }
        }
    }

    /// Mount the active adapter if an element arrived after it was created
    async fn ensure_adapter_mounted(&self) {
        let element = self.element.read().expect("element lock poisoned").clone();
        let Some(element) = element else { return };

        let mut slot = self.adapter.lock().await;
        if slot.mounted {
            return;
        }
        if let Some(adapter) = slot.adapter.as_ref() {
            match adapter.mount(&element).await {
                Ok(()) => slot.mounted = true,
                Err(e) => warn!(error = %e, "adapter mount failed"),
            }
        }
    }

    /// Best-effort adapter teardown; errors are reported, never propagated
    async fn teardown_adapter(&self) {
        let mut slot = self.adapter.lock().await;
        let adapter = slot.adapter.take();
        slot.mounted = false;
        slot._subscription = None;
        drop(slot);

        if let Some(adapter) = adapter {
            if let Err(e) = adapter.destroy().await {
                warn!(error = %e, "adapter teardown failed");
            }
            *self
                .playback_type
                .write()
                .expect("playback type lock poisoned") = None;
            // Invalidate any in-flight async result.
            self.generation.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Commit a transition result or record its rejection
    fn apply(&self, result: TransitionResult, operation: &str) {
        match result {
            Ok(next) => self.commit(next),
            Err(e) => self.reject(operation, e),
        }
    }

    /// Replace the current state and notify subscribers. A transition that
    /// lands on an equal state keeps the existing snapshot so reference
    /// equality holds for consumers.
    fn commit(&self, next: PlayerState) {
        let snapshot = {
            let mut state = self.state.write().expect("state lock poisoned");
            if **state == next {
                return;
            }
            let from = state.tag();
            let snapshot = Arc::new(next);
            info!(from, to = snapshot.tag(), "state transition");
            *state = Arc::clone(&snapshot);
            snapshot
        };
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state_listeners.emit(&snapshot);
    }

    /// Record a rejected transition as a diagnostic; state is unchanged
    fn reject(&self, operation: &str, error: TransitionError) {
        warn!(operation, error = %error, "transition rejected");
        self.events.record(&PlayerEvent::TransitionRejected {
            operation: operation.to_string(),
            message: error.to_string(),
        });
    }

    /// Report a failed adapter transport call as a diagnostic
    fn report_adapter_error(&self, operation: &str, error: AdapterError) {
        warn!(operation, error = %error, "adapter call failed");
        self.events.record(&PlayerEvent::TransitionRejected {
            operation: operation.to_string(),
            message: error.to_string(),
        });
    }
}

impl std::fmt::Debug for PlayerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerRuntime")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .field("state", &self.state().tag())
            .field("playback_type", &self.playback_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MockAdapter;
    use std::sync::Mutex as StdMutex;

    fn mock_runtime(mock: Arc<MockAdapter>) -> PlayerRuntime {
        PlayerRuntime::with_adapter_factory(
            RuntimeConfig::default(),
            Arc::new(move |_| Box::new(Arc::clone(&mock))),
        )
    }

    fn element() -> VideoElementHandle {
        VideoElementHandle::new("video-1", "video/mp4")
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let runtime = PlayerRuntime::new(RuntimeConfig::default());
        assert_eq!(*runtime.state(), PlayerState::Idle);
        assert_eq!(runtime.phase(), RuntimePhase::Uninitialized);
        assert_eq!(runtime.playback_type(), None);
    }

    #[tokio::test]
    async fn test_state_snapshot_reference_stable() {
        let runtime = PlayerRuntime::new(RuntimeConfig::default());
        let a = runtime.state();
        let b = runtime.state();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_subscriber_immediate_replay() {
        let runtime = PlayerRuntime::new(RuntimeConfig::default());
        let seen: Arc<StdMutex<Vec<&'static str>>> = Arc::new(StdMutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        let _sub = runtime.subscribe_to_state(move |state| {
            seen_clone.lock().unwrap().push(state.tag());
        });

        // Replayed synchronously, before any dispatch.
        assert_eq!(*seen.lock().unwrap(), vec!["Control/Idle"]);
    }

    #[tokio::test]
    async fn test_mount_is_idempotent() {
        let runtime = PlayerRuntime::new(RuntimeConfig::default());
        runtime.mount(&element()).unwrap();
        assert_eq!(runtime.phase(), RuntimePhase::Mounted);
        runtime.mount(&element()).unwrap();
        assert_eq!(runtime.phase(), RuntimePhase::Mounted);
    }

    #[tokio::test]
    async fn test_destroy_idempotent_without_adapter() {
        let runtime = PlayerRuntime::new(RuntimeConfig::default());
        assert!(runtime.destroy().await.is_ok());
        assert!(runtime.destroy().await.is_ok());
        assert_eq!(runtime.phase(), RuntimePhase::Destroyed);
    }

    #[tokio::test]
    async fn test_dispatch_after_destroy_rejected() {
        let runtime = PlayerRuntime::new(RuntimeConfig::default());
        runtime.destroy().await.unwrap();
        assert_eq!(
            runtime.dispatch(PlayerEvent::PlayRequested).await,
            Err(RuntimeError::Destroyed)
        );
    }

    #[tokio::test]
    async fn test_load_drives_adapter_and_state() {
        let mock = MockAdapter::new(SourceFormat::Native);
        let runtime = mock_runtime(Arc::clone(&mock));
        runtime.mount(&element()).unwrap();

        runtime
            .dispatch(PlayerEvent::LoadRequested {
                url: "video.mp4".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(runtime.state().tag(), "Source/Native/Ready");
        assert_eq!(runtime.playback_type(), Some(SourceFormat::Native));
        assert_eq!(mock.loaded_url(), Some("video.mp4".to_string()));
        assert!(mock.calls().contains(&"mount(video-1)".to_string()));
    }

    #[tokio::test]
    async fn test_load_malformed_url_enters_network_error() {
        let mock = MockAdapter::new(SourceFormat::Native);
        let runtime = mock_runtime(Arc::clone(&mock));

        runtime
            .dispatch(PlayerEvent::LoadRequested {
                url: "".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(runtime.state().tag(), "Error/Network");
        // The adapter is never consulted for a malformed URL.
        assert!(mock.calls().is_empty());
        assert_eq!(runtime.playback_type(), None);
    }

    #[tokio::test]
    async fn test_adapter_load_failure_maps_to_network_error() {
        let mock = MockAdapter::new(SourceFormat::Native);
        mock.set_fail_load(true);
        let runtime = mock_runtime(Arc::clone(&mock));

        runtime
            .dispatch(PlayerEvent::LoadRequested {
                url: "video.mp4".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(runtime.state().tag(), "Error/Network");
        assert_eq!(runtime.playback_type(), None);
        assert!(crate::matchers::is_recoverable(&runtime.state()));
        // The adapter that failed to load was torn down, not leaked.
        assert!(mock.calls().contains(&"destroy".to_string()));
    }

    #[tokio::test]
    async fn test_destroy_during_load_discards_result() {
        let mock = MockAdapter::new(SourceFormat::Native);
        mock.set_hold_load(true);
        let runtime = Arc::new(mock_runtime(Arc::clone(&mock)));
        runtime.mount(&element()).unwrap();

        let load = {
            let runtime = Arc::clone(&runtime);
            tokio::spawn(async move {
                runtime
                    .dispatch(PlayerEvent::LoadRequested {
                        url: "video.mp4".to_string(),
                    })
                    .await
            })
        };
        // Wait until the load has reached the adapter and is suspended.
        while !mock.calls().iter().any(|c| c.starts_with("load")) {
            tokio::task::yield_now().await;
        }

        let destroy = {
            let runtime = Arc::clone(&runtime);
            tokio::spawn(async move { runtime.destroy().await })
        };
        // Let destroy invalidate the generation and queue on the dispatch
        // lock before the load is released.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        mock.release_load();

        load.await.unwrap().unwrap();
        destroy.await.unwrap().unwrap();

        // The settled load was discarded: no ready state, no playback
        // type, and the orphaned adapter was torn down exactly once.
        assert_eq!(runtime.state().tag(), "Control/Loading");
        assert_eq!(runtime.playback_type(), None);
        assert_eq!(runtime.phase(), RuntimePhase::Destroyed);
        assert_eq!(mock.calls().iter().filter(|c| *c == "destroy").count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_intent_leaves_state_and_emits_diagnostic() {
        let runtime = PlayerRuntime::new(RuntimeConfig::default());
        let before = runtime.state();

        runtime.dispatch(PlayerEvent::PauseRequested).await.unwrap();

        assert!(Arc::ptr_eq(&before, &runtime.state()));
        assert!(runtime
            .recent_events()
            .iter()
            .any(|e| matches!(e, PlayerEvent::TransitionRejected { operation, .. } if operation == "pause")));
    }

    #[tokio::test]
    async fn test_event_ring_evicts_oldest_at_capacity() {
        let config = RuntimeConfig {
            event_ring_capacity: 5,
            ..Default::default()
        };
        let runtime = PlayerRuntime::new(config);

        for i in 0..8 {
            runtime
                .dispatch(PlayerEvent::TimeUpdate { time: i as f64 })
                .await
                .unwrap();
        }

        let events = runtime.recent_events();
        assert_eq!(events.len(), 5);
        assert_eq!(events[0], PlayerEvent::TimeUpdate { time: 3.0 });
        assert_eq!(events[4], PlayerEvent::TimeUpdate { time: 7.0 });
    }

    #[tokio::test]
    async fn test_event_subscriber_sees_intents_and_diagnostics() {
        let runtime = PlayerRuntime::new(RuntimeConfig::default());
        let seen: Arc<StdMutex<Vec<PlayerEvent>>> = Arc::new(StdMutex::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        let _sub = runtime.subscribe_to_events(move |event| {
            seen_clone.lock().unwrap().push(event.clone());
        });

        runtime.dispatch(PlayerEvent::PlayRequested).await.unwrap();

        let events = seen.lock().unwrap();
        assert!(events.contains(&PlayerEvent::PlayRequested));
        // Play from Idle starts at zero; Idle carries no duration.
        drop(events);
        assert_eq!(runtime.state().tag(), "Control/Playing");
    }

    #[tokio::test]
    async fn test_error_events_enter_error_states_with_retry_bookkeeping() {
        let runtime = PlayerRuntime::new(RuntimeConfig::default());

        runtime
            .dispatch(PlayerEvent::NetworkErrorReported {
                message: "timeout".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(runtime.state().tag(), "Error/Network");
        assert_eq!(crate::matchers::retry_count(&runtime.state()), Some(0));

        runtime
            .dispatch(PlayerEvent::NetworkErrorReported {
                message: "timeout".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(crate::matchers::retry_count(&runtime.state()), Some(1));
    }

    #[tokio::test]
    async fn test_destroy_with_failing_adapter_still_succeeds() {
        let mock = MockAdapter::new(SourceFormat::Native);
        mock.set_fail_destroy(true);
        let runtime = mock_runtime(Arc::clone(&mock));
        runtime.mount(&element()).unwrap();
        runtime
            .dispatch(PlayerEvent::LoadRequested {
                url: "video.mp4".to_string(),
            })
            .await
            .unwrap();

        assert!(runtime.destroy().await.is_ok());
        assert_eq!(runtime.phase(), RuntimePhase::Destroyed);
        assert_eq!(runtime.playback_type(), None);
    }

    #[tokio::test]
    async fn test_stop_resets_to_idle_and_clears_adapter() {
        let mock = MockAdapter::new(SourceFormat::Native);
        let runtime = mock_runtime(Arc::clone(&mock));
        runtime.mount(&element()).unwrap();
        runtime
            .dispatch(PlayerEvent::LoadRequested {
                url: "video.mp4".to_string(),
            })
            .await
            .unwrap();

        runtime.dispatch(PlayerEvent::StopRequested).await.unwrap();
        assert_eq!(*runtime.state(), PlayerState::Idle);
        assert_eq!(runtime.playback_type(), None);
        assert!(mock.calls().contains(&"destroy".to_string()));
    }
}
