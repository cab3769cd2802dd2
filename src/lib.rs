//! HbbTV Player Core - State machine and transition engine for a smart-TV
//! runtime emulator
//!
//! This crate models the playback side of an HbbTV/OIPF terminal:
//! - A closed `PlayerState` union covering control, source-pipeline and
//!   error states
//! - Total matcher functions for querying any state
//! - Pure transition functions for core playback, HLS and DASH flows
//! - A `PlayerRuntime` orchestrator with pluggable playback adapters
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     HbbTV Player Core                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │ PlayerState  │  │   Matchers   │  │ Transitions  │           │
//! │  │   (union)    │  │   (total)    │  │    (pure)    │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │   Player    │                              │
//! │                    │   Runtime   │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │    Native    │  │     HLS     │  │     DASH     │            │
//! │  │   Adapter    │  │   Adapter   │  │   Adapter    │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod adapter;
pub mod error;
pub mod events;
pub mod matchers;
pub mod runtime;
pub mod state;
pub mod transitions;
pub mod types;

pub use adapter::{AdapterFactory, PlaybackAdapter};
pub use error::{AdapterError, RuntimeError, TransitionError, TransitionResult};
pub use events::{ListenerSet, Subscription};
pub use runtime::{PlayerRuntime, RuntimePhase};
pub use state::{PlayerState, TagGroup};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "HbbTV Player Core initialized");
}
