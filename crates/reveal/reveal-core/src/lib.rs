//! Reveal Core (engine-agnostic)
//!
//! Viewport-triggered animation: elements register with a platform
//! visibility observer, an edge-triggered policy turns intersection changes
//! into activate/deactivate signals, and timelines (plain, numeric counter or
//! staggered sequence) are sampled once per host frame.
//!
//! The platform is reached only through the [`ViewportObserver`] and
//! [`FrameScheduler`] traits; adapters (wasm, tests) supply implementations.

pub mod config;
pub mod counter;
pub mod easing;
pub mod engine;
pub mod error;
pub mod frames;
pub mod ids;
pub mod inputs;
pub mod outputs;
pub mod sequencer;
pub mod timeline;
pub mod trigger;
pub mod value;
pub mod watcher;

// Re-exports for consumers (adapters)
pub use config::{
    AnimationConfig, CounterSpec, DriverSpec, MarginBias, RevealConfig, TriggerConfig, ValuesSpec,
    WatchSpec, MAX_DECIMALS,
};
pub use counter::{format_fixed, CounterFormat, CounterState, NumericCounter, COUNTER_PROPERTY};
pub use easing::Easing;
pub use engine::{Driver, ElementStatus, Engine, WatchedElement};
pub use error::{Result, RevealError};
pub use frames::{ContinuousFrames, FrameScheduler};
pub use ids::{ElementId, ElementKey, FrameToken, ObserverHandle};
pub use inputs::Inputs;
pub use outputs::{Change, Outputs, RevealEvent};
pub use sequencer::SequenceGroup;
pub use timeline::{Timeline, TimelineStatus};
pub use trigger::{Trigger, TriggerPolicy};
pub use value::{values, Property, ValueSet};
pub use watcher::{IntersectionEntry, ObserveOptions, ViewportObserver, VisibilityWatcher};
