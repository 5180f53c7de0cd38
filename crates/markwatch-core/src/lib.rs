//! Debounced marker state tracking.
//!
//! Turns per-frame accept/reject observations into edge-triggered
//! appearance events, plus the hold-marker correlation rule.

pub mod detection;
pub mod event;
pub mod tracker;

pub use detection::{CorrelationRule, DetectionStateMachine, MarkerPhase, Transition};
pub use event::DetectionEvent;
pub use tracker::{MarkerState, MarkerTracker, Observation};
