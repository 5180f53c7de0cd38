//! Per-marker hysteresis and the hold-marker correlation rule

pub mod correlation;
pub mod machine;

pub use correlation::CorrelationRule;
pub use machine::{DetectionStateMachine, MarkerPhase, Transition};
