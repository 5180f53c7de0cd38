//! Explicit per-marker state owned by one pipeline instance

use crate::detection::{CorrelationRule, DetectionStateMachine, MarkerPhase, Transition};
use crate::event::DetectionEvent;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Debounced visibility of one named marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerState {
    pub marker: String,
    pub phase: MarkerPhase,
}

impl MarkerState {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            phase: MarkerPhase::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == MarkerPhase::Active
    }
}

/// Verified result for one marker in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation<'a> {
    pub marker: &'a str,
    pub accepted: bool,
}

impl<'a> Observation<'a> {
    pub fn accepted(marker: &'a str) -> Self {
        Self {
            marker,
            accepted: true,
        }
    }

    pub fn rejected(marker: &'a str) -> Self {
        Self {
            marker,
            accepted: false,
        }
    }
}

/// All marker states of a pipeline plus the correlation rule layered on top.
#[derive(Debug, Clone)]
pub struct MarkerTracker {
    states: Vec<MarkerState>,
    correlation: CorrelationRule,
}

impl MarkerTracker {
    pub fn new<I, S>(markers: I, hold_marker: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut states: Vec<MarkerState> = Vec::new();
        for marker in markers {
            let marker = marker.into();
            if !states.iter().any(|s| s.marker == marker) {
                states.push(MarkerState::new(marker));
            }
        }

        Self {
            states,
            correlation: CorrelationRule::new(hold_marker),
        }
    }

    pub fn states(&self) -> &[MarkerState] {
        &self.states
    }

    pub fn state(&self, marker: &str) -> Option<&MarkerState> {
        self.states.iter().find(|s| s.marker == marker)
    }

    pub fn is_active(&self, marker: &str) -> bool {
        self.state(marker).is_some_and(MarkerState::is_active)
    }

    pub fn correlation(&self) -> &CorrelationRule {
        &self.correlation
    }

    /// Feed one frame's observations and collect the resulting events,
    /// in observation order.
    pub fn apply(&mut self, observations: &[Observation<'_>]) -> Vec<DetectionEvent> {
        let mut events = Vec::new();

        for observation in observations {
            let Some(state) = self
                .states
                .iter_mut()
                .find(|s| s.marker == observation.marker)
            else {
                warn!(marker = observation.marker, "observation for unknown marker");
                continue;
            };

            let transition = DetectionStateMachine::step(&mut state.phase, observation.accepted);
            let marker = state.marker.as_str();

            if transition == Transition::Held {
                debug!(marker, "hold");
            }

            let is_hold = self.correlation.is_hold(marker);
            match transition {
                Transition::Appeared if !is_hold => events.push(DetectionEvent::Appeared {
                    marker: marker.to_string(),
                }),
                Transition::Disappeared => events.push(DetectionEvent::Disappeared {
                    marker: marker.to_string(),
                }),
                _ => {}
            }

            if let Some(event) = self.correlation.observe(marker, transition) {
                events.push(event);
            }
        }

        events
    }

    /// Treat every marker as missing, e.g. when the frame could not be read.
    pub fn miss_all(&mut self) -> Vec<DetectionEvent> {
        let names: Vec<String> = self.states.iter().map(|s| s.marker.clone()).collect();
        let observations: Vec<Observation<'_>> =
            names.iter().map(|name| Observation::rejected(name)).collect();
        self.apply(&observations)
    }
}
