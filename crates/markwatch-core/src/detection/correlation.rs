use super::machine::Transition;
use crate::event::DetectionEvent;
use serde::{Deserialize, Serialize};

/// Turns the disappearance of the hold marker into an adverse event,
/// but only after the marker was actually seen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrelationRule {
    hold_marker: Option<String>,
    armed: bool,
}

impl CorrelationRule {
    /// `None` leaves the rule permanently inactive.
    pub fn new(hold_marker: Option<String>) -> Self {
        Self {
            hold_marker,
            armed: false,
        }
    }

    pub fn hold_marker(&self) -> Option<&str> {
        self.hold_marker.as_deref()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_hold(&self, marker: &str) -> bool {
        self.hold_marker.as_deref() == Some(marker)
    }

    /// Feed one transition of `marker`. Transitions of other markers are ignored.
    pub fn observe(&mut self, marker: &str, transition: Transition) -> Option<DetectionEvent> {
        if !self.is_hold(marker) {
            return None;
        }

        match transition {
            Transition::Appeared => {
                self.armed = true;
                Some(DetectionEvent::Armed {
                    marker: marker.to_string(),
                })
            }
            Transition::Disappeared if self.armed => {
                self.armed = false;
                Some(DetectionEvent::Adverse {
                    marker: marker.to_string(),
                })
            }
            _ => None,
        }
    }
}
