use serde::{Deserialize, Serialize};

/// Discrete event surfaced by a tracker after one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionEvent {
    /// An ordinary marker became visible.
    Appeared { marker: String },
    /// The hold marker became visible; internal only, arms the correlation rule.
    Armed { marker: String },
    /// A previously visible marker is gone.
    Disappeared { marker: String },
    /// The hold marker vanished after having been seen.
    Adverse { marker: String },
}

impl DetectionEvent {
    pub fn marker(&self) -> &str {
        match self {
            DetectionEvent::Appeared { marker }
            | DetectionEvent::Armed { marker }
            | DetectionEvent::Disappeared { marker }
            | DetectionEvent::Adverse { marker } => marker,
        }
    }

    /// Events that should reach the user as an alert.
    pub fn is_alert(&self) -> bool {
        matches!(
            self,
            DetectionEvent::Appeared { .. } | DetectionEvent::Adverse { .. }
        )
    }

    /// Events whose frame should be written to the hit archive.
    pub fn is_archived(&self) -> bool {
        matches!(self, DetectionEvent::Appeared { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_and_archive_flags() {
        let appeared = DetectionEvent::Appeared { marker: "bell".into() };
        let armed = DetectionEvent::Armed { marker: "shield".into() };
        let adverse = DetectionEvent::Adverse { marker: "shield".into() };
        let gone = DetectionEvent::Disappeared { marker: "bell".into() };

        assert!(appeared.is_alert() && appeared.is_archived());
        assert!(!armed.is_alert() && !armed.is_archived());
        assert!(adverse.is_alert() && !adverse.is_archived());
        assert!(!gone.is_alert());
        assert_eq!(adverse.marker(), "shield");
    }
}
