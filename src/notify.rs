//! User-facing alerts

use markwatch_core::DetectionEvent;
use std::io::Write;

/// Receives every surfaced event; decides itself which ones warrant an alert
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &DetectionEvent);
}

impl<F> Notifier for F
where
    F: Fn(&DetectionEvent) + Send + Sync,
{
    fn notify(&self, event: &DetectionEvent) {
        self(event)
    }
}

/// Prints alerts to stdout and rings the terminal bell
pub struct ConsoleNotifier {
    bell: bool,
}

impl ConsoleNotifier {
    pub fn new(bell: bool) -> Self {
        Self { bell }
    }

    fn message(event: &DetectionEvent) -> Option<String> {
        if !event.is_alert() {
            return None;
        }
        Some(match event {
            DetectionEvent::Adverse { marker } => {
                format!("ALERT: {} is gone. You are under attack!", marker)
            }
            other => format!("Marker detected: {}", other.marker()),
        })
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, event: &DetectionEvent) {
        let Some(message) = Self::message(event) else {
            return;
        };

        let mut stdout = std::io::stdout().lock();
        let bell = if self.bell { "\x07" } else { "" };
        // A closed stdout must not take the pipeline down
        let _ = writeln!(stdout, "{}{}", bell, message);
        let _ = stdout.flush();
    }
}
