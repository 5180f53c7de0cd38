//! Pipeline driver
//!
//! One `Pipeline` watches one frame source. Two guards sit in front of every
//! pass: a rate limit (at most one pass per period) and a non-blocking lock
//! (a frame arriving while a pass runs is dropped, never queued). Both are
//! checked before the frame is acquired, so dropped frames cost nothing.

use crate::archive::HitArchive;
use crate::notify::Notifier;
use crate::source::{CaptureError, FrameSource};
use chrono::Local;
use image::RgbImage;
use markwatch_core::{DetectionEvent, MarkerTracker};
use markwatch_cv::{FrameReport, MarkerDetector, MarkerReport};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Why a frame was not processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// Another pass is still running
    Busy,
    /// Less than one period since the last pass
    Throttled,
}

/// Frame counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub processed: u64,
    pub failed: u64,
    pub throttled: u64,
    pub busy: u64,
}

#[derive(Default)]
struct Counters {
    processed: AtomicU64,
    failed: AtomicU64,
    throttled: AtomicU64,
    busy: AtomicU64,
}

struct PipelineState {
    tracker: MarkerTracker,
    last_processed: Option<Instant>,
}

pub struct Pipeline {
    detector: MarkerDetector,
    archive: HitArchive,
    notifier: Box<dyn Notifier>,
    period: Duration,
    state: Mutex<PipelineState>,
    counters: Counters,
}

/// Exclusive right to process one frame
pub struct Pass<'a> {
    pipeline: &'a Pipeline,
    state: MutexGuard<'a, PipelineState>,
}

impl Pipeline {
    pub fn new(
        detector: MarkerDetector,
        archive: HitArchive,
        notifier: Box<dyn Notifier>,
        period: Duration,
    ) -> Self {
        let tracker = detector.tracker();
        Self {
            detector,
            archive,
            notifier,
            period,
            state: Mutex::new(PipelineState {
                tracker,
                last_processed: None,
            }),
            counters: Counters::default(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleep between attempts when the gate is closed
    pub fn poll_interval(&self) -> Duration {
        (self.period / 10).clamp(Duration::from_millis(5), Duration::from_millis(100))
    }

    /// Try to start a pass at `now`
    pub fn begin(&self, now: Instant) -> Result<Pass<'_>, Skip> {
        let mut state = match self.state.try_lock() {
            Ok(guard) => guard,
            // A panicked pass still leaves every marker in a valid phase
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                self.counters.busy.fetch_add(1, Ordering::Relaxed);
                return Err(Skip::Busy);
            }
        };

        if let Some(last) = state.last_processed {
            if now.saturating_duration_since(last) < self.period {
                self.counters.throttled.fetch_add(1, Ordering::Relaxed);
                return Err(Skip::Throttled);
            }
        }
        state.last_processed = Some(now);

        Ok(Pass {
            pipeline: self,
            state,
        })
    }

    /// Push-style entry point: acquire and process a frame if both guards allow
    pub fn offer<F>(&self, now: Instant, acquire: F) -> Result<Vec<DetectionEvent>, Skip>
    where
        F: FnOnce() -> anyhow::Result<RgbImage>,
    {
        let pass = self.begin(now)?;
        Ok(match acquire() {
            Ok(frame) => pass.process(&frame),
            Err(e) => {
                debug!(error = %e, "frame skipped");
                pass.process_failed()
            }
        })
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            processed: self.counters.processed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            throttled: self.counters.throttled.load(Ordering::Relaxed),
            busy: self.counters.busy.load(Ordering::Relaxed),
        }
    }

    fn dispatch(&self, events: &[DetectionEvent], frame: Option<(&RgbImage, &FrameReport)>) {
        for event in events {
            let marker = event.marker();
            match event {
                DetectionEvent::Armed { .. } => {
                    debug!(marker, "hold marker armed");
                    continue;
                }
                DetectionEvent::Disappeared { .. } => info!(marker, "gone"),
                DetectionEvent::Adverse { .. } => warn!(marker, "adverse event"),
                DetectionEvent::Appeared { .. } => {}
            }

            if event.is_archived() {
                let hit = frame.and_then(|(f, r)| r.get(marker).map(|r| (f, r)));
                if let Some((frame, report)) = hit {
                    self.archive_hit(frame, report);
                }
            }
            self.notifier.notify(event);
        }
    }

    /// Archival is best-effort and never undoes the transition
    fn archive_hit(&self, frame: &RgbImage, report: &MarkerReport) {
        let (ssim, hist) = report
            .verification
            .map(|v| (v.structural_similarity, v.histogram_correlation))
            .unwrap_or_default();
        info!(
            marker = %report.marker,
            score = format_args!("{:.3}", report.score().unwrap_or_default()),
            ssim = format_args!("{:.3}", ssim),
            hist = format_args!("{:.3}", hist),
            "hit"
        );

        match self.archive.store(report, frame, &Local::now()) {
            Ok(path) => info!(path = %path.display(), "saved"),
            Err(e) => debug!(
                marker = %report.marker,
                error = format_args!("{:#}", e),
                "archive failed"
            ),
        }
    }
}

impl Pass<'_> {
    /// Detect, update marker states, and surface the resulting events
    pub fn process(mut self, frame: &RgbImage) -> Vec<DetectionEvent> {
        let report = self.pipeline.detector.detect(frame);
        debug!(
            accepted = report.stats.accepted,
            elapsed_ms = report.stats.processing_time_ms,
            "frame processed"
        );

        let events = self.state.tracker.apply(&report.observations());
        self.pipeline.counters.processed.fetch_add(1, Ordering::Relaxed);
        self.pipeline.dispatch(&events, Some((frame, &report)));
        events
    }

    /// The frame could not be read: every marker counts as missing
    pub fn process_failed(mut self) -> Vec<DetectionEvent> {
        let events = self.state.tracker.miss_all();
        self.pipeline.counters.failed.fetch_add(1, Ordering::Relaxed);
        self.pipeline.dispatch(&events, None);
        events
    }
}

/// Pull frames from `source` until it closes
pub fn run<S: FrameSource>(pipeline: &Pipeline, source: &mut S) -> SessionStats {
    info!(
        source = %source.describe(),
        period_ms = pipeline.period().as_millis() as u64,
        "capture started"
    );
    let poll = pipeline.poll_interval();

    loop {
        let Ok(pass) = pipeline.begin(Instant::now()) else {
            thread::sleep(poll);
            continue;
        };

        match source.grab() {
            Ok(frame) => {
                pass.process(&frame);
            }
            Err(CaptureError::Frame(e)) => {
                debug!(error = %e, "frame skipped");
                pass.process_failed();
            }
            Err(CaptureError::Closed) => {
                info!("capture target closed, stopping");
                break;
            }
        }
    }

    pipeline.stats()
}
