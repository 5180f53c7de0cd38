// tests/core_tests.rs
use markwatch_core::{DetectionEvent, MarkerTracker, Observation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn observe(tracker: &mut MarkerTracker, marker: &str, accepted: bool) -> Vec<DetectionEvent> {
    let observation = if accepted {
        Observation::accepted(marker)
    } else {
        Observation::rejected(marker)
    };
    tracker.apply(&[observation])
}

/// Number of maximal runs of `true` in the sequence
fn runs(sequence: &[bool]) -> usize {
    sequence
        .iter()
        .enumerate()
        .filter(|&(i, &hit)| hit && (i == 0 || !sequence[i - 1]))
        .count()
}

#[test]
fn test_one_appearance_per_run() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let len = rng.gen_range(1..200);
        let sequence: Vec<bool> = (0..len).map(|_| rng.gen_bool(0.4)).collect();

        let mut tracker = MarkerTracker::new(["bell"], None);
        let events: Vec<DetectionEvent> = sequence
            .iter()
            .flat_map(|&hit| observe(&mut tracker, "bell", hit))
            .collect();

        let appeared = events
            .iter()
            .filter(|e| matches!(e, DetectionEvent::Appeared { .. }))
            .count();
        assert_eq!(appeared, runs(&sequence), "sequence {:?}", sequence);

        // Edges alternate, starting with an appearance
        for (i, event) in events.iter().enumerate() {
            let expect_appeared = i % 2 == 0;
            assert_eq!(matches!(event, DetectionEvent::Appeared { .. }), expect_appeared);
        }

        assert_eq!(tracker.is_active("bell"), sequence.last() == Some(&true));
    }
}

#[test]
fn test_adverse_once_per_arming() {
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..50 {
        let len = rng.gen_range(1..200);
        let sequence: Vec<bool> = (0..len).map(|_| rng.gen_bool(0.5)).collect();

        let mut tracker = MarkerTracker::new(["bell", "shield"], Some("shield".into()));
        let mut armed = 0;
        let mut adverse = 0;

        for &hit in &sequence {
            for event in observe(&mut tracker, "shield", hit) {
                match event {
                    DetectionEvent::Armed { .. } => {
                        assert_eq!(armed, adverse, "armed twice without an adverse event");
                        armed += 1;
                    }
                    DetectionEvent::Adverse { .. } => {
                        adverse += 1;
                        assert_eq!(armed, adverse, "adverse event without arming");
                    }
                    DetectionEvent::Appeared { .. } => panic!("hold marker raised an appearance"),
                    DetectionEvent::Disappeared { .. } => {}
                }
            }
        }

        let completed = runs(&sequence) - usize::from(sequence.last() == Some(&true));
        assert_eq!(armed, runs(&sequence));
        assert_eq!(adverse, completed);
        assert_eq!(tracker.correlation().is_armed(), armed > adverse);
    }
}

#[test]
fn test_other_markers_never_trigger_adverse() {
    let mut tracker = MarkerTracker::new(["bell", "shield"], Some("shield".into()));

    for hit in [true, false, true, false] {
        let events = observe(&mut tracker, "bell", hit);
        assert!(events.iter().all(|e| !matches!(e, DetectionEvent::Adverse { .. })));
    }
    assert!(!tracker.correlation().is_armed());
}

#[test]
fn test_failed_frames_close_every_run() {
    let mut tracker = MarkerTracker::new(["bell", "chest", "shield"], Some("shield".into()));
    tracker.apply(&[
        Observation::accepted("bell"),
        Observation::rejected("chest"),
        Observation::accepted("shield"),
    ]);

    let events = tracker.miss_all();
    assert_eq!(
        events,
        vec![
            DetectionEvent::Disappeared { marker: "bell".into() },
            DetectionEvent::Disappeared { marker: "shield".into() },
            DetectionEvent::Adverse { marker: "shield".into() },
        ]
    );
    assert!(tracker.states().iter().all(|s| !s.is_active()));

    // A second failure changes nothing
    assert!(tracker.miss_all().is_empty());
}
