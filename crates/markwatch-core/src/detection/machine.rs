use serde::{Deserialize, Serialize};

/// Debounced visibility of a single marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerPhase {
    #[default]
    Inactive,
    Active,
}

/// Outcome of feeding one observation into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Inactive -> Active.
    Appeared,
    /// Active -> Active.
    Held,
    /// Active -> Inactive.
    Disappeared,
    /// Inactive -> Inactive.
    Idle,
}

impl Transition {
    /// Whether the transition crossed an edge and therefore emits an event.
    pub fn is_edge(self) -> bool {
        matches!(self, Transition::Appeared | Transition::Disappeared)
    }
}

/// Two-state machine that emits only on edges.
///
/// The machine holds no state of its own; the phase lives in the caller's
/// `MarkerState` so that every pipeline owns its markers explicitly.
pub struct DetectionStateMachine;

impl DetectionStateMachine {
    pub fn step(phase: &mut MarkerPhase, accepted: bool) -> Transition {
        let (next, transition) = match (*phase, accepted) {
            (MarkerPhase::Inactive, true) => (MarkerPhase::Active, Transition::Appeared),
            (MarkerPhase::Active, true) => (MarkerPhase::Active, Transition::Held),
            (MarkerPhase::Active, false) => (MarkerPhase::Inactive, Transition::Disappeared),
            (MarkerPhase::Inactive, false) => (MarkerPhase::Inactive, Transition::Idle),
        };
        *phase = next;
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_only() {
        let mut phase = MarkerPhase::default();
        assert_eq!(DetectionStateMachine::step(&mut phase, false), Transition::Idle);
        assert_eq!(DetectionStateMachine::step(&mut phase, true), Transition::Appeared);
        assert_eq!(DetectionStateMachine::step(&mut phase, true), Transition::Held);
        assert_eq!(DetectionStateMachine::step(&mut phase, true), Transition::Held);
        assert_eq!(DetectionStateMachine::step(&mut phase, false), Transition::Disappeared);
        assert_eq!(DetectionStateMachine::step(&mut phase, false), Transition::Idle);
        assert_eq!(phase, MarkerPhase::Inactive);
    }

    #[test]
    fn test_one_appearance_per_run() {
        let pattern = [
            true, true, true, false, true, false, false, true, true, true, true, false,
        ];
        let mut phase = MarkerPhase::Inactive;
        let transitions: Vec<_> = pattern
            .iter()
            .map(|&accepted| DetectionStateMachine::step(&mut phase, accepted))
            .collect();

        let appeared = transitions.iter().filter(|t| **t == Transition::Appeared).count();
        let disappeared = transitions.iter().filter(|t| **t == Transition::Disappeared).count();
        assert_eq!(appeared, 3);
        assert_eq!(disappeared, 3);

        // Edges alternate, starting with an appearance
        let edges: Vec<_> = transitions.into_iter().filter(|t| t.is_edge()).collect();
        for (i, edge) in edges.iter().enumerate() {
            let expected = if i % 2 == 0 { Transition::Appeared } else { Transition::Disappeared };
            assert_eq!(*edge, expected);
        }
    }
}
