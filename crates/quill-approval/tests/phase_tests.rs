use quill_approval::{allowed_transitions, validate_transition, ApprovalPhase};
use proptest::prelude::*;

fn any_phase() -> impl Strategy<Value = ApprovalPhase> {
    prop_oneof![
        Just(ApprovalPhase::Idle),
        Just(ApprovalPhase::AwaitingApproval),
        Just(ApprovalPhase::Approved),
        Just(ApprovalPhase::Rejected),
    ]
}

#[test]
fn test_idle_transitions() {
    assert!(validate_transition(ApprovalPhase::Idle, ApprovalPhase::AwaitingApproval).is_ok());
}

#[test]
fn test_resolved_phases_return_to_idle() {
    for phase in [ApprovalPhase::Approved, ApprovalPhase::Rejected] {
        assert_eq!(allowed_transitions(phase), vec![ApprovalPhase::Idle]);
    }
}

#[cfg(not(feature = "strict-debug"))]
#[test]
fn test_idle_cannot_resolve() {
    assert!(validate_transition(ApprovalPhase::Idle, ApprovalPhase::Approved).is_err());
    assert!(validate_transition(ApprovalPhase::Idle, ApprovalPhase::Rejected).is_err());
    assert!(validate_transition(ApprovalPhase::Idle, ApprovalPhase::Idle).is_err());
}

#[cfg(not(feature = "strict-debug"))]
proptest! {
    #[test]
    fn prop_validation_matches_allowed(from in any_phase(), to in any_phase()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);

        prop_assert_eq!(res.is_ok(), allowed.contains(&to));
    }

    #[test]
    fn prop_only_awaiting_resolves(from in any_phase()) {
        let resolves = allowed_transitions(from)
            .into_iter()
            .any(ApprovalPhase::is_resolved);
        prop_assert_eq!(resolves, from == ApprovalPhase::AwaitingApproval);
    }
}
