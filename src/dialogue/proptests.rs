//! Property-based tests for the dialogue phase tracker
//!
//! These tests verify key invariants hold across arbitrary append sequences.

use super::*;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::User),
        Just(Role::AiClient),
        Just(Role::UtteranceAssistant),
        Just(Role::PhaseController),
    ]
}

fn arb_append() -> impl Strategy<Value = (Role, String, String)> {
    (arb_role(), "[a-z_]{1,12}", "[a-zA-Z ,.?]{0,40}")
}

fn arb_appends(max: usize) -> impl Strategy<Value = Vec<(Role, String, String)>> {
    proptest::collection::vec(arb_append(), 0..max)
}

// ============================================================================
// Invariants
// ============================================================================

proptest! {
    /// The phase index never goes backwards
    #[test]
    fn prop_phase_index_non_decreasing(
        max_turns in 1u32..7,
        appends in arb_appends(40),
    ) {
        let mut dialogue = Dialogue::with_policy(TurnPolicy::with_max_turns(max_turns));
        let mut last = dialogue.phase_index();

        for (role, subtype, text) in appends {
            let _ = dialogue.append(role, subtype, text);
            let index = dialogue.phase_index();
            prop_assert!(index >= last);
            last = index;
        }

        let stamped: Vec<Phase> = dialogue.entries().iter().map(|e| e.phase).collect();
        prop_assert!(stamped.windows(2).all(|w| w[0] <= w[1]));
    }

    /// Completion flag matches the index being past the last phase
    #[test]
    fn prop_completed_iff_past_last_phase(
        max_turns in 1u32..5,
        appends in arb_appends(30),
    ) {
        let mut dialogue = Dialogue::with_policy(TurnPolicy::with_max_turns(max_turns));
        for (role, subtype, text) in appends {
            let _ = dialogue.append(role, subtype, text);
            prop_assert_eq!(dialogue.is_completed(), dialogue.phase_index() >= Phase::COUNT);
        }
    }

    /// A completed dialogue rejects appends and stays unchanged
    #[test]
    fn prop_completed_rejects_appends(
        max_turns in 1u32..4,
        extra in arb_appends(10),
    ) {
        let mut dialogue = Dialogue::with_policy(TurnPolicy::with_max_turns(max_turns));
        while !dialogue.is_completed() {
            dialogue.append(Role::User, "fill", "fill").unwrap();
        }
        let total = usize::try_from(max_turns).unwrap() * Phase::COUNT;
        prop_assert_eq!(dialogue.entries().len(), total);

        let before = dialogue.clone();
        for (role, subtype, text) in extra {
            prop_assert_eq!(dialogue.append(role, subtype, text), Err(DialogueError::Completed));
        }
        prop_assert_eq!(dialogue, before);
    }

    /// Exactly N appends in a phase advance it once, and the next entry
    /// carries the new phase
    #[test]
    fn prop_threshold_advances_exactly_once(
        max_turns in 2u32..8,
        start in 0usize..3,
    ) {
        let mut dialogue = Dialogue::with_policy(TurnPolicy::with_max_turns(max_turns));
        for _ in 0..start {
            dialogue.advance();
        }
        let phase = dialogue.current_phase();

        for i in 0..max_turns {
            prop_assert_eq!(dialogue.current_phase(), phase, "advanced early at turn {}", i);
            dialogue.append(Role::AiClient, "client", "...").unwrap();
        }

        let next = phase.next().unwrap();
        prop_assert_eq!(dialogue.current_phase(), next);
        let entry = dialogue.append(Role::User, "reflection", "...").unwrap();
        prop_assert_eq!(entry.phase, next);
    }

    /// The user-visible view is an order-preserving filter of the log
    #[test]
    fn prop_user_conversation_is_ordered_filter(appends in arb_appends(25)) {
        let mut dialogue = Dialogue::new();
        for (role, subtype, text) in appends {
            let _ = dialogue.append(role, subtype, text);
        }

        let expected: Vec<&Utterance> = dialogue
            .entries()
            .iter()
            .filter(|e| matches!(e.role, Role::User | Role::AiClient))
            .collect();
        let visible: Vec<&Utterance> = dialogue.user_conversation().collect();
        prop_assert_eq!(visible, expected);
    }
}
