//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::facts::MIN_QUERY_CHARS;
use super::*;
use crate::auth::hash_secret;
use crate::db::{Entry, User};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_context() -> ConvContext {
    ConvContext::new("alice")
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop_oneof![
        Just(ConvState::Idle),
        Just(ConvState::AwaitingRegisterSecret),
        Just(ConvState::AwaitingLoginSecret),
        Just(ConvState::AwaitingNewEntryText),
        Just(ConvState::AwaitingDeleteSelection),
        Just(ConvState::AwaitingAccountDeleteConfirmation),
        Just(ConvState::AwaitingSearchQuery),
        Just(ConvState::AwaitingEditSelection),
        Just(ConvState::AwaitingEditText),
    ]
}

fn arb_command() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Start),
        Just(Event::Register),
        Just(Event::Login),
        Just(Event::Add),
        Just(Event::Show),
        Just(Event::Search),
        Just(Event::Delete),
        Just(Event::DeleteAccount),
        Just(Event::Logout),
        Just(Event::Edit),
    ]
}

fn arb_guarded_command() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Add),
        Just(Event::Show),
        Just(Event::Search),
        Just(Event::Delete),
        Just(Event::DeleteAccount),
        Just(Event::Edit),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_command(),
        "[a-z0-9-]{8}".prop_map(|entry_id| Event::SelectEntry { entry_id }),
        Just(Event::SelectDeleteAll),
        Just(Event::ConfirmDeleteAll),
        Just(Event::ConfirmDeleteAccount),
        Just(Event::Cancel),
        "[a-z0-9-]{8}".prop_map(|entry_id| Event::SelectEdit { entry_id }),
        "[a-zA-Z ]{0,12}".prop_map(Event::text),
    ]
}

fn arb_entries() -> impl Strategy<Value = Vec<Entry>> {
    proptest::collection::vec("[a-zA-Z ]{1,40}", 0..4)
        .prop_map(|texts| texts.into_iter().map(|t| Entry::new("alice", t)).collect())
}

fn arb_facts() -> impl Strategy<Value = Facts> {
    (
        any::<bool>(),
        proptest::option::of("[a-z]{1,8}"),
        arb_entries(),
        arb_entries(),
    )
        .prop_map(|(session_active, secret, entries, matches)| Facts {
            session_active,
            account: secret.map(|s| User {
                user_id: "alice".to_string(),
                secret_hash: hash_secret("alice", &s),
            }),
            entries,
            matches,
        })
}

fn arb_scratch() -> impl Strategy<Value = Scratch> {
    proptest::option::of("[a-z0-9-]{8}").prop_map(|edit_target| Scratch { edit_target })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: Scratch never outlives the edit flow
    #[test]
    fn prop_scratch_only_in_edit_flow(
        events in proptest::collection::vec((arb_event(), arb_facts()), 0..20)
    ) {
        let mut state = ConvState::Idle;
        let mut scratch = Scratch::default();
        let ctx = test_context();

        for (event, facts) in events {
            if let Ok(result) = transition(state, &scratch, &ctx, &facts, event) {
                state = result.new_state;
                scratch = result.scratch;
                prop_assert!(
                    scratch.is_empty() || state == ConvState::AwaitingEditText,
                    "Scratch {:?} leaked into {:?}",
                    scratch,
                    state
                );
            }
        }
    }

    // Invariant 2: Transitions are deterministic
    #[test]
    fn prop_transition_is_deterministic(
        state in arb_state(),
        scratch in arb_scratch(),
        facts in arb_facts(),
        event in arb_event()
    ) {
        let ctx = test_context();
        let first = transition(state, &scratch, &ctx, &facts, event.clone());
        let second = transition(state, &scratch, &ctx, &facts, event);
        prop_assert_eq!(first, second);
    }

    // Invariant 3: Guarded commands never get past a closed session gate
    #[test]
    fn prop_guarded_commands_need_session(
        state in arb_state(),
        scratch in arb_scratch(),
        facts in arb_facts(),
        event in arb_guarded_command()
    ) {
        let facts = Facts { session_active: false, ..facts };
        let result = transition(state, &scratch, &test_context(), &facts, event).unwrap();
        prop_assert_eq!(result.new_state, ConvState::Idle);
        prop_assert_eq!(result.reply, Reply::Rejected(Rejection::NotAuthenticated));
        prop_assert!(result.effects.is_empty());
    }

    // Invariant 4: Commands are accepted from every state
    #[test]
    fn prop_commands_always_accepted(
        state in arb_state(),
        scratch in arb_scratch(),
        facts in arb_facts(),
        event in arb_command()
    ) {
        let result = transition(state, &scratch, &test_context(), &facts, event);
        prop_assert!(result.is_ok(), "Command rejected: {:?}", result);
    }

    // Invariant 5: Rejections never write
    #[test]
    fn prop_rejections_have_no_effects(
        state in arb_state(),
        scratch in arb_scratch(),
        facts in arb_facts(),
        event in arb_event()
    ) {
        if let Ok(result) = transition(state, &scratch, &test_context(), &facts, event) {
            if matches!(result.reply, Reply::Rejected(_)) {
                prop_assert!(result.effects.is_empty(), "Rejected with effects: {:?}", result.effects);
            }
        }
    }

    // Invariant 6: Short queries re-prompt and read nothing
    #[test]
    fn prop_short_query_reprompts(query in "[a-zA-Z ]{0,2}", facts in arb_facts()) {
        prop_assert!(query.trim().chars().count() < MIN_QUERY_CHARS);
        let event = Event::text(query);
        prop_assert!(Needs::for_event(ConvState::AwaitingSearchQuery, &event).is_empty());

        let result = transition(
            ConvState::AwaitingSearchQuery,
            &Scratch::default(),
            &test_context(),
            &facts,
            event,
        )
        .unwrap();
        prop_assert_eq!(result.new_state, ConvState::AwaitingSearchQuery);
        prop_assert_eq!(result.reply, Reply::Rejected(Rejection::QueryTooShort));
    }

    // Invariant 7: Search preserves match order and stays re-entrant
    #[test]
    fn prop_search_preserves_order(query in "[a-z]{3,8}", matches in arb_entries()) {
        let facts = Facts::default().with_matches(matches.clone());
        let result = transition(
            ConvState::AwaitingSearchQuery,
            &Scratch::default(),
            &test_context(),
            &facts,
            Event::text(query),
        )
        .unwrap();
        prop_assert_eq!(result.new_state, ConvState::AwaitingSearchQuery);
        match result.reply {
            Reply::Entries(listed) => {
                let texts: Vec<_> = listed.into_iter().map(|l| l.text).collect();
                let expected: Vec<_> = matches.into_iter().map(|e| e.text).collect();
                prop_assert_eq!(texts, expected);
            }
            Reply::NoMatch => prop_assert!(matches.is_empty()),
            other => prop_assert!(false, "Unexpected reply {:?}", other),
        }
    }

    // Invariant 8: Login succeeds iff the secret hashes to the stored value
    #[test]
    fn prop_login_iff_hash_matches(stored in "[a-z]{1,8}", attempt in "[a-z]{1,8}") {
        let facts = Facts::default().with_account(User {
            user_id: "alice".to_string(),
            secret_hash: hash_secret("alice", &stored),
        });
        let result = transition(
            ConvState::AwaitingLoginSecret,
            &Scratch::default(),
            &test_context(),
            &facts,
            Event::text(attempt.clone()),
        )
        .unwrap();
        let activated = result.effects == vec![Effect::ActivateSession];
        prop_assert_eq!(activated, stored == attempt);
        if !activated {
            prop_assert_eq!(result.new_state, ConvState::AwaitingLoginSecret);
        }
    }

    // Invariant 9: Only search and login retries loop; every other reply from a
    // non-menu state lands in Idle or the next step of its own flow
    #[test]
    fn prop_flows_collapse_to_idle(state in arb_state(), facts in arb_facts(), text in "[a-z]{3,8}") {
        let result = transition(state, &Scratch::editing("e1"), &test_context(), &facts, Event::text(text));
        if let Ok(result) = result {
            let looped = result.new_state == state;
            prop_assert!(
                result.new_state.is_idle()
                    || (looped && matches!(state, ConvState::AwaitingSearchQuery | ConvState::AwaitingLoginSecret)),
                "{:?} went to {:?}",
                state,
                result.new_state
            );
        }
    }
}
