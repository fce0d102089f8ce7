//! Property-based tests for the input cursor.
//!
//! These tests use proptest to verify cursor invariants hold across
//! randomly generated token sequences.

use proptest::prelude::*;

use cmdgraph_core::input::{Input, UNBOUNDED};

/// Strategy for generating argument tokens, including empty ones.
fn token() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _./-]{0,12}"
}

fn tokens() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(token(), 0..20)
}

proptest! {
    #[test]
    fn pop_until_exhausted_yields_original_order(args in tokens()) {
        let mut input = Input::parse_args(&args);
        let mut popped = Vec::new();
        while let Some(value) = input.pop() {
            popped.push(value);
        }
        prop_assert_eq!(popped, args);
        prop_assert!(input.fully_processed());
    }

    #[test]
    fn snapshot_is_idempotent(args in tokens(), consumed in 0usize..5) {
        let mut input = Input::parse_args(&args);
        for _ in 0..consumed {
            input.pop();
        }
        let id = input.snapshot();
        let first = input.get_snapshot(id);
        prop_assert_eq!(&first, &input.get_snapshot(id));
        prop_assert_eq!(first, input.remaining());
    }

    #[test]
    fn unbounded_pop_n_empties_input(args in tokens(), required in 0usize..5) {
        let mut input = Input::parse_args(&args);
        let (values, enough) = input.pop_n(required, UNBOUNDED, None);
        let values: Vec<String> = values.into_iter().map(|value| value.clone()).collect();

        prop_assert_eq!(enough, args.len() >= required);
        prop_assert_eq!(values, args);
        prop_assert!(input.fully_processed());
    }

    #[test]
    fn push_front_then_pop_n_returns_pushed(
        args in tokens(),
        consumed in 0usize..5,
        first in token(),
        second in token(),
    ) {
        let mut input = Input::parse_args(&args);
        for _ in 0..consumed {
            input.pop();
        }
        let rest = input.remaining();

        input.push_front([first.clone(), second.clone()]);
        let (values, enough) = input.pop_n(2, 0, None);
        let values: Vec<String> = values.into_iter().map(|value| value.clone()).collect();

        prop_assert!(enough);
        prop_assert_eq!(values, vec![first, second]);
        prop_assert_eq!(input.remaining(), rest);
    }

    #[test]
    fn snapshot_survives_push_front(args in tokens(), pushed in tokens()) {
        let mut input = Input::parse_args(&args);
        let id = input.snapshot();
        input.push_front(pushed.clone());

        prop_assert_eq!(input.get_snapshot(id), args.clone());
        let mut expected = pushed;
        expected.extend(args);
        prop_assert_eq!(input.remaining(), expected);
    }
}
