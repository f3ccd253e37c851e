//! Property-based tests for the identifier codec and validation.
//!
//! Properties:
//! - Every key accepted by `check_key` survives encode → decode
//! - Encoded keys are valid TaskJuggler identifiers
//! - Distinct accepted keys never share an identifier
//! - Validation is idempotent

use proptest::prelude::*;
use schedule_juggler::ident::{check_key, decode, encode, is_identifier};
use schedule_juggler::models::{Effort, Node};
use schedule_juggler::validation::{validate_tasks, ValidationRules};

/// Keys built from the characters external sources actually use.
fn arb_key() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 -]{1,16}"
}

/// Keys that may contain underscores; filtered through `check_key`.
fn arb_underscored_key() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_ -]{1,16}"
}

proptest! {
    #[test]
    fn prop_round_trip(key in arb_key()) {
        prop_assert!(check_key(&key).is_ok());
        prop_assert_eq!(decode(&encode(&key)), key);
    }

    #[test]
    fn prop_numeric_round_trip(n in any::<u64>()) {
        let key = n.to_string();
        prop_assert!(encode(&key).starts_with("_n_"));
        prop_assert_eq!(decode(&encode(&key)), key);
    }

    #[test]
    fn prop_encoded_is_identifier(key in arb_key()) {
        prop_assert!(is_identifier(&encode(&key)));
    }

    #[test]
    fn prop_accepted_keys_round_trip(key in arb_underscored_key()) {
        prop_assume!(check_key(&key).is_ok());
        prop_assert_eq!(decode(&encode(&key)), key);
    }

    #[test]
    fn prop_accepted_keys_are_injective(a in arb_underscored_key(), b in arb_underscored_key()) {
        prop_assume!(a != b);
        prop_assume!(check_key(&a).is_ok() && check_key(&b).is_ok());
        prop_assert_ne!(encode(&a), encode(&b));
    }

    #[test]
    fn prop_validation_idempotent(
        deps in prop::collection::vec(prop::collection::vec(0usize..8, 0..4), 1..6),
        efforts in prop::collection::vec(0u32..3, 6),
        correct in any::<bool>(),
    ) {
        let mut tasks: Vec<Node> = deps
            .iter()
            .enumerate()
            .map(|(i, d)| {
                Node::task(format!("T{i}"))
                    .with_effort(Effort::hours(efforts[i]))
                    .with_depends(d.iter().map(|j| format!("T{j}")))
            })
            .collect();
        let rules = ValidationRules::default().with_effort_correction(correct);

        validate_tasks(&mut tasks, &rules);
        let once = tasks.clone();
        let second = validate_tasks(&mut tasks, &rules);

        prop_assert_eq!(&tasks, &once);
        prop_assert_eq!(second.corrections(), 0);
    }
}
