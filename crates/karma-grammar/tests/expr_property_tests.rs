use karma_grammar::{parse_message, Direction};
use proptest::prelude::*;

fn term() -> impl Strategy<Value = String> {
    // Tokens the grammar treats as a bare operand (no whitespace, quotes
    // or operator characters).
    proptest::string::string_regex("[a-zA-Z0-9_.][a-zA-Z0-9_.]{0,11}").unwrap()
}

proptest! {
    // The scanner consumes unmatched text one character at a time, so it
    // must accept *every* input without erroring or panicking.
    #[test]
    fn total_over_arbitrary_input(message in ".{0,160}") {
        let _ = parse_message(&message).expect("scanner is total");
    }

    #[test]
    fn single_expression_round_trips(t in term(), run in 2usize..8) {
        let message = format!("{}{}", t, "+".repeat(run));
        let changes = parse_message(&message).expect("parse");
        prop_assert_eq!(changes.len(), 1);
        prop_assert_eq!(changes[0].term.as_str(), t.as_str());
        let expected = if run == 2 { 1 } else { run as u32 };
        prop_assert_eq!(changes[0].direction, Direction::Up(expected));
    }

    #[test]
    fn surrounding_noise_does_not_change_the_event(t in term()) {
        let message = format!("well {}++ indeed", t);
        let changes = parse_message(&message).expect("parse");
        prop_assert_eq!(changes.len(), 1);
        prop_assert_eq!(changes[0].direction, Direction::Up(1));
    }
}
