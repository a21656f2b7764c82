//! Property-based tests for time-ordered identifiers

use proptest::prelude::*;

use justjio::shared::ids::{new_time_ordered_id, parse_id, timestamp_ms};

proptest! {
    #[test]
    fn test_batches_are_strictly_increasing(count in 2usize..500) {
        let ids: Vec<_> = (0..count).map(|_| new_time_ordered_id()).collect();
        for pair in ids.windows(2) {
            prop_assert!(pair[0] < pair[1]);
            prop_assert!(timestamp_ms(&pair[0]) <= timestamp_ms(&pair[1]));
        }
    }

    #[test]
    fn test_parse_accepts_canonical_form(_seed in any::<u8>()) {
        let id = new_time_ordered_id();
        prop_assert_eq!(parse_id(&id.hyphenated().to_string()).unwrap(), id);
    }

    #[test]
    fn test_parse_rejects_garbage(text in "[g-z ]{1,40}") {
        prop_assert!(parse_id(&text).is_err());
    }
}
