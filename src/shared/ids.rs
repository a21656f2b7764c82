//! Time-ordered identifiers
//!
//! Rooms and push subscriptions use 128-bit ids made of a 48-bit millisecond
//! timestamp followed by 80 bits of entropy that increase monotonically
//! within the same millisecond. They are stored as `UUID` and rendered in the
//! canonical hyphenated form.

use std::sync::Mutex;
use std::sync::OnceLock;

use ulid::{Generator, Ulid};
use uuid::Uuid;

use super::error::SharedError;

fn generator() -> &'static Mutex<Generator> {
    static GENERATOR: OnceLock<Mutex<Generator>> = OnceLock::new();
    GENERATOR.get_or_init(|| Mutex::new(Generator::new()))
}

/// Generate a new time-ordered id
///
/// Ids generated in the same millisecond are strictly increasing. If the
/// entropy space for the current millisecond overflows, a fresh random id is
/// used instead.
pub fn new_time_ordered_id() -> Uuid {
    let ulid = match generator().lock() {
        Ok(mut gen) => gen.generate().unwrap_or_else(|_| Ulid::new()),
        Err(poisoned) => poisoned.into_inner().generate().unwrap_or_else(|_| Ulid::new()),
    };
    Uuid::from_u128(ulid.0)
}

/// Parse the canonical hyphenated form back into an id
pub fn parse_id(text: &str) -> Result<Uuid, SharedError> {
    Uuid::parse_str(text).map_err(|e| SharedError::validation("id", e.to_string()))
}

/// Millisecond timestamp encoded in a time-ordered id
pub fn timestamp_ms(id: &Uuid) -> u64 {
    Ulid(id.as_u128()).timestamp_ms()
}
