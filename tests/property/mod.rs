//! Property-based tests
//!
//! Uses proptest to generate random inputs and verify invariants

mod envelope_proptest;
mod ids_proptest;
#[cfg(feature = "ssr")]
mod settlement_proptest;
#[cfg(feature = "ssr")]
mod topics_proptest;
