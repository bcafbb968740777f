//! Formstate Test Harness - Randomized validation of field reconciliation
//!
//! This crate provides:
//! - Seeded mutation fuzzing over many fields
//! - Snapshot invariant checks shared with the benches
//! - External drift simulation through a controlled store

pub mod fuzzer;

pub use fuzzer::*;
