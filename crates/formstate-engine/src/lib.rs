//! Formstate Engine - Field state reconciliation
//!
//! This crate implements the field state engine:
//! - Dirty tracking against the current snapshot
//! - Five-stage derivation pipeline
//! - Value externalization and hide/show value retention
//! - Rules/required synchronization
//! - Array-list item tagging
//! - Lazy re-derivation of externally-sourced values on read

pub mod property;
pub mod dirty;
pub mod mutation;
pub mod tags;
pub mod field;
pub mod store;
pub mod bridge;
pub mod reconcile;
pub mod model;

pub use property::*;
pub use dirty::*;
pub use mutation::*;
pub use tags::*;
pub use field::*;
pub use store::*;
pub use bridge::*;
pub use reconcile::*;
pub use model::*;
