//! Formstate Core - Leaf types for field-state reconciliation
//!
//! This crate defines the types shared by the engine and its collaborators:
//! - Field values with an explicit unset state
//! - Strict and deep comparison
//! - Validation rule records
//! - Message channel normalization
//! - Form-level editability sources

pub mod value;
pub mod rule;
pub mod message;
pub mod editable;
pub mod error;

pub use value::*;
pub use rule::*;
pub use message::*;
pub use editable::*;
pub use error::*;
