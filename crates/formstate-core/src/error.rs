//! Error types for formstate
//!
//! The reconciliation engine itself never fails; only parsing loose input
//! (mutations and configuration from JSON) can.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormStateError {
    #[error("Invalid mutation: {0}")]
    InvalidMutation(#[source] serde_json::Error),

    #[error("Invalid field config: {0}")]
    InvalidConfig(#[source] serde_json::Error),
}

/// Result type for formstate operations
pub type FormStateResult<T> = Result<T, FormStateError>;
