//! Ledger error types

use thiserror::Error;

use crate::types::BloodType;

/// Errors returned by ledger commands. A failed command leaves the ledger unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Validation error on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Insufficient {blood_type} stock: requested {requested}, only {available} available")]
    InsufficientStock {
        blood_type: BloodType,
        requested: u32,
        available: u64,
    },
}

impl LedgerError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        LedgerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors raised while saving or loading ledger records
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Serialization error in {record}: {source}")]
    Serialization {
        record: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}
