//! The module contains the errors the engine can throw.
//!
//! - [`ValidationError`] malformed caller input (split rules, text fields).
//!   Surfaced as-is, never retried.
//! - [`EngineError`] everything an [`Engine`](crate::Engine) operation can
//!   fail with, validation included.
use sea_orm::DbErr;
use thiserror::Error;

use crate::MoneyCents;

/// Tagged validation failures for split and field input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("amount must be > 0")]
    NonPositiveAmount,
    #[error("at least one participant is required")]
    EmptyParticipants,
    #[error("participant listed more than once: {0}")]
    DuplicateParticipant(String),
    #[error("sum mismatch: shares sum to {actual}, expected {expected}")]
    SumMismatch {
        expected: MoneyCents,
        actual: MoneyCents,
    },
    #[error("amount {amount} is too small to split between {participants} participants")]
    AmountTooSmall {
        amount: MoneyCents,
        participants: usize,
    },
    #[error("amount {amount} exceeds the maximum of {max}")]
    AmountTooLarge { amount: MoneyCents, max: MoneyCents },
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ValidationError {
    pub(crate) fn field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
