//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`NotFound`] thrown when a purchase references records that do not exist.
//! - [`InsufficientFunds`] thrown when a member cannot pay for a mask.
//! - [`KeyNotFound`] thrown when a single looked-up item is missing.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`KeyNotFound`]: EngineError::KeyNotFound
use std::fmt;

use sea_orm::DbErr;
use thiserror::Error;

use crate::Money;

/// A reference named by a request that has no row behind it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingRef {
    Member(i64),
    Pharmacy(i64),
    Mask(i64),
}

impl MissingRef {
    /// Name of the request field carrying the reference.
    pub fn field(self) -> &'static str {
        match self {
            Self::Member(_) => "user_id",
            Self::Pharmacy(_) => "pharmacy_id",
            Self::Mask(_) => "mask_id",
        }
    }
}

impl fmt::Display for MissingRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member(id) => write!(f, "member {id}"),
            Self::Pharmacy(id) => write!(f, "pharmacy {id}"),
            Self::Mask(id) => write!(f, "mask {id}"),
        }
    }
}

fn join_refs(refs: &[MissingRef]) -> String {
    refs.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("not found: {}", join_refs(.0))]
    NotFound(Vec<MissingRef>),
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Money, available: Money },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Import failed: {0}")]
    Import(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (
                Self::InsufficientFunds {
                    required: r1,
                    available: a1,
                },
                Self::InsufficientFunds {
                    required: r2,
                    available: a2,
                },
            ) => r1 == r2 && a1 == a2,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::Import(a), Self::Import(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
