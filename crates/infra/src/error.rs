//! Caller-facing error model for the service layer.

use serde::Serialize;
use thiserror::Error;

use showroom_auth::AuthzError;
use showroom_core::{DomainError, FieldViolation};

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, SaleError>;

/// Stable, machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    OutOfStock,
    Conflict,
    StoreUnavailable,
    Forbidden,
    InvalidState,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::OutOfStock => "out_of_stock",
            ErrorKind::Conflict => "conflict",
            ErrorKind::StoreUnavailable => "store_unavailable",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InvalidState => "invalid_state",
        }
    }
}

/// Error returned by every service operation.
///
/// Messages are safe to show to callers. Store detail (SQL states, lock
/// names) is logged where the error is translated and never carried here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaleError {
    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("out of stock (requested {requested}, available {available})")]
    OutOfStock { requested: u32, available: u32 },

    #[error("the operation conflicted with a concurrent change; retry")]
    Conflict,

    #[error("the data store is temporarily unavailable; retry later")]
    StoreUnavailable,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl SaleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SaleError::Validation(_) => ErrorKind::Validation,
            SaleError::NotFound(_) => ErrorKind::NotFound,
            SaleError::OutOfStock { .. } => ErrorKind::OutOfStock,
            SaleError::Conflict => ErrorKind::Conflict,
            SaleError::StoreUnavailable => ErrorKind::StoreUnavailable,
            SaleError::Forbidden(_) => ErrorKind::Forbidden,
            SaleError::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    /// Whether repeating the whole operation may succeed without changing the input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SaleError::Conflict | SaleError::StoreUnavailable)
    }

    /// Offending fields, for validation failures.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            SaleError::Validation(v) => v,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<StoreError> for SaleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity } => SaleError::NotFound(entity),
            StoreError::OutOfStock {
                requested,
                available,
            } => SaleError::OutOfStock {
                requested,
                available,
            },
            StoreError::Conflict(detail) => {
                tracing::warn!(%detail, "store conflict");
                SaleError::Conflict
            }
            StoreError::Unavailable(detail) => {
                tracing::error!(%detail, "store unavailable");
                SaleError::StoreUnavailable
            }
            StoreError::Decode(detail) => {
                tracing::error!(%detail, "store returned an undecodable row");
                SaleError::StoreUnavailable
            }
            StoreError::Duplicate { field } => {
                SaleError::Validation(vec![FieldViolation::new(field, "already exists")])
            }
            StoreError::Constraint(detail) => {
                tracing::warn!(%detail, "store constraint rejected the change");
                SaleError::InvalidState("the change was rejected by a data constraint".to_string())
            }
        }
    }
}

impl From<DomainError> for SaleError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(v) => SaleError::Validation(v),
            DomainError::InvalidId(msg) => {
                SaleError::Validation(vec![FieldViolation::new("id", msg)])
            }
            DomainError::NotFound(entity) => SaleError::NotFound(entity),
            DomainError::OutOfStock {
                requested,
                available,
            } => SaleError::OutOfStock {
                requested,
                available,
            },
            DomainError::InvariantViolation(msg) => SaleError::InvalidState(msg),
            DomainError::Conflict(_) => SaleError::Conflict,
            DomainError::Unauthorized => SaleError::Forbidden("unauthorized".to_string()),
        }
    }
}

impl From<AuthzError> for SaleError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(permission) => SaleError::Forbidden(permission),
        }
    }
}
