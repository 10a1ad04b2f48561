//! Stock arithmetic.
//!
//! Stores apply these rules inside their atomic primitives; keeping them pure
//! lets every store agree on what "available" means.

use showroom_core::{DomainError, DomainResult};

/// Cars at or below this count show up as low stock on the dashboard.
pub const LOW_STOCK_THRESHOLD: u32 = 2;

/// Remove `by` units from `current`, refusing to go below zero.
pub fn checked_decrement(current: u32, by: u32) -> DomainResult<u32> {
    if by == 0 {
        return Err(DomainError::field("by", "must be at least 1"));
    }
    current.checked_sub(by).ok_or(DomainError::OutOfStock {
        requested: by,
        available: current,
    })
}

/// Add `by` units to `current`.
pub fn checked_increment(current: u32, by: u32) -> DomainResult<u32> {
    if by == 0 {
        return Err(DomainError::field("by", "must be at least 1"));
    }
    current
        .checked_add(by)
        .ok_or_else(|| DomainError::invariant("stock count overflow"))
}

pub fn is_low_stock(in_stock: u32) -> bool {
    in_stock <= LOW_STOCK_THRESHOLD
}
