//! Data store boundary.
//!
//! Services depend on the traits here, never on a concrete backend. Two
//! backends are provided: an in-memory store for tests and single-process
//! use, and a Postgres store for multi-instance deployments.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{InMemoryStore, InMemoryTransaction};
pub use postgres::{PostgresStore, PostgresTransaction};
pub use r#trait::{
    InventoryStore, SalesTotals, StoreError, StoreTransaction, TransactionCoordinator,
};

/// Roll back a failed unit of work. A rollback failure is logged and
/// swallowed; the caller sees the error that caused it.
pub(crate) async fn rollback_quietly<T: StoreTransaction>(tx: T) {
    if let Err(err) = tx.rollback().await {
        tracing::warn!(error = %err, "rollback failed");
    }
}
