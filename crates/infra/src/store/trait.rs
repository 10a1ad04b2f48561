use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use showroom_auth::StaffUser;
use showroom_core::{CarId, DomainError, SaleId};
use showroom_inventory::Car;
use showroom_sales::{NewSale, Sale, SaleRecord, SaleStatus};

/// Store operation error.
///
/// These are **infrastructure errors** as opposed to domain errors. Services
/// translate them into caller-facing kinds and log the detail carried here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("out of stock (requested {requested}, available {available})")]
    OutOfStock { requested: u32, available: u32 },

    /// Isolation violation or lock wait timeout. The whole operation may be retried.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("constraint violated: {0}")]
    Constraint(String),

    /// A unique value (a user's email or username, say) is already taken.
    #[error("{field} already exists")]
    Duplicate { field: &'static str },

    #[error("failed to decode row: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(entity) => StoreError::NotFound { entity },
            DomainError::OutOfStock {
                requested,
                available,
            } => StoreError::OutOfStock {
                requested,
                available,
            },
            DomainError::Conflict(msg) => StoreError::Conflict(msg),
            other => StoreError::Constraint(other.to_string()),
        }
    }
}

/// Aggregate over sales created since a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SalesTotals {
    pub count: u64,
    pub revenue: Decimal,
}

/// Non-transactional reads and writes.
///
/// Each call is atomic on its own; readers never observe a transaction's
/// effects partially.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn find_car_by_id(&self, id: CarId) -> Result<Option<Car>, StoreError>;

    async fn insert_car(&self, car: &Car) -> Result<(), StoreError>;

    /// Delete a car together with every sale referencing it.
    async fn delete_car(&self, id: CarId) -> Result<(), StoreError>;

    async fn insert_user(&self, user: &StaffUser) -> Result<(), StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<StaffUser>, StoreError>;

    async fn find_sale_record(&self, id: SaleId) -> Result<Option<SaleRecord>, StoreError>;

    /// All sales of one car, oldest first.
    async fn sales_for_car(&self, car_id: CarId) -> Result<Vec<Sale>, StoreError>;

    async fn count_cars(&self) -> Result<u64, StoreError>;

    /// Count and revenue of non-cancelled sales created at or after `since`.
    async fn sales_totals_since(&self, since: DateTime<Utc>) -> Result<SalesTotals, StoreError>;

    /// Cars at or below [`LOW_STOCK_THRESHOLD`](showroom_inventory::LOW_STOCK_THRESHOLD), scarcest first.
    async fn low_stock_cars(&self, limit: usize) -> Result<Vec<Car>, StoreError>;

    /// One page of sales of any status, newest first.
    async fn list_sales(&self, offset: u64, limit: usize) -> Result<Vec<SaleRecord>, StoreError>;

    async fn count_sales(&self) -> Result<u64, StoreError>;
}

/// Opens units of work.
#[async_trait]
pub trait TransactionCoordinator: Send + Sync {
    type Tx: StoreTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// A unit of work. Either every staged change becomes visible at `commit`, or
/// none does.
///
/// Rows touched through a transaction stay locked against other transactions
/// until it ends. Dropping an uncommitted transaction rolls it back.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Check-and-decrement as one step. Returns the new stock count.
    async fn decrement_if_available(&mut self, car_id: CarId, by: u32) -> Result<u32, StoreError>;

    /// Returns the new stock count.
    async fn increment_stock(&mut self, car_id: CarId, by: u32) -> Result<u32, StoreError>;

    /// Lock a car row for update and return its current state.
    async fn lock_car(&mut self, id: CarId) -> Result<Car, StoreError>;

    /// Write a locked car's catalogue fields. Stock and provenance are left as stored.
    async fn update_car_details(&mut self, car: &Car) -> Result<(), StoreError>;

    async fn insert_sale(&mut self, sale: NewSale) -> Result<Sale, StoreError>;

    /// Lock a sale row for update and return its current state.
    async fn lock_sale(&mut self, id: SaleId) -> Result<Sale, StoreError>;

    async fn set_sale_status(&mut self, id: SaleId, status: SaleStatus) -> Result<Sale, StoreError>;

    /// Read a sale with its summaries, including this transaction's own writes.
    async fn sale_record(&mut self, id: SaleId) -> Result<SaleRecord, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn find_car_by_id(&self, id: CarId) -> Result<Option<Car>, StoreError> {
        (**self).find_car_by_id(id).await
    }

    async fn insert_car(&self, car: &Car) -> Result<(), StoreError> {
        (**self).insert_car(car).await
    }

    async fn delete_car(&self, id: CarId) -> Result<(), StoreError> {
        (**self).delete_car(id).await
    }

    async fn insert_user(&self, user: &StaffUser) -> Result<(), StoreError> {
        (**self).insert_user(user).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<StaffUser>, StoreError> {
        (**self).find_user_by_email(email).await
    }

    async fn find_sale_record(&self, id: SaleId) -> Result<Option<SaleRecord>, StoreError> {
        (**self).find_sale_record(id).await
    }

    async fn sales_for_car(&self, car_id: CarId) -> Result<Vec<Sale>, StoreError> {
        (**self).sales_for_car(car_id).await
    }

    async fn count_cars(&self) -> Result<u64, StoreError> {
        (**self).count_cars().await
    }

    async fn sales_totals_since(&self, since: DateTime<Utc>) -> Result<SalesTotals, StoreError> {
        (**self).sales_totals_since(since).await
    }

    async fn low_stock_cars(&self, limit: usize) -> Result<Vec<Car>, StoreError> {
        (**self).low_stock_cars(limit).await
    }

    async fn list_sales(&self, offset: u64, limit: usize) -> Result<Vec<SaleRecord>, StoreError> {
        (**self).list_sales(offset, limit).await
    }

    async fn count_sales(&self) -> Result<u64, StoreError> {
        (**self).count_sales().await
    }
}

#[async_trait]
impl<S> TransactionCoordinator for Arc<S>
where
    S: TransactionCoordinator + ?Sized,
{
    type Tx = S::Tx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        (**self).begin().await
    }
}
