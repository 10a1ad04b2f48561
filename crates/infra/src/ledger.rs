//! Inventory ledger: the only writer of car rows outside a sale.

use chrono::{DateTime, Utc};
use tracing::instrument;

use showroom_core::{CarId, DomainError};
use showroom_inventory::{Car, CarUpdate};

use crate::error::{SaleError, ServiceResult};
use crate::store::{
    rollback_quietly, InventoryStore, StoreTransaction, TransactionCoordinator,
};

/// Stock counts for cars, with atomic check-and-decrement.
///
/// Serialisation of concurrent changes to one car is delegated to the store's
/// transaction isolation; nothing here holds an in-process lock.
#[derive(Debug, Clone)]
pub struct InventoryLedger<S> {
    store: S,
}

impl<S> InventoryLedger<S>
where
    S: InventoryStore + TransactionCoordinator,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Current committed stock of a car.
    #[instrument(skip(self), fields(car_id = %car_id), err)]
    pub async fn stock_of(&self, car_id: CarId) -> ServiceResult<u32> {
        let car = self
            .store
            .find_car_by_id(car_id)
            .await?
            .ok_or(SaleError::NotFound("car"))?;
        Ok(car.in_stock)
    }

    /// Remove `by` units in one atomic step. Returns the remaining count.
    #[instrument(skip(self), fields(car_id = %car_id), err)]
    pub async fn decrement_stock(&self, car_id: CarId, by: u32) -> ServiceResult<u32> {
        require_quantity(by)?;

        let mut tx = self.store.begin().await?;
        match tx.decrement_if_available(car_id, by).await {
            Ok(remaining) => {
                tx.commit().await?;
                tracing::debug!(remaining, "stock decremented");
                Ok(remaining)
            }
            Err(err) => {
                rollback_quietly(tx).await;
                Err(err.into())
            }
        }
    }

    /// Add `by` units from a delivery or return. Returns the new count.
    #[instrument(skip(self), fields(car_id = %car_id), err)]
    pub async fn restock(&self, car_id: CarId, by: u32) -> ServiceResult<u32> {
        require_quantity(by)?;

        let mut tx = self.store.begin().await?;
        match tx.increment_stock(car_id, by).await {
            Ok(total) => {
                tx.commit().await?;
                tracing::info!(total, "car restocked");
                Ok(total)
            }
            Err(err) => {
                rollback_quietly(tx).await;
                Err(err.into())
            }
        }
    }

    /// Edit a car's catalogue fields under its row lock, so a concurrent sale
    /// or restock is never overwritten. Stock is never changed here.
    #[instrument(skip(self, update), fields(car_id = %car_id), err)]
    pub async fn update_car(
        &self,
        car_id: CarId,
        update: CarUpdate,
        now: DateTime<Utc>,
    ) -> ServiceResult<Car> {
        update.validate(now)?;

        let mut tx = self.store.begin().await?;
        match apply_update(&mut tx, car_id, update, now).await {
            Ok(car) => {
                tx.commit().await?;
                tracing::info!("car updated");
                Ok(car)
            }
            Err(err) => {
                rollback_quietly(tx).await;
                Err(err)
            }
        }
    }
}

async fn apply_update<T: StoreTransaction>(
    tx: &mut T,
    car_id: CarId,
    update: CarUpdate,
    now: DateTime<Utc>,
) -> ServiceResult<Car> {
    let mut car = tx.lock_car(car_id).await?;
    car.apply(update, now)?;
    tx.update_car_details(&car).await?;
    Ok(car)
}

fn require_quantity(by: u32) -> Result<(), DomainError> {
    if by == 0 {
        return Err(DomainError::field("by", "must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, InventoryStore};
    use crate::testing::{seed_car, TestFixture};

    #[tokio::test]
    async fn decrement_then_restock_round_trips() {
        let fx = TestFixture::new().await;
        let car = seed_car(&fx.store, 2).await;
        let ledger = InventoryLedger::new(fx.store.clone());

        assert_eq!(ledger.decrement_stock(car.id, 2).await.unwrap(), 0);
        assert_eq!(ledger.restock(car.id, 3).await.unwrap(), 3);
        assert_eq!(ledger.stock_of(car.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn decrement_below_zero_changes_nothing() {
        let fx = TestFixture::new().await;
        let car = seed_car(&fx.store, 1).await;
        let ledger = InventoryLedger::new(fx.store.clone());

        assert_eq!(
            ledger.decrement_stock(car.id, 2).await,
            Err(SaleError::OutOfStock {
                requested: 2,
                available: 1
            })
        );
        assert_eq!(ledger.stock_of(car.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_changes_catalogue_fields_only() {
        let fx = TestFixture::new().await;
        let car = seed_car(&fx.store, 4).await;
        let ledger = InventoryLedger::new(fx.store.clone());
        let update = CarUpdate {
            price: Some(rust_decimal::Decimal::new(43_000_000, 0)),
            featured: Some(true),
            ..CarUpdate::default()
        };

        let updated = ledger.update_car(car.id, update, Utc::now()).await.unwrap();
        assert!(updated.featured);
        assert_eq!(updated.in_stock, 4);
        assert_eq!(updated.created_at, car.created_at);
        assert_eq!(fx.store.find_car_by_id(car.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn update_of_missing_or_invalid_car_changes_nothing() {
        let fx = TestFixture::new().await;
        let car = seed_car(&fx.store, 1).await;
        let ledger = InventoryLedger::new(fx.store.clone());

        let rename = CarUpdate {
            name: Some("Renamed".into()),
            ..CarUpdate::default()
        };
        assert_eq!(
            ledger.update_car(CarId::new(), rename, Utc::now()).await,
            Err(SaleError::NotFound("car"))
        );

        let blank = CarUpdate {
            model: Some(" ".into()),
            ..CarUpdate::default()
        };
        assert!(matches!(
            ledger.update_car(car.id, blank, Utc::now()).await,
            Err(SaleError::Validation(v)) if v[0].field == "model"
        ));
        assert_eq!(fx.store.find_car_by_id(car.id).await.unwrap(), Some(car));
    }

    #[tokio::test]
    async fn zero_quantities_and_missing_cars_are_rejected() {
        let ledger = InventoryLedger::new(InMemoryStore::new());
        assert!(matches!(
            ledger.restock(CarId::new(), 0).await,
            Err(SaleError::Validation(_))
        ));
        assert_eq!(
            ledger.decrement_stock(CarId::new(), 1).await,
            Err(SaleError::NotFound("car"))
        );
        assert_eq!(ledger.stock_of(CarId::new()).await, Err(SaleError::NotFound("car")));
    }
}
