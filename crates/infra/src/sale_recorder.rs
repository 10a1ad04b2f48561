//! Sale recording: a sale row and its stock decrement, committed together.

use serde::Serialize;
use tracing::instrument;

use showroom_core::{PageRequest, Pagination, SaleId, UserId};
use showroom_sales::{NewSale, RecordSale, SaleRecord, SaleStatus};

use crate::error::{SaleError, ServiceResult};
use crate::store::{
    rollback_quietly, InventoryStore, StoreTransaction, TransactionCoordinator,
};

/// One page of the sales listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesPage {
    pub sales: Vec<SaleRecord>,
    pub pagination: Pagination,
}

/// Records and cancels sales.
///
/// ## Recording pipeline
///
/// 1. Validate the request (no store access on failure)
/// 2. Resolve the car; fail fast with `NotFound` / `OutOfStock`
/// 3. In one transaction: insert the `COMPLETED` sale, decrement stock by one,
///    read back the sale with its summaries
/// 4. Commit, or roll back on any failure
///
/// Step 2 is advisory. The decrement in step 3 is the authoritative check, so a
/// concurrent sale that takes the last unit between 2 and 3 still yields
/// `OutOfStock` and leaves no sale behind.
#[derive(Debug, Clone)]
pub struct SaleRecorder<S> {
    store: S,
}

impl<S> SaleRecorder<S>
where
    S: InventoryStore + TransactionCoordinator,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(
        skip(self, request),
        fields(car_id = %request.car_id, salesperson_id = %salesperson_id),
        err
    )]
    pub async fn record_sale(
        &self,
        request: &RecordSale,
        salesperson_id: UserId,
    ) -> ServiceResult<SaleRecord> {
        request.validate()?;
        let car_id = request.car_id()?;

        let car = self
            .store
            .find_car_by_id(car_id)
            .await?
            .ok_or(SaleError::NotFound("car"))?;
        if car.in_stock < 1 {
            return Err(SaleError::OutOfStock {
                requested: 1,
                available: car.in_stock,
            });
        }

        let new_sale = request.to_new_sale(car_id, salesperson_id)?;

        let mut tx = self.store.begin().await?;
        match create_and_decrement(&mut tx, new_sale).await {
            Ok(record) => {
                tx.commit().await?;
                tracing::info!(sale_id = %record.sale.id, "sale recorded");
                Ok(record)
            }
            Err(err) => {
                rollback_quietly(tx).await;
                Err(err)
            }
        }
    }

    /// Cancel a completed sale and return its unit to stock, atomically.
    #[instrument(skip(self), fields(sale_id = %sale_id), err)]
    pub async fn cancel_sale(&self, sale_id: SaleId) -> ServiceResult<SaleRecord> {
        let mut tx = self.store.begin().await?;
        match cancel_and_restock(&mut tx, sale_id).await {
            Ok(record) => {
                tx.commit().await?;
                tracing::info!(car_id = %record.sale.car_id, "sale cancelled");
                Ok(record)
            }
            Err(err) => {
                rollback_quietly(tx).await;
                Err(err)
            }
        }
    }

    pub async fn find_sale(&self, sale_id: SaleId) -> ServiceResult<SaleRecord> {
        self.store
            .find_sale_record(sale_id)
            .await?
            .ok_or(SaleError::NotFound("sale"))
    }

    /// Sales of every status, newest first, with car and salesperson summaries.
    #[instrument(skip(self), err)]
    pub async fn list_sales(&self, page: PageRequest) -> ServiceResult<SalesPage> {
        let total = self.store.count_sales().await?;
        let sales = self
            .store
            .list_sales(page.offset(), page.limit as usize)
            .await?;
        Ok(SalesPage {
            sales,
            pagination: page.describe(total),
        })
    }
}

async fn create_and_decrement<T: StoreTransaction>(
    tx: &mut T,
    new_sale: NewSale,
) -> ServiceResult<SaleRecord> {
    let car_id = new_sale.car_id;
    let sale = tx.insert_sale(new_sale).await?;
    let remaining = tx.decrement_if_available(car_id, 1).await?;
    tracing::debug!(sale_id = %sale.id, remaining, "stock decremented for sale");
    Ok(tx.sale_record(sale.id).await?)
}

async fn cancel_and_restock<T: StoreTransaction>(
    tx: &mut T,
    sale_id: SaleId,
) -> ServiceResult<SaleRecord> {
    let sale = tx.lock_sale(sale_id).await?;
    if sale.status != SaleStatus::Completed {
        return Err(SaleError::InvalidState(format!(
            "only COMPLETED sales can be cancelled (sale is {})",
            sale.status
        )));
    }
    sale.ensure_transition(SaleStatus::Cancelled)?;

    tx.set_sale_status(sale_id, SaleStatus::Cancelled).await?;
    tx.increment_stock(sale.car_id, 1).await?;
    Ok(tx.sale_record(sale_id).await?)
}
