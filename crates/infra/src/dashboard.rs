//! Dashboard overview: catalogue size, recent revenue, low stock, latest sales.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use showroom_core::DomainError;
use showroom_inventory::CarSummary;
use showroom_sales::SaleRecord;

use crate::error::ServiceResult;
use crate::store::InventoryStore;

pub const DEFAULT_RANGE_DAYS: u32 = 30;
/// A century; longer ranges are rejected rather than overflowing the clock.
pub const MAX_RANGE_DAYS: u32 = 36_500;
const LOW_STOCK_LIMIT: usize = 10;
const RECENT_SALES_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_cars: u64,
    pub total_sales: u64,
    pub total_revenue: Decimal,
    pub average_sale_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockCar {
    #[serde(flatten)]
    pub car: CarSummary,
    pub category: String,
    pub in_stock: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub range_days: u32,
    pub since: DateTime<Utc>,
    pub summary: DashboardSummary,
    pub low_stock_cars: Vec<LowStockCar>,
    pub recent_sales: Vec<SaleRecord>,
}

#[derive(Debug, Clone)]
pub struct Dashboard<S> {
    store: S,
}

impl<S: InventoryStore> Dashboard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Overview over the last `days` days (default 30).
    pub async fn overview(&self, days: Option<u32>) -> ServiceResult<DashboardOverview> {
        self.overview_at(days, Utc::now()).await
    }

    /// Cancelled sales are excluded from the count and revenue.
    #[instrument(skip(self), err)]
    pub async fn overview_at(
        &self,
        days: Option<u32>,
        now: DateTime<Utc>,
    ) -> ServiceResult<DashboardOverview> {
        let range_days = days.unwrap_or(DEFAULT_RANGE_DAYS);
        if !(1..=MAX_RANGE_DAYS).contains(&range_days) {
            return Err(DomainError::field(
                "timeRange",
                format!("must be between 1 and {MAX_RANGE_DAYS} days"),
            )
            .into());
        }
        let since = now
            .checked_sub_signed(Duration::days(i64::from(range_days)))
            .ok_or_else(|| DomainError::field("timeRange", "reaches before the earliest date"))?;

        let total_cars = self.store.count_cars().await?;
        let totals = self.store.sales_totals_since(since).await?;
        let low_stock = self.store.low_stock_cars(LOW_STOCK_LIMIT).await?;
        let recent_sales = self.store.list_sales(0, RECENT_SALES_LIMIT).await?;

        let average_sale_value = if totals.count > 0 {
            (totals.revenue / Decimal::from(totals.count)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Ok(DashboardOverview {
            range_days,
            since,
            summary: DashboardSummary {
                total_cars,
                total_sales: totals.count,
                total_revenue: totals.revenue,
                average_sale_value,
            },
            low_stock_cars: low_stock
                .into_iter()
                .map(|car| LowStockCar {
                    category: car.category.clone(),
                    in_stock: car.in_stock,
                    car: car.summary(),
                })
                .collect(),
            recent_sales,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SaleError;
    use crate::store::InMemoryStore;

    fn range_violation(result: ServiceResult<DashboardOverview>) -> bool {
        matches!(result, Err(SaleError::Validation(v)) if v[0].field == "timeRange")
    }

    #[tokio::test]
    async fn range_is_bounded_on_both_ends() {
        let dashboard = Dashboard::new(InMemoryStore::new());

        assert!(range_violation(dashboard.overview(Some(0)).await));
        assert!(range_violation(dashboard.overview(Some(MAX_RANGE_DAYS + 1)).await));
        assert!(range_violation(dashboard.overview(Some(u32::MAX)).await));

        let widest = dashboard.overview(Some(MAX_RANGE_DAYS)).await.unwrap();
        assert_eq!(widest.range_days, MAX_RANGE_DAYS);
    }

    #[tokio::test]
    async fn range_reaching_before_the_calendar_is_rejected() {
        let dashboard = Dashboard::new(InMemoryStore::new());
        assert!(range_violation(
            dashboard.overview_at(Some(10), DateTime::<Utc>::MIN_UTC).await
        ));
    }
}
