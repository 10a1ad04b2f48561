use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use showroom_core::{CarId, DomainError, DomainResult, Entity, Money, SaleId, UserId};

/// Sale status lifecycle.
///
/// Recording a sale yields `Completed` directly. `Pending` is kept for rows
/// written by older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "PENDING",
            SaleStatus::Completed => "COMPLETED",
            SaleStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn can_transition_to(&self, next: SaleStatus) -> bool {
        matches!(
            (self, next),
            (SaleStatus::Pending, SaleStatus::Completed)
                | (SaleStatus::Pending, SaleStatus::Cancelled)
                | (SaleStatus::Completed, SaleStatus::Cancelled)
        )
    }

    /// Whether the sale counts towards revenue.
    pub fn is_revenue(&self) -> bool {
        !matches!(self, SaleStatus::Cancelled)
    }
}

impl core::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SaleStatus::Pending),
            "COMPLETED" => Ok(SaleStatus::Completed),
            "CANCELLED" => Ok(SaleStatus::Cancelled),
            other => Err(DomainError::invariant(format!("unknown sale status '{other}'"))),
        }
    }
}

/// A recorded sale of one unit of one car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    pub car_id: CarId,
    pub salesperson_id: UserId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub amount: Money,
    pub payment_method: String,
    pub status: SaleStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Sale {
    type Id = SaleId;
    const NAME: &'static str = "sale";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Sale {
    /// Materialize a sale row. Stores call this when inserting.
    pub fn create(new: NewSale, now: DateTime<Utc>) -> Self {
        Self {
            id: SaleId::new(),
            car_id: new.car_id,
            salesperson_id: new.salesperson_id,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            amount: new.amount,
            payment_method: new.payment_method,
            status: new.status,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check a lifecycle move without applying it.
    pub fn ensure_transition(&self, next: SaleStatus) -> DomainResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "sale cannot move from {} to {}",
                self.status, next
            )))
        }
    }
}

/// A validated sale ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub car_id: CarId,
    pub salesperson_id: UserId,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub amount: Money,
    pub payment_method: String,
    pub status: SaleStatus,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn test_sale(status: SaleStatus) -> Sale {
        let mut sale = Sale::create(
            NewSale {
                car_id: CarId::new(),
                salesperson_id: UserId::new(),
                customer_name: "Ada Obi".into(),
                customer_email: "ada@example.com".into(),
                customer_phone: None,
                amount: Money::new(Decimal::new(1000, 0)).unwrap(),
                payment_method: "transfer".into(),
                status: SaleStatus::Completed,
                notes: None,
            },
            Utc::now(),
        );
        sale.status = status;
        sale
    }

    #[test]
    fn completed_sales_can_only_be_cancelled() {
        let sale = test_sale(SaleStatus::Completed);
        assert!(sale.ensure_transition(SaleStatus::Cancelled).is_ok());
        assert!(sale.ensure_transition(SaleStatus::Pending).is_err());
        assert!(sale.ensure_transition(SaleStatus::Completed).is_err());
    }

    #[test]
    fn cancelled_is_terminal() {
        let sale = test_sale(SaleStatus::Cancelled);
        for next in [SaleStatus::Pending, SaleStatus::Completed, SaleStatus::Cancelled] {
            match sale.ensure_transition(next) {
                Err(DomainError::InvariantViolation(_)) => {}
                other => panic!("expected invariant violation, got {other:?}"),
            }
        }
    }

    #[test]
    fn status_text_round_trips_through_store_form() {
        for status in [SaleStatus::Pending, SaleStatus::Completed, SaleStatus::Cancelled] {
            assert_eq!(status.as_str().parse::<SaleStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::Value::String(status.as_str().into())
            );
        }
        assert!("completed".parse::<SaleStatus>().is_err());
    }

    #[test]
    fn cancelled_sales_do_not_count_as_revenue() {
        assert!(SaleStatus::Completed.is_revenue());
        assert!(SaleStatus::Pending.is_revenue());
        assert!(!SaleStatus::Cancelled.is_revenue());
    }
}
