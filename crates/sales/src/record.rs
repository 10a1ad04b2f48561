use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use showroom_auth::StaffSummary;
use showroom_core::{validate, CarId, DomainError, DomainResult, Money, UserId};
use showroom_inventory::CarSummary;

use crate::{NewSale, Sale, SaleStatus};

/// Incoming request to record the sale of one unit of a car.
///
/// Fields arrive untrusted; `validate` runs before anything touches the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSale {
    pub car_id: String,
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    pub amount: Decimal,
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RecordSale {
    /// Report every malformed field at once.
    pub fn validate(&self) -> DomainResult<()> {
        let mut out = Vec::new();
        validate::require_non_empty(&mut out, "carId", &self.car_id);
        validate::require_non_empty(&mut out, "customerName", &self.customer_name);
        validate::require_email(&mut out, "customerEmail", &self.customer_email);
        validate::require_money(&mut out, "amount", self.amount);
        validate::require_non_empty(&mut out, "paymentMethod", &self.payment_method);
        DomainError::check(out)
    }

    /// Resolve the car reference. An id that cannot name any car is treated
    /// the same as one that names a missing car.
    pub fn car_id(&self) -> DomainResult<CarId> {
        self.car_id
            .parse::<CarId>()
            .map_err(|_| DomainError::NotFound("car"))
    }

    /// Build the row to insert. Always `COMPLETED`.
    pub fn to_new_sale(&self, car_id: CarId, salesperson_id: UserId) -> DomainResult<NewSale> {
        self.validate()?;
        Ok(NewSale {
            car_id,
            salesperson_id,
            customer_name: self.customer_name.trim().to_string(),
            customer_email: self.customer_email.trim().to_string(),
            customer_phone: non_blank(self.customer_phone.as_deref()),
            amount: Money::new(self.amount)?,
            payment_method: self.payment_method.trim().to_string(),
            status: SaleStatus::Completed,
            notes: non_blank(self.notes.as_deref()),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// A sale together with the car and salesperson it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    #[serde(flatten)]
    pub sale: Sale,
    pub car: CarSummary,
    pub salesperson: StaffSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> RecordSale {
        RecordSale {
            car_id: CarId::new().to_string(),
            customer_name: "Ada Obi".into(),
            customer_email: "ada@example.com".into(),
            customer_phone: Some("  ".into()),
            amount: Decimal::new(1000, 0),
            payment_method: "bank transfer".into(),
            notes: None,
        }
    }

    #[test]
    fn valid_request_becomes_completed_sale() {
        let req = valid_request();
        let car_id = req.car_id().unwrap();
        let new = req.to_new_sale(car_id, UserId::new()).unwrap();
        assert_eq!(new.status, SaleStatus::Completed);
        assert_eq!(new.customer_phone, None);
        assert_eq!(new.car_id, car_id);
    }

    #[test]
    fn invalid_email_names_the_field() {
        let mut req = valid_request();
        req.customer_email = "not-an-email".into();
        match req.validate() {
            Err(DomainError::Validation(v)) => {
                assert_eq!(v.len(), 1);
                assert_eq!(v[0].field, "customerEmail");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn every_bad_field_is_reported() {
        let req = RecordSale {
            car_id: "".into(),
            customer_name: " ".into(),
            customer_email: "".into(),
            customer_phone: None,
            amount: Decimal::new(-5, 0),
            payment_method: "".into(),
            notes: None,
        };
        match req.validate() {
            Err(DomainError::Validation(v)) => {
                let fields: Vec<_> = v.iter().map(|f| f.field).collect();
                assert_eq!(
                    fields,
                    vec!["carId", "customerName", "customerEmail", "amount", "paymentMethod"]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_car_id_is_not_found() {
        let mut req = valid_request();
        req.car_id = "car-42".into();
        assert_eq!(req.car_id(), Err(DomainError::NotFound("car")));
    }

    #[test]
    fn amount_must_fit_the_stored_money_column() {
        for amount in [Decimal::new(1, 3), Decimal::new(100_000_000_000_000, 0)] {
            let mut req = valid_request();
            req.amount = amount;
            match req.validate() {
                Err(DomainError::Validation(v)) => assert_eq!(v[0].field, "amount"),
                other => panic!("expected amount violation for {amount}, got {other:?}"),
            }
        }
    }

    #[test]
    fn accepts_camel_case_json_with_numeric_amount() {
        let json = format!(
            r#"{{"carId":"{}","customerName":"Ada","customerEmail":"ada@example.com","amount":1500.50,"paymentMethod":"cash"}}"#,
            CarId::new()
        );
        let req: RecordSale = serde_json::from_str(&json).unwrap();
        assert_eq!(req.amount, Decimal::new(150050, 2));
        assert!(req.validate().is_ok());
    }
}
