use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use showroom_core::{validate, CarId, DomainError, DomainResult, Entity, FieldViolation, Money, UserId};

/// The first production automobile; nothing older belongs in the catalogue.
const EARLIEST_MODEL_YEAR: i32 = 1886;

/// A car in the dealership's catalogue.
///
/// `in_stock` is only decremented by recording a sale and only incremented by
/// inventory management (restock, sale cancellation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: CarId,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub category: String,
    pub year: i32,
    pub price: Money,
    pub description: Option<String>,
    pub in_stock: u32,
    pub featured: bool,
    pub added_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Car {
    type Id = CarId;
    const NAME: &'static str = "car";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn require_model_year(out: &mut Vec<FieldViolation>, year: i32, now: DateTime<Utc>) {
    let latest = now.year() + 1;
    if !(EARLIEST_MODEL_YEAR..=latest).contains(&year) {
        out.push(FieldViolation::new(
            "year",
            format!("must be between {EARLIEST_MODEL_YEAR} and {latest}"),
        ));
    }
}

impl Car {
    /// Apply a catalogue edit. Nothing changes unless every given field is valid.
    pub fn apply(&mut self, update: CarUpdate, now: DateTime<Utc>) -> DomainResult<()> {
        update.validate(now)?;
        let CarUpdate { name, brand, model, category, year, price, description, featured } = update;

        if let Some(name) = name {
            self.name = name.trim().to_string();
        }
        if let Some(brand) = brand {
            self.brand = brand.trim().to_string();
        }
        if let Some(model) = model {
            self.model = model.trim().to_string();
        }
        if let Some(category) = category {
            self.category = category.trim().to_string();
        }
        if let Some(year) = year {
            self.year = year;
        }
        if let Some(price) = price {
            self.price = Money::new(price)?;
        }
        if let Some(description) = description {
            self.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(featured) = featured {
            self.featured = featured;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn summary(&self) -> CarSummary {
        CarSummary {
            id: self.id,
            name: self.name.clone(),
            brand: self.brand.clone(),
            model: self.model.clone(),
            price: self.price,
        }
    }
}

/// Car projection embedded in sale records and dashboard rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarSummary {
    pub id: CarId,
    pub name: String,
    pub brand: String,
    pub model: String,
    pub price: Money,
}

/// Request to add a car to the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCar {
    pub name: String,
    pub brand: String,
    pub model: String,
    pub category: String,
    pub year: i32,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub in_stock: u32,
    #[serde(default)]
    pub featured: bool,
}

impl NewCar {
    /// Check every field, reporting all violations at once.
    pub fn validate(&self, now: DateTime<Utc>) -> DomainResult<()> {
        let mut out = Vec::new();
        validate::require_non_empty(&mut out, "name", &self.name);
        validate::require_non_empty(&mut out, "brand", &self.brand);
        validate::require_non_empty(&mut out, "model", &self.model);
        validate::require_non_empty(&mut out, "category", &self.category);
        validate::require_money(&mut out, "price", self.price);
        require_model_year(&mut out, self.year, now);
        DomainError::check(out)
    }

    /// Validate and materialize the car, stamping it with `now` and the acting user.
    pub fn into_car(self, added_by: Option<UserId>, now: DateTime<Utc>) -> DomainResult<Car> {
        self.validate(now)?;
        Ok(Car {
            id: CarId::new(),
            name: self.name.trim().to_string(),
            brand: self.brand.trim().to_string(),
            model: self.model.trim().to_string(),
            category: self.category.trim().to_string(),
            year: self.year,
            price: Money::new(self.price)?,
            description: self.description.filter(|d| !d.trim().is_empty()),
            in_stock: self.in_stock,
            featured: self.featured,
            added_by,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial edit of a car's catalogue fields.
///
/// Stock is absent on purpose: it only moves through sales, cancellations and
/// restocks, so an `inStock` key is refused along with any other unknown field.
/// A blank description clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CarUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
}

impl CarUpdate {
    pub fn validate(&self, now: DateTime<Utc>) -> DomainResult<()> {
        let mut out = Vec::new();
        let text = [
            ("name", &self.name),
            ("brand", &self.brand),
            ("model", &self.model),
            ("category", &self.category),
        ];
        for (field, value) in text {
            if let Some(value) = value {
                validate::require_non_empty(&mut out, field, value);
            }
        }
        if let Some(price) = self.price {
            validate::require_money(&mut out, "price", price);
        }
        if let Some(year) = self.year {
            require_model_year(&mut out, year, now);
        }
        DomainError::check(out)
    }
}
