//! Postgres-backed store implementation.
//!
//! Stock non-negativity is enforced by a conditional `UPDATE ... WHERE in_stock >= $by`:
//! the row lock taken by the update serialises concurrent decrements of the
//! same car, and the `WHERE` clause is re-evaluated against the committed row
//! once the lock is granted. A `CHECK (in_stock >= 0)` constraint backs it up.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database | `40001`, `40P01` | `Conflict` | Serialization failure, deadlock |
//! | Database | `55P03` | `Conflict` | `lock_timeout` elapsed waiting for a row lock |
//! | Database | `23503` | `NotFound` | Sale references a missing car or user |
//! | Database | `23505` | `Duplicate` | Unique key taken (id, username, email) |
//! | Database | `23514`, `22003` | `Constraint` | Check constraint, numeric overflow |
//! | Database | Any other | `Unavailable` | |
//! | Io, Tls, PoolTimedOut, PoolClosed | N/A | `Unavailable` | Connectivity |
//! | ColumnDecode, Decode, ColumnNotFound | N/A | `Decode` | Schema drift |

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use showroom_auth::{Role, StaffSummary, StaffUser};
use showroom_core::{CarId, Money, SaleId, UserId};
use showroom_inventory::{Car, CarSummary, LOW_STOCK_THRESHOLD};
use showroom_sales::{NewSale, Sale, SaleRecord, SaleStatus};

use super::r#trait::{
    InventoryStore, SalesTotals, StoreError, StoreTransaction, TransactionCoordinator,
};

const SCHEMA: &str = include_str!("schema.sql");

const CAR_COLUMNS: &str = "id, name, brand, model, category, year, price, description, \
     in_stock, featured, added_by, created_at, updated_at";

const SALE_COLUMNS: &str = "id, car_id, salesperson_id, customer_name, customer_email, \
     customer_phone, amount, payment_method, status, notes, created_at, updated_at";

const SALE_RECORD_SELECT: &str = "SELECT s.id, s.car_id, s.salesperson_id, s.customer_name, \
     s.customer_email, s.customer_phone, s.amount, s.payment_method, s.status, s.notes, \
     s.created_at, s.updated_at, \
     c.name AS car_name, c.brand AS car_brand, c.model AS car_model, c.price AS car_price, \
     u.first_name AS salesperson_first_name, u.last_name AS salesperson_last_name \
     FROM sales s \
     JOIN cars c ON c.id = s.car_id \
     JOIN users u ON u.id = s.salesperson_id";

/// Postgres-backed store.
///
/// `Send + Sync` and cheap to clone; the pool handles connection sharing.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresStore {
    pub fn new(pool: PgPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    /// Open a pool against `url`.
    #[instrument(skip(url), err)]
    pub async fn connect(
        url: &str,
        max_connections: u32,
        lock_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool, lock_timeout))
    }

    /// Apply the embedded schema. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn begin_tx(&self) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Bounded row-lock waits; scoped to this transaction.
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_lock_timeout", e))?;

        Ok(tx)
    }
}

#[async_trait]
impl InventoryStore for PostgresStore {
    #[instrument(skip(self), fields(car_id = %id), err)]
    async fn find_car_by_id(&self, id: CarId) -> Result<Option<Car>, StoreError> {
        let row = sqlx::query(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_car_by_id", e))?;

        row.as_ref().map(car_from_row).transpose()
    }

    #[instrument(skip(self, car), fields(car_id = %car.id), err)]
    async fn insert_car(&self, car: &Car) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO cars ({CAR_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(car.id.as_uuid())
        .bind(&car.name)
        .bind(&car.brand)
        .bind(&car.model)
        .bind(&car.category)
        .bind(car.year)
        .bind(car.price.amount())
        .bind(&car.description)
        .bind(to_db_count(car.in_stock)?)
        .bind(car.featured)
        .bind(car.added_by.map(Uuid::from))
        .bind(car.created_at)
        .bind(car.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_car", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(car_id = %id), err)]
    async fn delete_car(&self, id: CarId) -> Result<(), StoreError> {
        let mut tx = self.begin_tx().await?;

        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_car", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("car"));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: &StaffUser) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<StaffUser>, StoreError> {
        let row = sqlx::query(
            "SELECT id, username, email, first_name, last_name, role, is_active FROM users WHERE email = $1",
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(sale_id = %id), err)]
    async fn find_sale_record(&self, id: SaleId) -> Result<Option<SaleRecord>, StoreError> {
        let row = sqlx::query(&format!("{SALE_RECORD_SELECT} WHERE s.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_sale_record", e))?;

        row.as_ref().map(record_from_row).transpose()
    }

    #[instrument(skip(self), fields(car_id = %car_id), err)]
    async fn sales_for_car(&self, car_id: CarId) -> Result<Vec<Sale>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE car_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(car_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("sales_for_car", e))?;

        rows.iter().map(sale_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn count_cars(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cars")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_cars", e))?;
        Ok(count.max(0) as u64)
    }

    #[instrument(skip(self), err)]
    async fn sales_totals_since(&self, since: DateTime<Utc>) -> Result<SalesTotals, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count, COALESCE(SUM(amount), 0) AS revenue
            FROM sales
            WHERE created_at >= $1 AND status <> 'CANCELLED'
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("sales_totals_since", e))?;

        let count: i64 = row.try_get("count").map_err(|e| map_sqlx_error("sales_totals_since", e))?;
        let revenue: Decimal = row
            .try_get("revenue")
            .map_err(|e| map_sqlx_error("sales_totals_since", e))?;
        Ok(SalesTotals {
            count: count.max(0) as u64,
            revenue,
        })
    }

    #[instrument(skip(self), err)]
    async fn low_stock_cars(&self, limit: usize) -> Result<Vec<Car>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {CAR_COLUMNS} FROM cars WHERE in_stock <= $1 ORDER BY in_stock ASC, name ASC LIMIT $2"
        ))
        .bind(to_db_count(LOW_STOCK_THRESHOLD)?)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("low_stock_cars", e))?;

        rows.iter().map(car_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_sales(&self, offset: u64, limit: usize) -> Result<Vec<SaleRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "{SALE_RECORD_SELECT} ORDER BY s.created_at DESC, s.id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_sales", e))?;

        rows.iter().map(record_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn count_sales(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("count_sales", e))?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl TransactionCoordinator for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(PostgresTransaction {
            tx: self.begin_tx().await?,
        })
    }
}

/// A unit of work on one pooled connection.
///
/// sqlx rolls the transaction back when it is dropped uncommitted.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl core::fmt::Debug for PostgresTransaction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostgresTransaction").finish_non_exhaustive()
    }
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    #[instrument(skip(self), fields(car_id = %car_id), err)]
    async fn decrement_if_available(&mut self, car_id: CarId, by: u32) -> Result<u32, StoreError> {
        if by == 0 {
            return Err(StoreError::Constraint("quantity must be at least 1".to_string()));
        }
        let by_db = to_db_count(by)?;

        let remaining: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE cars
            SET in_stock = in_stock - $2, updated_at = now()
            WHERE id = $1 AND in_stock >= $2
            RETURNING in_stock
            "#,
        )
        .bind(car_id.as_uuid())
        .bind(by_db)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("decrement_if_available", e))?;

        if let Some(remaining) = remaining {
            return from_db_count(remaining);
        }

        // No row updated: either the car is gone or it has too few units.
        let available: Option<i32> = sqlx::query_scalar("SELECT in_stock FROM cars WHERE id = $1")
            .bind(car_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("decrement_if_available", e))?;

        match available {
            None => Err(StoreError::not_found("car")),
            Some(available) => Err(StoreError::OutOfStock {
                requested: by,
                available: from_db_count(available)?,
            }),
        }
    }

    #[instrument(skip(self), fields(car_id = %car_id), err)]
    async fn increment_stock(&mut self, car_id: CarId, by: u32) -> Result<u32, StoreError> {
        if by == 0 {
            return Err(StoreError::Constraint("quantity must be at least 1".to_string()));
        }

        let total: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE cars
            SET in_stock = in_stock + $2, updated_at = now()
            WHERE id = $1
            RETURNING in_stock
            "#,
        )
        .bind(car_id.as_uuid())
        .bind(to_db_count(by)?)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("increment_stock", e))?;

        match total {
            Some(total) => from_db_count(total),
            None => Err(StoreError::not_found("car")),
        }
    }

    #[instrument(skip(self), fields(car_id = %id), err)]
    async fn lock_car(&mut self, id: CarId) -> Result<Car, StoreError> {
        let row = sqlx::query(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1 FOR UPDATE"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_car", e))?;

        match row {
            Some(row) => car_from_row(&row),
            None => Err(StoreError::not_found("car")),
        }
    }

    #[instrument(skip(self, car), fields(car_id = %car.id), err)]
    async fn update_car_details(&mut self, car: &Car) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE cars
            SET name = $2, brand = $3, model = $4, category = $5, year = $6,
                price = $7, description = $8, featured = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(car.id.as_uuid())
        .bind(&car.name)
        .bind(&car.brand)
        .bind(&car.model)
        .bind(&car.category)
        .bind(car.year)
        .bind(car.price.amount())
        .bind(&car.description)
        .bind(car.featured)
        .bind(car.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update_car_details", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("car"));
        }
        Ok(())
    }

    #[instrument(skip(self, sale), fields(car_id = %sale.car_id), err)]
    async fn insert_sale(&mut self, sale: NewSale) -> Result<Sale, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO sales (id, car_id, salesperson_id, customer_name, customer_email,
                               customer_phone, amount, payment_method, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(SaleId::new().as_uuid())
        .bind(sale.car_id.as_uuid())
        .bind(sale.salesperson_id.as_uuid())
        .bind(&sale.customer_name)
        .bind(&sale.customer_email)
        .bind(&sale.customer_phone)
        .bind(sale.amount.amount())
        .bind(&sale.payment_method)
        .bind(sale.status.as_str())
        .bind(&sale.notes)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_sale", e))?;

        sale_from_row(&row)
    }

    #[instrument(skip(self), fields(sale_id = %id), err)]
    async fn lock_sale(&mut self, id: SaleId) -> Result<Sale, StoreError> {
        let row = sqlx::query(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1 FOR UPDATE"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_sale", e))?;

        match row {
            Some(row) => sale_from_row(&row),
            None => Err(StoreError::not_found("sale")),
        }
    }

    #[instrument(skip(self), fields(sale_id = %id, status = %status), err)]
    async fn set_sale_status(&mut self, id: SaleId, status: SaleStatus) -> Result<Sale, StoreError> {
        let row = sqlx::query(&format!(
            "UPDATE sales SET status = $2, updated_at = now() WHERE id = $1 RETURNING {SALE_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("set_sale_status", e))?;

        match row {
            Some(row) => sale_from_row(&row),
            None => Err(StoreError::not_found("sale")),
        }
    }

    #[instrument(skip(self), fields(sale_id = %id), err)]
    async fn sale_record(&mut self, id: SaleId) -> Result<SaleRecord, StoreError> {
        let row = sqlx::query(&format!("{SALE_RECORD_SELECT} WHERE s.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("sale_record", e))?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(StoreError::not_found("sale")),
        }
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

/// Map SQLx errors to `StoreError`. See the module docs for the table.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("40001") | Some("40P01") | Some("55P03") => StoreError::Conflict(msg),
                Some("23503") => StoreError::NotFound {
                    entity: referenced_entity(db_err.constraint()),
                },
                Some("23505") => StoreError::Duplicate {
                    field: duplicated_field(db_err.constraint()),
                },
                Some("23514") | Some("22003") => StoreError::Constraint(msg),
                _ => StoreError::Unavailable(msg),
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => {
            StoreError::Unavailable(format!("connection failure in {}: {}", operation, err))
        }
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. } => {
            StoreError::Decode(format!("{} in {}", err, operation))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}

/// Which entity a foreign-key violation points at, from the constraint name.
fn referenced_entity(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(name) if name.contains("salesperson") || name.contains("added_by") => "user",
        _ => "car",
    }
}

/// Which unique column a duplicate-key violation hit, from the constraint name.
fn duplicated_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(name) if name.ends_with("email_key") => "email",
        Some(name) if name.ends_with("username_key") => "username",
        _ => "id",
    }
}

fn decode<'r, T>(row: &'r PgRow) -> Result<T, StoreError>
where
    T: FromRow<'r, PgRow>,
{
    T::from_row(row).map_err(|e| StoreError::Decode(e.to_string()))
}

fn car_from_row(row: &PgRow) -> Result<Car, StoreError> {
    decode::<CarRow>(row)?.try_into()
}

fn sale_from_row(row: &PgRow) -> Result<Sale, StoreError> {
    decode::<SaleRow>(row)?.try_into()
}

fn record_from_row(row: &PgRow) -> Result<SaleRecord, StoreError> {
    decode::<SaleRecordRow>(row)?.try_into()
}

fn user_from_row(row: &PgRow) -> Result<StaffUser, StoreError> {
    Ok(decode::<UserRow>(row)?.into())
}

fn to_db_count(value: u32) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::Constraint(format!("count {value} out of range")))
}

fn from_db_count(value: i32) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::Decode(format!("negative count {value}")))
}

// SQLx row types

#[derive(Debug)]
struct CarRow {
    id: Uuid,
    name: String,
    brand: String,
    model: String,
    category: String,
    year: i32,
    price: Decimal,
    description: Option<String>,
    in_stock: i32,
    featured: bool,
    added_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for CarRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CarRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            brand: row.try_get("brand")?,
            model: row.try_get("model")?,
            category: row.try_get("category")?,
            year: row.try_get("year")?,
            price: row.try_get("price")?,
            description: row.try_get("description")?,
            in_stock: row.try_get("in_stock")?,
            featured: row.try_get("featured")?,
            added_by: row.try_get("added_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<CarRow> for Car {
    type Error = StoreError;

    fn try_from(row: CarRow) -> Result<Self, Self::Error> {
        Ok(Car {
            id: CarId::from_uuid(row.id),
            name: row.name,
            brand: row.brand,
            model: row.model,
            category: row.category,
            year: row.year,
            price: Money::new(row.price).map_err(|e| StoreError::Decode(e.to_string()))?,
            description: row.description,
            in_stock: from_db_count(row.in_stock)?,
            featured: row.featured,
            added_by: row.added_by.map(UserId::from_uuid),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct SaleRow {
    id: Uuid,
    car_id: Uuid,
    salesperson_id: Uuid,
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    amount: Decimal,
    payment_method: String,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for SaleRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(SaleRow {
            id: row.try_get("id")?,
            car_id: row.try_get("car_id")?,
            salesperson_id: row.try_get("salesperson_id")?,
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            customer_phone: row.try_get("customer_phone")?,
            amount: row.try_get("amount")?,
            payment_method: row.try_get("payment_method")?,
            status: row.try_get("status")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<SaleRow> for Sale {
    type Error = StoreError;

    fn try_from(row: SaleRow) -> Result<Self, Self::Error> {
        Ok(Sale {
            id: SaleId::from_uuid(row.id),
            car_id: CarId::from_uuid(row.car_id),
            salesperson_id: UserId::from_uuid(row.salesperson_id),
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            customer_phone: row.customer_phone,
            amount: Money::new(row.amount).map_err(|e| StoreError::Decode(e.to_string()))?,
            payment_method: row.payment_method,
            status: row
                .status
                .parse()
                .map_err(|e: showroom_core::DomainError| StoreError::Decode(e.to_string()))?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
struct SaleRecordRow {
    sale: SaleRow,
    car_name: String,
    car_brand: String,
    car_model: String,
    car_price: Decimal,
    salesperson_first_name: String,
    salesperson_last_name: String,
}

impl<'r> FromRow<'r, PgRow> for SaleRecordRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(SaleRecordRow {
            sale: SaleRow::from_row(row)?,
            car_name: row.try_get("car_name")?,
            car_brand: row.try_get("car_brand")?,
            car_model: row.try_get("car_model")?,
            car_price: row.try_get("car_price")?,
            salesperson_first_name: row.try_get("salesperson_first_name")?,
            salesperson_last_name: row.try_get("salesperson_last_name")?,
        })
    }
}

impl TryFrom<SaleRecordRow> for SaleRecord {
    type Error = StoreError;

    fn try_from(row: SaleRecordRow) -> Result<Self, Self::Error> {
        let sale: Sale = row.sale.try_into()?;
        let car = CarSummary {
            id: sale.car_id,
            name: row.car_name,
            brand: row.car_brand,
            model: row.car_model,
            price: Money::new(row.car_price).map_err(|e| StoreError::Decode(e.to_string()))?,
        };
        let salesperson = StaffSummary {
            id: sale.salesperson_id,
            first_name: row.salesperson_first_name,
            last_name: row.salesperson_last_name,
        };
        Ok(SaleRecord {
            sale,
            car,
            salesperson,
        })
    }
}

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    role: String,
    is_active: bool,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            role: row.try_get("role")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

impl From<UserRow> for StaffUser {
    fn from(row: UserRow) -> Self {
        StaffUser {
            id: UserId::from_uuid(row.id),
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            role: Role::new(row.role),
            is_active: row.is_active,
        }
    }
}
