use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OwnedMutexGuard;

use showroom_auth::StaffUser;
use showroom_core::{CarId, SaleId, UserId};
use showroom_inventory::{checked_decrement, checked_increment, is_low_stock, Car};
use showroom_sales::{NewSale, Sale, SaleRecord, SaleStatus};

use super::r#trait::{
    InventoryStore, SalesTotals, StoreError, StoreTransaction, TransactionCoordinator,
};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
enum RowKey {
    Car(CarId),
    Sale(SaleId),
}

impl core::fmt::Display for RowKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RowKey::Car(id) => write!(f, "car {id}"),
            RowKey::Sale(id) => write!(f, "sale {id}"),
        }
    }
}

type LockMap = HashMap<RowKey, Arc<tokio::sync::Mutex<()>>>;
type LockTable = Mutex<LockMap>;

/// Drop the table entry for `key` once nobody holds or waits on it.
fn prune(locks: &mut LockMap, key: RowKey) {
    if locks.get(&key).is_some_and(|m| Arc::strong_count(m) == 1) {
        locks.remove(&key);
    }
}

/// Exclusive hold on one row until dropped.
struct RowGuard {
    key: RowKey,
    table: Arc<LockTable>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RowGuard {
    fn drop(&mut self) {
        // Release under the table lock so no new waiter can pick up the entry in between.
        let Ok(mut locks) = self.table.lock() else {
            return;
        };
        self.guard.take();
        prune(&mut locks, self.key);
    }
}

#[derive(Debug, Default)]
struct Tables {
    cars: HashMap<CarId, Car>,
    sales: HashMap<SaleId, Sale>,
    users: HashMap<UserId, StaffUser>,
}

impl Tables {
    fn record(&self, sale: &Sale, car: Option<&Car>) -> Result<SaleRecord, StoreError> {
        let car = car
            .or_else(|| self.cars.get(&sale.car_id))
            .ok_or(StoreError::not_found("car"))?;
        let salesperson = self
            .users
            .get(&sale.salesperson_id)
            .ok_or(StoreError::not_found("user"))?;
        Ok(SaleRecord {
            sale: sale.clone(),
            car: car.summary(),
            salesperson: salesperson.summary(),
        })
    }
}

#[derive(Debug)]
struct Inner {
    tables: RwLock<Tables>,
    row_locks: Arc<LockTable>,
    lock_timeout: Duration,
}

impl Inner {
    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn locks(&self) -> Result<std::sync::MutexGuard<'_, LockMap>, StoreError> {
        self.row_locks
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    /// Wait for the row lock on `key`, giving up after the configured timeout.
    async fn lock_row(&self, key: RowKey) -> Result<RowGuard, StoreError> {
        let mutex = Arc::clone(self.locks()?.entry(key).or_default());

        match tokio::time::timeout(self.lock_timeout, mutex.lock_owned()).await {
            Ok(guard) => Ok(RowGuard {
                key,
                table: Arc::clone(&self.row_locks),
                guard: Some(guard),
            }),
            Err(_) => {
                prune(&mut *self.locks()?, key);
                Err(StoreError::Conflict(format!("lock wait timeout on {key}")))
            }
        }
    }
}

/// In-memory store with row-level pessimistic locking.
///
/// Transactions lock the rows they touch, stage their writes privately and
/// apply them all under one table write lock at commit. Intended for tests and
/// single-process use; state is lost when the last handle is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                tables: RwLock::new(Tables::default()),
                row_locks: Arc::new(Mutex::new(HashMap::new())),
                lock_timeout,
            }),
        }
    }

    #[cfg(test)]
    fn tracked_row_locks(&self) -> usize {
        self.inner.row_locks.lock().map(|l| l.len()).unwrap_or_default()
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn find_car_by_id(&self, id: CarId) -> Result<Option<Car>, StoreError> {
        Ok(self.inner.read()?.cars.get(&id).cloned())
    }

    async fn insert_car(&self, car: &Car) -> Result<(), StoreError> {
        let mut tables = self.inner.write()?;
        if tables.cars.contains_key(&car.id) {
            return Err(StoreError::Constraint(format!("car {} already exists", car.id)));
        }
        tables.cars.insert(car.id, car.clone());
        Ok(())
    }

    async fn delete_car(&self, id: CarId) -> Result<(), StoreError> {
        // Waits out any transaction currently holding the car.
        let _guard = self.inner.lock_row(RowKey::Car(id)).await?;

        let mut tables = self.inner.write()?;
        if tables.cars.remove(&id).is_none() {
            return Err(StoreError::not_found("car"));
        }
        tables.sales.retain(|_, sale| sale.car_id != id);
        Ok(())
    }

    async fn insert_user(&self, user: &StaffUser) -> Result<(), StoreError> {
        let mut tables = self.inner.write()?;
        for existing in tables.users.values() {
            let field = if existing.id == user.id {
                "id"
            } else if existing.email == user.email {
                "email"
            } else if existing.username == user.username {
                "username"
            } else {
                continue;
            };
            return Err(StoreError::Duplicate { field });
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<StaffUser>, StoreError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .inner
            .read()?
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_sale_record(&self, id: SaleId) -> Result<Option<SaleRecord>, StoreError> {
        let tables = self.inner.read()?;
        match tables.sales.get(&id) {
            Some(sale) => tables.record(sale, None).map(Some),
            None => Ok(None),
        }
    }

    async fn sales_for_car(&self, car_id: CarId) -> Result<Vec<Sale>, StoreError> {
        let tables = self.inner.read()?;
        let mut sales: Vec<Sale> = tables
            .sales
            .values()
            .filter(|s| s.car_id == car_id)
            .cloned()
            .collect();
        sales.sort_by_key(|s| (s.created_at, s.id));
        Ok(sales)
    }

    async fn count_cars(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read()?.cars.len() as u64)
    }

    async fn sales_totals_since(&self, since: DateTime<Utc>) -> Result<SalesTotals, StoreError> {
        let tables = self.inner.read()?;
        let totals = tables
            .sales
            .values()
            .filter(|s| s.created_at >= since && s.status.is_revenue())
            .fold(SalesTotals::default(), |acc, s| SalesTotals {
                count: acc.count + 1,
                revenue: acc.revenue + s.amount.amount(),
            });
        Ok(totals)
    }

    async fn low_stock_cars(&self, limit: usize) -> Result<Vec<Car>, StoreError> {
        let tables = self.inner.read()?;
        let mut cars: Vec<Car> = tables
            .cars
            .values()
            .filter(|c| is_low_stock(c.in_stock))
            .cloned()
            .collect();
        cars.sort_by(|a, b| a.in_stock.cmp(&b.in_stock).then_with(|| a.name.cmp(&b.name)));
        cars.truncate(limit);
        Ok(cars)
    }

    async fn list_sales(&self, offset: u64, limit: usize) -> Result<Vec<SaleRecord>, StoreError> {
        let tables = self.inner.read()?;
        let mut sales: Vec<&Sale> = tables.sales.values().collect();
        sales.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        sales
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit)
            .map(|s| tables.record(s, None))
            .collect()
    }

    async fn count_sales(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read()?.sales.len() as u64)
    }
}

#[async_trait]
impl TransactionCoordinator for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(InMemoryTransaction {
            inner: Arc::clone(&self.inner),
            guards: HashMap::new(),
            cars: HashMap::new(),
            sales: HashMap::new(),
        })
    }
}

/// A unit of work against [`InMemoryStore`].
///
/// Holds the row locks it acquired until commit, rollback, or drop.
pub struct InMemoryTransaction {
    inner: Arc<Inner>,
    guards: HashMap<RowKey, RowGuard>,
    cars: HashMap<CarId, Car>,
    sales: HashMap<SaleId, Sale>,
}

impl core::fmt::Debug for InMemoryTransaction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryTransaction")
            .field("locked_rows", &self.guards.keys().collect::<Vec<_>>())
            .field("staged_cars", &self.cars.len())
            .field("staged_sales", &self.sales.len())
            .finish()
    }
}

impl InMemoryTransaction {
    async fn lock(&mut self, key: RowKey) -> Result<(), StoreError> {
        if !self.guards.contains_key(&key) {
            let guard = self.inner.lock_row(key).await?;
            self.guards.insert(key, guard);
        }
        Ok(())
    }

    /// Lock a car row and return its latest state as seen by this transaction.
    async fn locked_car(&mut self, id: CarId) -> Result<Car, StoreError> {
        self.lock(RowKey::Car(id)).await?;
        if let Some(car) = self.cars.get(&id) {
            return Ok(car.clone());
        }
        self.inner
            .read()?
            .cars
            .get(&id)
            .cloned()
            .ok_or(StoreError::not_found("car"))
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn decrement_if_available(&mut self, car_id: CarId, by: u32) -> Result<u32, StoreError> {
        let mut car = self.locked_car(car_id).await?;
        car.in_stock = checked_decrement(car.in_stock, by)?;
        car.updated_at = Utc::now();
        let remaining = car.in_stock;
        self.cars.insert(car_id, car);
        Ok(remaining)
    }

    async fn increment_stock(&mut self, car_id: CarId, by: u32) -> Result<u32, StoreError> {
        let mut car = self.locked_car(car_id).await?;
        car.in_stock = checked_increment(car.in_stock, by)?;
        car.updated_at = Utc::now();
        let total = car.in_stock;
        self.cars.insert(car_id, car);
        Ok(total)
    }

    async fn lock_car(&mut self, id: CarId) -> Result<Car, StoreError> {
        self.locked_car(id).await
    }

    async fn update_car_details(&mut self, car: &Car) -> Result<(), StoreError> {
        let mut staged = self.locked_car(car.id).await?;
        staged.name.clone_from(&car.name);
        staged.brand.clone_from(&car.brand);
        staged.model.clone_from(&car.model);
        staged.category.clone_from(&car.category);
        staged.year = car.year;
        staged.price = car.price;
        staged.description.clone_from(&car.description);
        staged.featured = car.featured;
        staged.updated_at = car.updated_at;
        self.cars.insert(car.id, staged);
        Ok(())
    }

    async fn insert_sale(&mut self, sale: NewSale) -> Result<Sale, StoreError> {
        // Referencing a car pins it against concurrent deletion.
        self.locked_car(sale.car_id).await?;
        let known_user = self.inner.read()?.users.contains_key(&sale.salesperson_id);
        if !known_user {
            return Err(StoreError::not_found("user"));
        }

        let sale = Sale::create(sale, Utc::now());
        self.lock(RowKey::Sale(sale.id)).await?;
        self.sales.insert(sale.id, sale.clone());
        Ok(sale)
    }

    async fn lock_sale(&mut self, id: SaleId) -> Result<Sale, StoreError> {
        self.lock(RowKey::Sale(id)).await?;
        if let Some(sale) = self.sales.get(&id) {
            return Ok(sale.clone());
        }
        self.inner
            .read()?
            .sales
            .get(&id)
            .cloned()
            .ok_or(StoreError::not_found("sale"))
    }

    async fn set_sale_status(&mut self, id: SaleId, status: SaleStatus) -> Result<Sale, StoreError> {
        let mut sale = self.lock_sale(id).await?;
        sale.status = status;
        sale.updated_at = Utc::now();
        self.sales.insert(id, sale.clone());
        Ok(sale)
    }

    async fn sale_record(&mut self, id: SaleId) -> Result<SaleRecord, StoreError> {
        let tables = self.inner.read()?;
        let sale = self
            .sales
            .get(&id)
            .or_else(|| tables.sales.get(&id))
            .ok_or(StoreError::not_found("sale"))?;
        tables.record(sale, self.cars.get(&sale.car_id))
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        {
            let mut tables = self.inner.write()?;
            for (id, car) in self.cars.drain() {
                tables.cars.insert(id, car);
            }
            for (id, sale) in self.sales.drain() {
                tables.sales.insert(id, sale);
            }
        }
        self.guards.clear();
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use showroom_auth::Role;
    use showroom_core::Money;

    fn test_car(in_stock: u32) -> Car {
        let now = Utc::now();
        Car {
            id: CarId::new(),
            name: "Toyota Camry".into(),
            brand: "Toyota".into(),
            model: "Camry".into(),
            category: "Sedan".into(),
            year: 2022,
            price: Money::new(Decimal::new(12_000_000, 0)).unwrap(),
            description: None,
            in_stock,
            featured: false,
            added_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn test_user() -> StaffUser {
        StaffUser::new("sales", "sales@jajiautos.ng", "John", "Doe", Role::SALES_PERSONNEL).unwrap()
    }

    fn test_sale(car_id: CarId, salesperson_id: UserId) -> NewSale {
        NewSale {
            car_id,
            salesperson_id,
            customer_name: "Ada Obi".into(),
            customer_email: "ada@example.com".into(),
            customer_phone: None,
            amount: Money::new(Decimal::new(1000, 0)).unwrap(),
            payment_method: "cash".into(),
            status: SaleStatus::Completed,
            notes: None,
        }
    }

    #[tokio::test]
    async fn staged_writes_are_invisible_until_commit() {
        let store = InMemoryStore::new();
        let car = test_car(2);
        let user = test_user();
        store.insert_car(&car).await.unwrap();
        store.insert_user(&user).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let sale = tx.insert_sale(test_sale(car.id, user.id)).await.unwrap();
        assert_eq!(tx.decrement_if_available(car.id, 1).await.unwrap(), 1);

        // read-your-writes inside, nothing outside
        assert_eq!(tx.sale_record(sale.id).await.unwrap().sale.id, sale.id);
        assert_eq!(store.find_car_by_id(car.id).await.unwrap().unwrap().in_stock, 2);
        assert!(store.find_sale_record(sale.id).await.unwrap().is_none());

        tx.commit().await.unwrap();
        assert_eq!(store.find_car_by_id(car.id).await.unwrap().unwrap().in_stock, 1);
        assert!(store.find_sale_record(sale.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_no_trace() {
        let store = InMemoryStore::new();
        let car = test_car(1);
        let user = test_user();
        store.insert_car(&car).await.unwrap();
        store.insert_user(&user).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_sale(test_sale(car.id, user.id)).await.unwrap();
            tx.decrement_if_available(car.id, 1).await.unwrap();
        }

        assert_eq!(store.find_car_by_id(car.id).await.unwrap().unwrap().in_stock, 1);
        assert!(store.sales_for_car(car.id).await.unwrap().is_empty());

        // and the row lock was released
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.decrement_if_available(car.id, 1).await.unwrap(), 0);
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn decrement_refuses_to_go_negative() {
        let store = InMemoryStore::new();
        let car = test_car(1);
        store.insert_car(&car).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(
            tx.decrement_if_available(car.id, 2).await,
            Err(StoreError::OutOfStock {
                requested: 2,
                available: 1
            })
        );
        assert_eq!(
            tx.decrement_if_available(CarId::new(), 1).await,
            Err(StoreError::not_found("car"))
        );
    }

    #[tokio::test]
    async fn held_row_lock_times_out_as_conflict() {
        let store = InMemoryStore::with_lock_timeout(Duration::from_millis(50));
        let car = test_car(5);
        store.insert_car(&car).await.unwrap();

        let mut holder = store.begin().await.unwrap();
        holder.decrement_if_available(car.id, 1).await.unwrap();

        let mut waiter = store.begin().await.unwrap();
        match waiter.decrement_if_available(car.id, 1).await {
            Err(StoreError::Conflict(msg)) => assert!(msg.contains("lock wait timeout")),
            other => panic!("expected Conflict, got {other:?}"),
        }
        holder.commit().await.unwrap();
    }

    #[tokio::test]
    async fn insert_sale_requires_existing_salesperson() {
        let store = InMemoryStore::new();
        let car = test_car(1);
        store.insert_car(&car).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(
            tx.insert_sale(test_sale(car.id, UserId::new())).await,
            Err(StoreError::not_found("user"))
        );
    }

    #[tokio::test]
    async fn delete_car_cascades_to_sales() {
        let store = InMemoryStore::new();
        let car = test_car(3);
        let user = test_user();
        store.insert_car(&car).await.unwrap();
        store.insert_user(&user).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let sale = tx.insert_sale(test_sale(car.id, user.id)).await.unwrap();
        tx.commit().await.unwrap();

        store.delete_car(car.id).await.unwrap();
        assert!(store.find_car_by_id(car.id).await.unwrap().is_none());
        assert!(store.find_sale_record(sale.id).await.unwrap().is_none());
        assert_eq!(store.delete_car(car.id).await, Err(StoreError::not_found("car")));
    }

    #[tokio::test]
    async fn lock_table_empties_once_transactions_end() {
        let store = InMemoryStore::with_lock_timeout(Duration::from_millis(50));
        let car = test_car(600);
        let user = test_user();
        store.insert_car(&car).await.unwrap();
        store.insert_user(&user).await.unwrap();

        for _ in 0..500 {
            let mut tx = store.begin().await.unwrap();
            tx.insert_sale(test_sale(car.id, user.id)).await.unwrap();
            tx.decrement_if_available(car.id, 1).await.unwrap();
            tx.commit().await.unwrap();
        }
        assert_eq!(store.tracked_row_locks(), 0);

        // rolled back, dropped, and timed-out waiters leave nothing behind either
        let mut rolled_back = store.begin().await.unwrap();
        rolled_back.decrement_if_available(car.id, 1).await.unwrap();
        rolled_back.rollback().await.unwrap();
        {
            let mut dropped = store.begin().await.unwrap();
            dropped.insert_sale(test_sale(car.id, user.id)).await.unwrap();
        }
        assert_eq!(store.tracked_row_locks(), 0);

        let mut holder = store.begin().await.unwrap();
        holder.increment_stock(car.id, 1).await.unwrap();
        let mut waiter = store.begin().await.unwrap();
        assert!(matches!(
            waiter.decrement_if_available(car.id, 1).await,
            Err(StoreError::Conflict(_))
        ));
        drop(waiter);
        assert_eq!(store.tracked_row_locks(), 1);
        holder.commit().await.unwrap();
        assert_eq!(store.tracked_row_locks(), 0);

        store.delete_car(car.id).await.unwrap();
        assert_eq!(store.tracked_row_locks(), 0);
    }

    #[tokio::test]
    async fn duplicate_users_violate_constraints() {
        let store = InMemoryStore::new();
        let user = test_user();
        store.insert_user(&user).await.unwrap();

        let mut twin = test_user();
        twin.id = UserId::new();
        twin.username = "other".into();
        assert_eq!(
            store.insert_user(&twin).await,
            Err(StoreError::Duplicate { field: "email" })
        );
        twin.email = "other@jajiautos.ng".into();
        twin.username = user.username.clone();
        assert_eq!(
            store.insert_user(&twin).await,
            Err(StoreError::Duplicate { field: "username" })
        );
        assert_eq!(
            store.find_user_by_email("SALES@jajiautos.ng").await.unwrap().map(|u| u.id),
            Some(user.id)
        );
    }

    #[tokio::test]
    async fn sales_page_newest_first_with_offset() {
        let store = InMemoryStore::new();
        let car = test_car(10);
        let user = test_user();
        store.insert_car(&car).await.unwrap();
        store.insert_user(&user).await.unwrap();

        let mut ids = Vec::new();
        for _ in 0..5 {
            let mut tx = store.begin().await.unwrap();
            ids.push(tx.insert_sale(test_sale(car.id, user.id)).await.unwrap().id);
            tx.commit().await.unwrap();
        }
        ids.reverse();

        let page: Vec<SaleId> = store
            .list_sales(1, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.sale.id)
            .collect();
        assert_eq!(page, ids[1..3]);
        assert_eq!(store.count_sales().await.unwrap(), 5);
        assert!(store.list_sales(5, 2).await.unwrap().is_empty());
        assert!(store.list_sales(u64::MAX, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn catalogue_update_keeps_stock_moved_by_the_same_transaction() {
        let store = InMemoryStore::new();
        let car = test_car(4);
        store.insert_car(&car).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let mut edited = tx.lock_car(car.id).await.unwrap();
        tx.decrement_if_available(car.id, 1).await.unwrap();
        edited.name = "Toyota Camry XSE".into();
        edited.in_stock = 99;
        tx.update_car_details(&edited).await.unwrap();
        tx.commit().await.unwrap();

        let stored = store.find_car_by_id(car.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Toyota Camry XSE");
        assert_eq!(stored.in_stock, 3);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.lock_car(CarId::new()).await, Err(StoreError::not_found("car")));
    }

    #[tokio::test]
    async fn low_stock_uses_the_dashboard_threshold() {
        let store = InMemoryStore::new();
        for stock in [0, 2, 3] {
            store.insert_car(&test_car(stock)).await.unwrap();
        }
        let low: Vec<u32> = store
            .low_stock_cars(10)
            .await
            .unwrap()
            .iter()
            .map(|c| c.in_stock)
            .collect();
        assert_eq!(low, vec![0, 2]);
    }
}
