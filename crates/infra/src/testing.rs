//! Shared fixtures for this crate's tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use showroom_auth::{Principal, Role, StaffUser};
use showroom_core::{CarId, SaleId};
use showroom_inventory::{Car, NewCar};
use showroom_sales::{RecordSale, Sale, SaleRecord};

use crate::services::Showroom;
use crate::store::{
    InMemoryStore, InventoryStore, SalesTotals, StoreError, TransactionCoordinator,
};

pub struct TestFixture {
    pub store: InMemoryStore,
    pub showroom: Showroom<InMemoryStore>,
    pub admin: Principal,
    pub sales: Principal,
    pub manager: Principal,
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_store(InMemoryStore::new()).await
    }

    pub async fn with_store(store: InMemoryStore) -> Self {
        let admin = seed_user(&store, "superadmin", "admin@jajiautos.ng", Role::SUPER_ADMIN).await;
        let sales = seed_user(&store, "salesperson", "sales@jajiautos.ng", Role::SALES_PERSONNEL).await;
        let manager = seed_user(
            &store,
            "inventorymanager",
            "inventory@jajiautos.ng",
            Role::INVENTORY_MANAGER,
        )
        .await;

        Self {
            showroom: Showroom::new(store.clone()),
            store,
            admin,
            sales,
            manager,
        }
    }
}

async fn seed_user(store: &InMemoryStore, username: &str, email: &str, role: Role) -> Principal {
    let user = StaffUser::new(username, email, "Test", username, role.clone()).unwrap();
    store.insert_user(&user).await.unwrap();
    Principal::new(user.id, vec![role])
}

pub fn new_car(in_stock: u32) -> NewCar {
    NewCar {
        name: "Mercedes-Benz GLE 450".into(),
        brand: "Mercedes-Benz".into(),
        model: "GLE 450".into(),
        category: "Luxury SUV".into(),
        year: 2023,
        price: Decimal::new(45_000_000, 0),
        description: None,
        in_stock,
        featured: false,
    }
}

pub async fn seed_car<S: InventoryStore>(store: &S, in_stock: u32) -> Car {
    let car = new_car(in_stock).into_car(None, Utc::now()).unwrap();
    store.insert_car(&car).await.unwrap();
    car
}

pub fn sale_request(car_id: CarId) -> RecordSale {
    RecordSale {
        car_id: car_id.to_string(),
        customer_name: "Ada Obi".into(),
        customer_email: "ada@example.com".into(),
        customer_phone: Some("+2348000000000".into()),
        amount: Decimal::new(1000, 0),
        payment_method: "bank transfer".into(),
        notes: None,
    }
}

/// Store wrapper counting every call that reaches the backend.
#[derive(Debug, Clone)]
pub struct CountingStore {
    inner: InMemoryStore,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl InventoryStore for CountingStore {
    async fn find_car_by_id(&self, id: CarId) -> Result<Option<Car>, StoreError> {
        self.hit();
        self.inner.find_car_by_id(id).await
    }

    async fn insert_car(&self, car: &Car) -> Result<(), StoreError> {
        self.hit();
        self.inner.insert_car(car).await
    }

    async fn delete_car(&self, id: CarId) -> Result<(), StoreError> {
        self.hit();
        self.inner.delete_car(id).await
    }

    async fn insert_user(&self, user: &StaffUser) -> Result<(), StoreError> {
        self.hit();
        self.inner.insert_user(user).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<StaffUser>, StoreError> {
        self.hit();
        self.inner.find_user_by_email(email).await
    }

    async fn find_sale_record(&self, id: SaleId) -> Result<Option<SaleRecord>, StoreError> {
        self.hit();
        self.inner.find_sale_record(id).await
    }

    async fn sales_for_car(&self, car_id: CarId) -> Result<Vec<Sale>, StoreError> {
        self.hit();
        self.inner.sales_for_car(car_id).await
    }

    async fn count_cars(&self) -> Result<u64, StoreError> {
        self.hit();
        self.inner.count_cars().await
    }

    async fn sales_totals_since(&self, since: DateTime<Utc>) -> Result<SalesTotals, StoreError> {
        self.hit();
        self.inner.sales_totals_since(since).await
    }

    async fn low_stock_cars(&self, limit: usize) -> Result<Vec<Car>, StoreError> {
        self.hit();
        self.inner.low_stock_cars(limit).await
    }

    async fn list_sales(&self, offset: u64, limit: usize) -> Result<Vec<SaleRecord>, StoreError> {
        self.hit();
        self.inner.list_sales(offset, limit).await
    }

    async fn count_sales(&self) -> Result<u64, StoreError> {
        self.hit();
        self.inner.count_sales().await
    }
}

#[async_trait]
impl TransactionCoordinator for CountingStore {
    type Tx = <InMemoryStore as TransactionCoordinator>::Tx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        self.hit();
        self.inner.begin().await
    }
}
