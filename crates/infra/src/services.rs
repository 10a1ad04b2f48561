//! Service wiring and the authorized entry points callers use.

use chrono::Utc;
use tracing::instrument;

use showroom_auth::{authorize, NewStaffUser, Permission, Principal, StaffUser};
use showroom_core::{CarId, PageRequest, SaleId};
use showroom_inventory::{Car, CarUpdate, NewCar};
use showroom_sales::{RecordSale, SaleRecord};

use crate::config::{StoreBackend, StoreConfig};
use crate::dashboard::{Dashboard, DashboardOverview};
use crate::error::ServiceResult;
use crate::ledger::InventoryLedger;
use crate::sale_recorder::{SaleRecorder, SalesPage};
use crate::store::{InMemoryStore, InventoryStore, PostgresStore, StoreError, TransactionCoordinator};

/// The dealership core behind the authentication gate.
///
/// Every operation checks the principal's permissions before touching the
/// store. The acting principal is the salesperson of any sale it records.
#[derive(Debug, Clone)]
pub struct Showroom<S> {
    store: S,
    ledger: InventoryLedger<S>,
    recorder: SaleRecorder<S>,
    dashboard: Dashboard<S>,
}

impl<S> Showroom<S>
where
    S: InventoryStore + TransactionCoordinator + Clone,
{
    pub fn new(store: S) -> Self {
        Self {
            ledger: InventoryLedger::new(store.clone()),
            recorder: SaleRecorder::new(store.clone()),
            dashboard: Dashboard::new(store.clone()),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn record_sale(
        &self,
        principal: &Principal,
        request: &RecordSale,
    ) -> ServiceResult<SaleRecord> {
        authorize(principal, &Permission::SALES_RECORD)?;
        self.recorder
            .record_sale(request, principal.principal_id)
            .await
    }

    pub async fn cancel_sale(
        &self,
        principal: &Principal,
        sale_id: SaleId,
    ) -> ServiceResult<SaleRecord> {
        authorize(principal, &Permission::SALES_CANCEL)?;
        self.recorder.cancel_sale(sale_id).await
    }

    pub async fn find_sale(&self, principal: &Principal, sale_id: SaleId) -> ServiceResult<SaleRecord> {
        authorize(principal, &Permission::SALES_READ)?;
        self.recorder.find_sale(sale_id).await
    }

    /// Page through all sales, newest first. `page` and `limit` default to 1 and 20.
    pub async fn list_sales(
        &self,
        principal: &Principal,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> ServiceResult<SalesPage> {
        authorize(principal, &Permission::SALES_READ)?;
        self.recorder.list_sales(PageRequest::new(page, limit)?).await
    }

    #[instrument(skip(self, principal, new_car), fields(principal_id = %principal.principal_id), err)]
    pub async fn add_car(&self, principal: &Principal, new_car: NewCar) -> ServiceResult<Car> {
        authorize(principal, &Permission::CARS_CREATE)?;
        let car = new_car.into_car(Some(principal.principal_id), Utc::now())?;
        self.store.insert_car(&car).await?;
        tracing::info!(car_id = %car.id, in_stock = car.in_stock, "car added");
        Ok(car)
    }

    #[instrument(skip(self, principal, update), fields(principal_id = %principal.principal_id), err)]
    pub async fn update_car(
        &self,
        principal: &Principal,
        car_id: CarId,
        update: CarUpdate,
    ) -> ServiceResult<Car> {
        authorize(principal, &Permission::CARS_UPDATE)?;
        self.ledger.update_car(car_id, update, Utc::now()).await
    }

    #[instrument(skip(self, principal), fields(principal_id = %principal.principal_id), err)]
    pub async fn remove_car(&self, principal: &Principal, car_id: CarId) -> ServiceResult<()> {
        authorize(principal, &Permission::CARS_DELETE)?;
        self.store.delete_car(car_id).await?;
        tracing::info!(car_id = %car_id, "car removed with its sales");
        Ok(())
    }

    pub async fn restock(&self, principal: &Principal, car_id: CarId, by: u32) -> ServiceResult<u32> {
        authorize(principal, &Permission::CARS_RESTOCK)?;
        self.ledger.restock(car_id, by).await
    }

    pub async fn stock_of(&self, principal: &Principal, car_id: CarId) -> ServiceResult<u32> {
        authorize(principal, &Permission::DASHBOARD_READ)?;
        self.ledger.stock_of(car_id).await
    }

    /// Open a staff account. The store's unique keys reject a taken email or username.
    #[instrument(skip(self, principal, request), fields(principal_id = %principal.principal_id), err)]
    pub async fn create_staff(
        &self,
        principal: &Principal,
        request: NewStaffUser,
    ) -> ServiceResult<StaffUser> {
        authorize(principal, &Permission::USERS_CREATE)?;
        let user = request.into_user()?;
        self.store.insert_user(&user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "staff account created");
        Ok(user)
    }

    pub async fn dashboard(
        &self,
        principal: &Principal,
        days: Option<u32>,
    ) -> ServiceResult<DashboardOverview> {
        authorize(principal, &Permission::DASHBOARD_READ)?;
        self.dashboard.overview(days).await
    }
}

/// Services wired against the configured backend.
#[derive(Debug, Clone)]
pub enum ShowroomServices {
    InMemory(Showroom<InMemoryStore>),
    Postgres(Showroom<PostgresStore>),
}

/// Build services for `config`. The Postgres schema is applied on the way up.
pub async fn build_services(config: &StoreConfig) -> Result<ShowroomServices, StoreError> {
    match &config.backend {
        StoreBackend::Memory => {
            tracing::info!("using in-memory store");
            Ok(ShowroomServices::InMemory(Showroom::new(
                InMemoryStore::with_lock_timeout(config.lock_timeout),
            )))
        }
        StoreBackend::Postgres { database_url } => {
            let store =
                PostgresStore::connect(database_url, config.max_connections, config.lock_timeout)
                    .await?;
            store.migrate().await?;
            tracing::info!(max_connections = config.max_connections, "using postgres store");
            Ok(ShowroomServices::Postgres(Showroom::new(store)))
        }
    }
}
