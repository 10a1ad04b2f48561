//! Infrastructure layer: data stores, transactional services, config.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod ledger;
pub mod sale_recorder;
pub mod services;
pub mod store;


#[cfg(test)]
mod testing;

pub use config::{ConfigError, StoreBackend, StoreConfig};
pub use dashboard::{Dashboard, DashboardOverview, DashboardSummary, LowStockCar};
pub use error::{ErrorKind, SaleError, ServiceResult};
pub use ledger::InventoryLedger;
pub use sale_recorder::{SaleRecorder, SalesPage};
pub use services::{build_services, Showroom, ShowroomServices};
pub use store::{
    InMemoryStore, InventoryStore, PostgresStore, SalesTotals, StoreError, StoreTransaction,
    TransactionCoordinator,
};
