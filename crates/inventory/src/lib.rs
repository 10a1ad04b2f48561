//! Inventory domain module.
//!
//! Business rules for the car catalogue and its stock counts, implemented as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod car;
pub mod stock;

pub use car::{Car, CarSummary, CarUpdate, NewCar};
pub use stock::{checked_decrement, checked_increment, is_low_stock, LOW_STOCK_THRESHOLD};
