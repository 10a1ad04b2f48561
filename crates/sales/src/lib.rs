//! Sales domain module.
//!
//! Sale records, their lifecycle, and validation of incoming sale requests.
//! Pure domain logic: atomic pairing with the stock decrement is the store's job.

pub mod record;
pub mod sale;

pub use record::{RecordSale, SaleRecord};
pub use sale::{NewSale, Sale, SaleStatus};
