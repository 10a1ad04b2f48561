//! `showroom-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod page;
pub mod validate;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, FieldViolation};
pub use id::{CarId, SaleId, UserId};
pub use page::{PageRequest, Pagination};
pub use value_object::Money;
