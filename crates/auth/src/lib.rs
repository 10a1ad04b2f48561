//! `showroom-auth`: the authentication-gate boundary.
//!
//! Token issuance and signature verification happen elsewhere; this crate turns
//! already-decoded claims into a [`Principal`] and answers "may this principal
//! do X". It is decoupled from transport and storage.

pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod user;

pub use authorize::{authorize, permissions_for_roles, AuthzError};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use permissions::Permission;
pub use principal::Principal;
pub use roles::Role;
pub use user::{NewStaffUser, StaffSummary, StaffUser};
