use thiserror::Error;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Static role policy for the dealership.
///
/// SUPER_ADMIN holds the wildcard. Cancelling a sale and creating staff
/// accounts are reserved to it.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    let mut out: Vec<Permission> = Vec::new();
    for role in roles {
        match role.as_str() {
            "SUPER_ADMIN" => out.push(Permission::ALL),
            "SALES_PERSONNEL" => {
                out.push(Permission::SALES_RECORD);
                out.push(Permission::SALES_READ);
                out.push(Permission::DASHBOARD_READ);
            }
            "INVENTORY_MANAGER" => {
                out.push(Permission::SALES_RECORD);
                out.push(Permission::SALES_READ);
                out.push(Permission::DASHBOARD_READ);
                out.push(Permission::CARS_CREATE);
                out.push(Permission::CARS_UPDATE);
                out.push(Permission::CARS_RESTOCK);
                out.push(Permission::CARS_DELETE);
            }
            _ => {}
        }
    }
    out.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    out.dedup();
    out
}

/// Authorize a principal against the static role policy.
///
/// No IO, no panics.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = permissions_for_roles(&principal.roles);

    if granted.iter().any(|p| p.is_wildcard() || p == required) {
        Ok(())
    } else {
        tracing::debug!(
            principal_id = %principal.principal_id,
            permission = %required,
            "authorization denied"
        );
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
