use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// Roles stay opaque strings so tokens minted by older gates keep working;
/// the dealership's three well-known roles are provided as constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const SUPER_ADMIN: Role = Role(Cow::Borrowed("SUPER_ADMIN"));
    pub const SALES_PERSONNEL: Role = Role(Cow::Borrowed("SALES_PERSONNEL"));
    pub const INVENTORY_MANAGER: Role = Role(Cow::Borrowed("INVENTORY_MANAGER"));

    /// Roles a staff account may be created with.
    pub const ASSIGNABLE: [Role; 3] = [Role::SUPER_ADMIN, Role::SALES_PERSONNEL, Role::INVENTORY_MANAGER];

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_assignable(&self) -> bool {
        Self::ASSIGNABLE.contains(self)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
