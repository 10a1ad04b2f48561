use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque dotted strings (e.g. "sales.record"). The wildcard
/// `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const ALL: Permission = Permission(Cow::Borrowed("*"));
    pub const SALES_RECORD: Permission = Permission(Cow::Borrowed("sales.record"));
    pub const SALES_CANCEL: Permission = Permission(Cow::Borrowed("sales.cancel"));
    pub const SALES_READ: Permission = Permission(Cow::Borrowed("sales.read"));
    pub const CARS_CREATE: Permission = Permission(Cow::Borrowed("inventory.cars.create"));
    pub const CARS_UPDATE: Permission = Permission(Cow::Borrowed("inventory.cars.update"));
    pub const CARS_RESTOCK: Permission = Permission(Cow::Borrowed("inventory.cars.restock"));
    pub const CARS_DELETE: Permission = Permission(Cow::Borrowed("inventory.cars.delete"));
    pub const DASHBOARD_READ: Permission = Permission(Cow::Borrowed("dashboard.read"));
    pub const USERS_CREATE: Permission = Permission(Cow::Borrowed("users.create"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
