use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use showroom_core::UserId;

use crate::{validate_claims, JwtClaims, Role, TokenValidationError};

/// A fully resolved principal for authorization decisions.
///
/// Construction is decoupled from storage and transport: the gate derives a
/// principal from validated claims and hands it to the services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub principal_id: UserId,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn new(principal_id: UserId, roles: Vec<Role>) -> Self {
        Self { principal_id, roles }
    }

    /// Build a principal from decoded claims, rejecting tokens outside their window.
    pub fn from_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<Self, TokenValidationError> {
        validate_claims(claims, now)?;
        Ok(Self {
            principal_id: claims.sub,
            roles: claims.roles.clone(),
        })
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn from_claims_carries_subject_and_roles() {
        let now = Utc::now();
        let sub = UserId::new();
        let claims = JwtClaims {
            sub,
            roles: vec![Role::INVENTORY_MANAGER],
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::hours(1),
        };

        let p = Principal::from_claims(&claims, now).unwrap();
        assert_eq!(p.principal_id, sub);
        assert!(p.has_role(&Role::INVENTORY_MANAGER));
        assert!(!p.has_role(&Role::SUPER_ADMIN));
    }

    #[test]
    fn from_claims_rejects_expired_token() {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: UserId::new(),
            roles: vec![Role::SUPER_ADMIN],
            issued_at: now - Duration::hours(2),
            expires_at: now - Duration::hours(1),
        };
        assert_eq!(
            Principal::from_claims(&claims, now),
            Err(TokenValidationError::Expired)
        );
    }
}
