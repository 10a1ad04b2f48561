use serde::{Deserialize, Serialize};

use showroom_core::{DomainError, DomainResult, Entity, FieldViolation, UserId, validate};

use crate::Role;

// ─────────────────────────────────────────────────────────────────────────────
// Staff user
// ─────────────────────────────────────────────────────────────────────────────

/// A member of the dealership staff. Credentials live with the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
}

impl Entity for StaffUser {
    type Id = UserId;
    const NAME: &'static str = "user";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl StaffUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: Role,
    ) -> DomainResult<Self> {
        let user = Self {
            id: UserId::new(),
            username: username.into().trim().to_string(),
            email: email.into().trim().to_lowercase(),
            first_name: first_name.into().trim().to_string(),
            last_name: last_name.into().trim().to_string(),
            role,
            is_active: true,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut out: Vec<FieldViolation> = Vec::new();
        validate::require_non_empty(&mut out, "username", &self.username);
        validate::require_email(&mut out, "email", &self.email);
        validate::require_non_empty(&mut out, "firstName", &self.first_name);
        validate::require_non_empty(&mut out, "lastName", &self.last_name);
        DomainError::check(out)
    }

    pub fn summary(&self) -> StaffSummary {
        StaffSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// Request to open a staff account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewStaffUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl NewStaffUser {
    /// Validate every field, the role included, and mint an active account.
    pub fn into_user(self) -> DomainResult<StaffUser> {
        let role_ok = self.role.is_assignable();
        match StaffUser::new(self.username, self.email, self.first_name, self.last_name, self.role) {
            Ok(user) if role_ok => Ok(user),
            Ok(_) => Err(DomainError::field("role", "is not a staff role")),
            Err(DomainError::Validation(mut v)) => {
                if !role_ok {
                    v.push(FieldViolation::new("role", "is not a staff role"));
                }
                Err(DomainError::Validation(v))
            }
            Err(other) => Err(other),
        }
    }
}

/// Salesperson projection embedded in sale records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSummary {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_email_and_starts_active() {
        let u = StaffUser::new("sales", " Sales@JajiAutos.ng ", "John", "Doe", Role::SALES_PERSONNEL)
            .unwrap();
        assert_eq!(u.email, "sales@jajiautos.ng");
        assert!(u.is_active);
        assert_eq!(u.summary().first_name, "John");
    }

    fn request(role: Role) -> NewStaffUser {
        NewStaffUser {
            username: "tunde".into(),
            email: "Tunde@JajiAutos.ng".into(),
            first_name: "Tunde".into(),
            last_name: "Bello".into(),
            role,
        }
    }

    #[test]
    fn staff_request_mints_an_active_account() {
        let u = request(Role::INVENTORY_MANAGER).into_user().unwrap();
        assert_eq!(u.email, "tunde@jajiautos.ng");
        assert_eq!(u.role, Role::INVENTORY_MANAGER);
        assert!(u.is_active);
    }

    #[test]
    fn staff_request_rejects_unknown_roles_alongside_other_fields() {
        let err = request(Role::new("CUSTOMER")).into_user().unwrap_err();
        assert_eq!(err, DomainError::field("role", "is not a staff role"));

        let mut bad = request(Role::new("CUSTOMER"));
        bad.email = "nope".into();
        match bad.into_user().unwrap_err() {
            DomainError::Validation(v) => {
                let fields: Vec<_> = v.iter().map(|f| f.field).collect();
                assert_eq!(fields, vec!["email", "role"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn staff_request_refuses_extra_fields() {
        let json = r#"{"username":"a","email":"a@b.ng","firstName":"A","lastName":"B","role":"SALES_PERSONNEL","isActive":false}"#;
        assert!(serde_json::from_str::<NewStaffUser>(json).is_err());
    }

    #[test]
    fn new_reports_every_bad_field() {
        let err = StaffUser::new("", "nope", "", "Doe", Role::SALES_PERSONNEL).unwrap_err();
        match err {
            DomainError::Validation(v) => {
                let fields: Vec<_> = v.iter().map(|f| f.field).collect();
                assert_eq!(fields, vec!["username", "email", "firstName"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
