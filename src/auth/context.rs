use crate::auth::rbac::{Permission, Role};
use crate::auth::session::UserSession;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity attached to every authenticated request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<Uuid>, // None for API keys
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
    pub is_api_key: bool,
}

impl UserContext {
    pub fn from_session(session: &UserSession) -> Self {
        Self {
            user_id: Some(session.user_id),
            email: Some(session.email.clone()),
            name: Some(session.name.clone()),
            role: session.role,
            is_api_key: false,
        }
    }

    pub fn new_api_key() -> Self {
        // API keys are service credentials with full access
        Self {
            user_id: None,
            email: None,
            name: None,
            role: Role::Admin,
            is_api_key: true,
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require(&self, permission: Permission) -> Result<(), ApiError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ApiError::authorization(format!(
                "Permission {:?} required",
                permission
            )))
        }
    }

    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("api key")
    }
}
