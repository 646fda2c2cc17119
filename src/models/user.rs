use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{auth::Role, error::ApiError, utils::verify_password};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Stored role; unknown values degrade to the least privileged role
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::User)
    }

    pub fn check_password(&self, password: &str) -> Result<bool, ApiError> {
        verify_password(password, &self.password_hash)
    }

    pub fn created_as_string(&self) -> String {
        crate::utils::format_local(&self.created_at)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl UserCreate {
    pub fn normalized(self) -> Self {
        Self {
            email: self.email.trim().to_lowercase(),
            name: self.name.trim().to_string(),
            password: self.password,
            role: self.role,
        }
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let valid_email = self
            .email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(ApiError::validation(format!(
                "Invalid email address '{}'",
                self.email
            )));
        }
        if self.name.is_empty() {
            return Err(ApiError::validation("Name cannot be empty"));
        }
        if self.password.chars().count() < 8 {
            return Err(ApiError::validation(
                "Password must be at least 8 characters",
            ));
        }
        Ok(())
    }
}
