use std::sync::Arc;

use uuid::Uuid;

use crate::{
    auth::{Role, UserSession},
    config::Settings,
    error::ApiError,
    models::{User, UserCreate},
    repositories::UserRepository,
    utils::hash_password,
};

pub struct AuthService {
    settings: Arc<Settings>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl AuthService {
    pub fn new(settings: Arc<Settings>, user_repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self {
            settings,
            user_repo,
        }
    }

    pub async fn login_local(&self, email: &str, password: &str) -> Result<UserSession, ApiError> {
        let email = email.trim().to_lowercase();
        let user = match self.user_repo.find_by_email(&email).await? {
            Some(u) => u,
            None => {
                return Err(ApiError::Authentication(
                    "Invalid email or password".to_string(),
                ))
            }
        };

        if !user.check_password(password)? {
            return Err(ApiError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        tracing::info!(user_id = %user.id, "user logged in");
        Ok(self.create_session(&user))
    }

    pub fn create_session(&self, user: &User) -> UserSession {
        UserSession::new(
            user.id,
            user.email.clone(),
            user.name.clone(),
            user.role(),
            self.settings.auth_session_expiry_seconds,
        )
    }

    pub async fn create_user(&self, user: UserCreate) -> Result<User, ApiError> {
        let user = user.normalized();
        user.validate()?;

        let password_hash = hash_password(&user.password)?;
        let role = user.role.unwrap_or(Role::User);
        let created = self
            .user_repo
            .create(&user.email, &user.name, &password_hash, role)
            .await?;

        tracing::info!(user_id = %created.id, role = %role, "user created");
        Ok(created)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.user_repo.list().await
    }

    pub async fn get_user(&self, id: &Uuid) -> Result<User, ApiError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))
    }
}
