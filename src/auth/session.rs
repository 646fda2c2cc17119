use crate::auth::rbac::Role;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the private cookie carrying the serialized session
pub const SESSION_COOKIE: &str = "session";

// Ten years
const MAX_SESSION_SECONDS: u64 = 315_360_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
    pub session_id: String,
}

impl UserSession {
    pub fn new(user_id: Uuid, email: String, name: String, role: Role, ttl_seconds: u64) -> Self {
        let ttl = Duration::seconds(ttl_seconds.min(MAX_SESSION_SECONDS) as i64);
        Self {
            user_id,
            email,
            name,
            role,
            expires_at: Utc::now() + ttl,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}
