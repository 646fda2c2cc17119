pub mod context;
pub mod rbac;
pub mod session;

pub use context::UserContext;
pub use rbac::Role;
pub use session::{UserSession, SESSION_COOKIE};
