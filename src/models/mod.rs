pub mod asset;
pub mod node;
pub mod scan;
pub mod user;

// Re-export commonly used types
pub use asset::*;
pub use node::*;
pub use scan::*;
pub use user::*;
