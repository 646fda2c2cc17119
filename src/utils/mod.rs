pub mod crypto;
pub mod time;

pub use crypto::*;
pub use time::*;
