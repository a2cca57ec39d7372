//! Domain models for the account API.

pub mod identity;
pub mod session;

pub use identity::Identity;
pub use session::{CurrentUser, keys as session_keys};
