//! Core types for Plated.
//!
//! Newtypes for IDs and emails, plus the role and staff enums.

pub mod email;
pub mod id;
pub mod role;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use role::{RoleKind, UnknownRoleError};
pub use status::*;
