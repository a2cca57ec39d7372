//! Plated Core - Shared types and account logic.
//!
//! This crate provides the pieces every Plated component agrees on:
//! - `server` - HTTP API for registration, login and dashboard routing
//! - `cli` - Command-line tools for migrations and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Registration validation, the per-role record plans and role
//! resolution all live here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, roles and staff statuses
//! - [`password`] - Password strength policy
//! - [`registration`] - Signup input validation and record plans
//! - [`roles`] - Role records and active-role resolution

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod password;
pub mod registration;
pub mod roles;
pub mod types;

pub use password::{PasswordPolicy, PasswordPolicyError, PasswordRule};
pub use registration::{
    PlannedRecord, RegistrationForm, ValidRegistration, ValidationError, record_plan,
};
pub use roles::{ActiveRole, RoleIntegrityError, RoleRecord, RoleSet, StaffRecord};
pub use types::*;
