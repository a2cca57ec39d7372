//! Signup input validation and per-role record plans.
//!
//! A registration is validated completely before anything touches storage.
//! The storage layer then writes [`record_plan`] for the requested role inside
//! a single transaction.

use serde::Deserialize;

use crate::password::{PasswordPolicy, PasswordPolicyError};
use crate::types::{Email, EmailError, RoleKind, StaffRole, UnknownRoleError};

/// Maximum display name length, in characters.
pub const MAX_NAME_LENGTH: usize = 150;

/// Maximum phone number length, in characters.
pub const MAX_PHONE_LENGTH: usize = 32;

/// Reasons a registration form is rejected before any write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Requested role is not one of the platform roles.
    #[error(transparent)]
    UnknownRole(#[from] UnknownRoleError),

    /// Display name is empty after trimming.
    #[error("name is required")]
    MissingName,

    /// Display name is too long.
    #[error("name must be at most {max} characters")]
    NameTooLong {
        /// Maximum allowed length.
        max: usize,
    },

    /// Email is malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Phone number is too long.
    #[error("phone must be at most {max} characters")]
    PhoneTooLong {
        /// Maximum allowed length.
        max: usize,
    },

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Password fails the strength policy.
    #[error("{0}")]
    WeakPassword(#[from] PasswordPolicyError),
}

/// Raw signup input, as submitted.
#[derive(Clone, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
    pub confirm: String,
    pub role: String,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .field("confirm", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// A registration that passed every validation rule.
#[derive(Clone)]
pub struct ValidRegistration {
    /// Trimmed display name.
    pub name: String,
    /// Normalised email.
    pub email: Email,
    /// Trimmed phone, `None` when blank.
    pub phone: Option<String>,
    /// Plaintext password; hashed by the caller before storage.
    pub password: String,
    /// Role requested at signup.
    pub role: RoleKind,
}

impl std::fmt::Debug for ValidRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidRegistration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

impl RegistrationForm {
    /// Validate every field of the form.
    ///
    /// Checks run in order role, name, email, phone, confirmation, strength,
    /// and the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the `ValidationError` for the first invalid field.
    pub fn validate(&self, policy: PasswordPolicy) -> Result<ValidRegistration, ValidationError> {
        let role: RoleKind = self.role.parse()?;

        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::NameTooLong {
                max: MAX_NAME_LENGTH,
            });
        }

        let email = Email::parse(&self.email)?;

        let phone = self
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if phone.is_some_and(|p| p.chars().count() > MAX_PHONE_LENGTH) {
            return Err(ValidationError::PhoneTooLong {
                max: MAX_PHONE_LENGTH,
            });
        }

        if self.password != self.confirm {
            return Err(ValidationError::PasswordMismatch);
        }
        policy.validate(&self.password)?;

        Ok(ValidRegistration {
            name: name.to_owned(),
            email,
            phone: phone.map(str::to_owned),
            password: self.password.clone(),
            role,
        })
    }
}

/// One row written during registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlannedRecord {
    Identity,
    Credential,
    /// Staff base record with the given staff role.
    Staff(StaffRole),
    Manager,
    DeliveryAgent,
    Customer,
    Admin,
}

const CUSTOMER_PLAN: &[PlannedRecord] = &[
    PlannedRecord::Identity,
    PlannedRecord::Credential,
    PlannedRecord::Customer,
];

const MANAGER_PLAN: &[PlannedRecord] = &[
    PlannedRecord::Identity,
    PlannedRecord::Credential,
    PlannedRecord::Staff(StaffRole::Manager),
    PlannedRecord::Manager,
    PlannedRecord::Customer,
];

const DRIVER_PLAN: &[PlannedRecord] = &[
    PlannedRecord::Identity,
    PlannedRecord::Credential,
    PlannedRecord::Staff(StaffRole::Delivery),
    PlannedRecord::DeliveryAgent,
    PlannedRecord::Customer,
];

const ADMIN_PLAN: &[PlannedRecord] = &[
    PlannedRecord::Identity,
    PlannedRecord::Credential,
    PlannedRecord::Admin,
];

/// The rows to create, in insertion order, when registering `role`.
///
/// Managers and drivers also get a Customer record so they can order food.
#[must_use]
pub const fn record_plan(role: RoleKind) -> &'static [PlannedRecord] {
    match role {
        RoleKind::Customer => CUSTOMER_PLAN,
        RoleKind::Manager => MANAGER_PLAN,
        RoleKind::Driver => DRIVER_PLAN,
        RoleKind::Admin => ADMIN_PLAN,
    }
}
