//! Platform roles and their priority order.

use serde::{Deserialize, Serialize};

/// Error returned when a role name is not one of the four platform roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}': expected one of customer, manager, driver, admin")]
pub struct UnknownRoleError(pub String);

/// The four roles an identity can hold.
///
/// Variants are declared in ascending priority, so the derived `Ord` is the
/// resolution order: `Admin > Manager > Driver > Customer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Customer,
    Driver,
    Manager,
    Admin,
}

impl RoleKind {
    /// Every role, highest priority first.
    pub const BY_PRIORITY: [Self; 4] = [Self::Admin, Self::Manager, Self::Driver, Self::Customer];

    /// Wire name used in requests and active-role payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Driver => "driver",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }

    /// Whether this role is backed by a Staff base record.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Manager | Self::Driver)
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoleKind {
    type Err = UnknownRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "driver" => Ok(Self::Driver),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            _ => Err(UnknownRoleError(s.to_owned())),
        }
    }
}
