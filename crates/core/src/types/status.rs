//! Status enums for staff base records.

use serde::{Deserialize, Serialize};

/// Which kind of staff member a Staff base record belongs to.
///
/// Managers and delivery agents share the Staff base record; this column
/// says which dependent row (`manager` or `delivery_agent`) is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "account.staff_role", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    /// Restaurant manager.
    Manager,
    /// Delivery driver.
    Delivery,
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manager => write!(f, "MANAGER"),
            Self::Delivery => write!(f, "DELIVERY"),
        }
    }
}

/// Employment status carried on the Staff base record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "account.staff_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffStatus {
    /// Working; the state every staff member starts in.
    #[default]
    Active,
    /// Temporarily off the roster.
    Inactive,
    /// Blocked by an administrator.
    Suspended,
}

impl std::fmt::Display for StaffStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Inactive => write!(f, "INACTIVE"),
            Self::Suspended => write!(f, "SUSPENDED"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_role_serialises_screaming_case() {
        assert_eq!(
            serde_json::to_string(&StaffRole::Delivery).unwrap(),
            "\"DELIVERY\""
        );
        assert_eq!(StaffRole::Manager.to_string(), "MANAGER");
    }

    #[test]
    fn test_staff_status_defaults_to_active() {
        assert_eq!(StaffStatus::default(), StaffStatus::Active);
        assert_eq!(StaffStatus::Suspended.to_string(), "SUSPENDED");
    }
}
