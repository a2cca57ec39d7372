//! Role records and active-role resolution.
//!
//! An identity can hold several role records at once: every manager and
//! driver is also a customer. Login picks exactly one *active* role by the
//! fixed priority `Admin > Manager > Driver > Customer` and hands the
//! dashboard a payload carrying that role's record IDs.

use serde::{Deserialize, Serialize};

use crate::types::{
    AdminId, CustomerId, DeliveryAgentId, ManagerId, RestaurantId, RoleKind, StaffId, StaffRole,
    StaffStatus,
};

/// Data-integrity problems found while resolving an identity's roles.
///
/// These are never authentication failures: the credentials were fine, the
/// stored records are not.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleIntegrityError {
    /// The identity has no role records at all.
    #[error("identity has no role records")]
    NoRoles,

    /// A Staff base record has no manager or delivery-agent row using it.
    #[error("staff record {staff_id} has no manager or delivery agent row")]
    OrphanedStaff {
        /// The orphaned staff record.
        staff_id: StaffId,
    },

    /// A manager or driver row points at a staff record the identity doesn't have.
    #[error("{role} record references missing staff record {staff_id}")]
    MissingStaff {
        /// Role of the dangling record.
        role: RoleKind,
        /// The staff ID it references.
        staff_id: StaffId,
    },

    /// A manager row sits on a DELIVERY staff record or vice versa.
    #[error("{role} record uses staff record {staff_id} with role {found}")]
    StaffRoleMismatch {
        /// Role of the dependent record.
        role: RoleKind,
        /// The staff record it references.
        staff_id: StaffId,
        /// The staff role actually stored.
        found: StaffRole,
    },
}

/// Shared attributes of managers and delivery agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffRecord {
    pub id: StaffId,
    pub role: StaffRole,
    pub status: StaffStatus,
    pub restaurant_id: Option<RestaurantId>,
}

/// One role attached to an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleRecord {
    Customer {
        customer_id: CustomerId,
    },
    Manager {
        manager_id: ManagerId,
        staff_id: StaffId,
    },
    Driver {
        agent_id: DeliveryAgentId,
        staff_id: StaffId,
    },
    Admin {
        admin_id: AdminId,
    },
}

impl RoleRecord {
    /// The role this record grants.
    #[must_use]
    pub const fn kind(&self) -> RoleKind {
        match self {
            Self::Customer { .. } => RoleKind::Customer,
            Self::Manager { .. } => RoleKind::Manager,
            Self::Driver { .. } => RoleKind::Driver,
            Self::Admin { .. } => RoleKind::Admin,
        }
    }

    /// The Staff base record this record depends on, if any.
    #[must_use]
    pub const fn staff_id(&self) -> Option<StaffId> {
        match self {
            Self::Manager { staff_id, .. } | Self::Driver { staff_id, .. } => Some(*staff_id),
            Self::Customer { .. } | Self::Admin { .. } => None,
        }
    }
}

/// The single role selected for a session, with its variant-specific IDs.
///
/// Serialised with a `type` tag and camelCase fields, e.g.
/// `{"type":"manager","managerId":3,"staffId":2,"restaurantId":null}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ActiveRole {
    Admin {
        admin_id: AdminId,
    },
    Manager {
        manager_id: ManagerId,
        staff_id: StaffId,
        restaurant_id: Option<RestaurantId>,
    },
    Driver {
        agent_id: DeliveryAgentId,
        staff_id: StaffId,
    },
    Customer {
        customer_id: CustomerId,
    },
}

impl ActiveRole {
    /// The role this payload describes.
    #[must_use]
    pub const fn kind(&self) -> RoleKind {
        match self {
            Self::Admin { .. } => RoleKind::Admin,
            Self::Manager { .. } => RoleKind::Manager,
            Self::Driver { .. } => RoleKind::Driver,
            Self::Customer { .. } => RoleKind::Customer,
        }
    }
}

/// Every role and staff record attached to one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet {
    records: Vec<RoleRecord>,
    staff: Vec<StaffRecord>,
}

impl RoleSet {
    /// Build a role set from loaded records.
    #[must_use]
    pub const fn new(records: Vec<RoleRecord>, staff: Vec<StaffRecord>) -> Self {
        Self { records, staff }
    }

    /// All role records.
    #[must_use]
    pub fn records(&self) -> &[RoleRecord] {
        &self.records
    }

    /// All Staff base records.
    #[must_use]
    pub fn staff(&self) -> &[StaffRecord] {
        &self.staff
    }

    /// Whether the identity holds a record of `kind`.
    #[must_use]
    pub fn has(&self, kind: RoleKind) -> bool {
        self.records.iter().any(|r| r.kind() == kind)
    }

    fn staff_record(&self, id: StaffId) -> Option<&StaffRecord> {
        self.staff.iter().find(|s| s.id == id)
    }

    /// Check that staff base records and their dependent rows line up.
    ///
    /// # Errors
    ///
    /// Returns the first `RoleIntegrityError` found.
    pub fn check_integrity(&self) -> Result<(), RoleIntegrityError> {
        for record in &self.records {
            let Some(staff_id) = record.staff_id() else {
                continue;
            };
            let staff = self
                .staff_record(staff_id)
                .ok_or(RoleIntegrityError::MissingStaff {
                    role: record.kind(),
                    staff_id,
                })?;
            let expected = match record.kind() {
                RoleKind::Manager => StaffRole::Manager,
                _ => StaffRole::Delivery,
            };
            if staff.role != expected {
                return Err(RoleIntegrityError::StaffRoleMismatch {
                    role: record.kind(),
                    staff_id,
                    found: staff.role,
                });
            }
        }

        if let Some(orphan) = self
            .staff
            .iter()
            .find(|s| !self.records.iter().any(|r| r.staff_id() == Some(s.id)))
        {
            return Err(RoleIntegrityError::OrphanedStaff { staff_id: orphan.id });
        }

        Ok(())
    }

    /// Select the active role by priority and build its payload.
    ///
    /// # Errors
    ///
    /// Returns `RoleIntegrityError::NoRoles` when the set is empty, or any
    /// staff linkage error from [`RoleSet::check_integrity`].
    pub fn resolve(&self) -> Result<ActiveRole, RoleIntegrityError> {
        self.check_integrity()?;

        let top = self
            .records
            .iter()
            .max_by_key(|r| r.kind())
            .ok_or(RoleIntegrityError::NoRoles)?;

        let active = match *top {
            RoleRecord::Admin { admin_id } => ActiveRole::Admin { admin_id },
            RoleRecord::Manager {
                manager_id,
                staff_id,
            } => ActiveRole::Manager {
                manager_id,
                staff_id,
                restaurant_id: self.staff_record(staff_id).and_then(|s| s.restaurant_id),
            },
            RoleRecord::Driver { agent_id, staff_id } => ActiveRole::Driver { agent_id, staff_id },
            RoleRecord::Customer { customer_id } => ActiveRole::Customer { customer_id },
        };

        Ok(active)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn staff(id: i32, role: StaffRole) -> StaffRecord {
        StaffRecord {
            id: StaffId::new(id),
            role,
            status: StaffStatus::Active,
            restaurant_id: None,
        }
    }

    const CUSTOMER: RoleRecord = RoleRecord::Customer {
        customer_id: CustomerId::new(1),
    };
    const MANAGER: RoleRecord = RoleRecord::Manager {
        manager_id: ManagerId::new(2),
        staff_id: StaffId::new(10),
    };
    const DRIVER: RoleRecord = RoleRecord::Driver {
        agent_id: DeliveryAgentId::new(3),
        staff_id: StaffId::new(11),
    };
    const ADMIN: RoleRecord = RoleRecord::Admin {
        admin_id: AdminId::new(4),
    };

    /// Build a consistent role set from a subset of the four records.
    fn role_set(records: &[RoleRecord]) -> RoleSet {
        let staff = records
            .iter()
            .filter_map(|r| match r {
                RoleRecord::Manager { staff_id, .. } => {
                    Some(staff(staff_id.as_i32(), StaffRole::Manager))
                }
                RoleRecord::Driver { staff_id, .. } => {
                    Some(staff(staff_id.as_i32(), StaffRole::Delivery))
                }
                _ => None,
            })
            .collect();
        RoleSet::new(records.to_vec(), staff)
    }

    #[test]
    fn test_resolves_highest_priority_for_every_subset() {
        let all = [CUSTOMER, DRIVER, MANAGER, ADMIN];

        for mask in 1_u8..16 {
            let subset: Vec<RoleRecord> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, r)| *r)
                .collect();
            let expected = subset.iter().map(RoleRecord::kind).max().unwrap();

            let active = role_set(&subset).resolve().unwrap();
            assert_eq!(active.kind(), expected, "subset {subset:?}");
        }
    }

    #[test]
    fn test_empty_set_is_integrity_error() {
        assert_eq!(
            RoleSet::default().resolve(),
            Err(RoleIntegrityError::NoRoles)
        );
    }

    #[test]
    fn test_manager_payload_carries_restaurant() {
        let mut set = role_set(&[CUSTOMER, MANAGER]);
        set.staff[0].restaurant_id = Some(RestaurantId::new(99));

        assert_eq!(
            set.resolve().unwrap(),
            ActiveRole::Manager {
                manager_id: ManagerId::new(2),
                staff_id: StaffId::new(10),
                restaurant_id: Some(RestaurantId::new(99)),
            }
        );
    }

    #[test]
    fn test_orphaned_staff_is_integrity_error() {
        let set = RoleSet::new(vec![CUSTOMER], vec![staff(10, StaffRole::Manager)]);
        assert_eq!(
            set.resolve(),
            Err(RoleIntegrityError::OrphanedStaff {
                staff_id: StaffId::new(10)
            })
        );
    }

    #[test]
    fn test_orphaned_staff_fails_even_beside_admin() {
        let set = RoleSet::new(vec![ADMIN], vec![staff(12, StaffRole::Delivery)]);
        assert!(matches!(
            set.resolve(),
            Err(RoleIntegrityError::OrphanedStaff { .. })
        ));
    }

    #[test]
    fn test_missing_staff_is_integrity_error() {
        let set = RoleSet::new(vec![DRIVER], vec![]);
        assert_eq!(
            set.resolve(),
            Err(RoleIntegrityError::MissingStaff {
                role: RoleKind::Driver,
                staff_id: StaffId::new(11)
            })
        );
    }

    #[test]
    fn test_staff_role_mismatch_is_integrity_error() {
        let set = RoleSet::new(vec![MANAGER], vec![staff(10, StaffRole::Delivery)]);
        assert!(matches!(
            set.resolve(),
            Err(RoleIntegrityError::StaffRoleMismatch {
                found: StaffRole::Delivery,
                ..
            })
        ));
    }

    #[test]
    fn test_has() {
        let set = role_set(&[CUSTOMER, DRIVER]);
        assert!(set.has(RoleKind::Driver));
        assert!(!set.has(RoleKind::Admin));
    }

    #[test]
    fn test_active_role_wire_format() {
        let manager = ActiveRole::Manager {
            manager_id: ManagerId::new(3),
            staff_id: StaffId::new(2),
            restaurant_id: None,
        };
        assert_eq!(
            serde_json::to_value(manager).unwrap(),
            serde_json::json!({
                "type": "manager",
                "managerId": 3,
                "staffId": 2,
                "restaurantId": null
            })
        );

        let driver = ActiveRole::Driver {
            agent_id: DeliveryAgentId::new(5),
            staff_id: StaffId::new(6),
        };
        assert_eq!(
            serde_json::to_value(driver).unwrap(),
            serde_json::json!({ "type": "driver", "agentId": 5, "staffId": 6 })
        );
    }

    #[test]
    fn test_active_role_deserialises() {
        let role: ActiveRole =
            serde_json::from_str(r#"{"type":"customer","customerId":8}"#).unwrap();
        assert_eq!(
            role,
            ActiveRole::Customer {
                customer_id: CustomerId::new(8)
            }
        );
    }
}
