//! In-process account store.
//!
//! Used by tests and local tooling. Writes go to a staged copy of the tables
//! that replaces the live copy only once every record of the plan succeeded,
//! so a failed registration leaves nothing behind. The state mutex is held
//! for the whole write, which serialises concurrent registrations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use plated_core::{
    AdminId, CustomerId, DeliveryAgentId, Email, IdentityId, ManagerId, PlannedRecord,
    RestaurantId, RoleKind, RoleRecord, RoleSet, StaffId, StaffRecord, StaffRole, StaffStatus,
    record_plan,
};

use super::{AccountStore, NewAccount, RepositoryError};
use crate::models::Identity;

/// Number of rows in each table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub identities: usize,
    pub credentials: usize,
    pub customers: usize,
    pub staff: usize,
    pub managers: usize,
    pub delivery_agents: usize,
    pub admins: usize,
}

impl RowCounts {
    /// Total rows across every table.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.identities
            + self.credentials
            + self.customers
            + self.staff
            + self.managers
            + self.delivery_agents
            + self.admins
    }
}

#[derive(Debug, Clone)]
struct StaffRow {
    identity_id: IdentityId,
    record: StaffRecord,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    next_id: i32,
    identities: Vec<Identity>,
    credentials: HashMap<IdentityId, String>,
    customers: Vec<(CustomerId, IdentityId)>,
    staff: Vec<StaffRow>,
    managers: Vec<(ManagerId, StaffId)>,
    delivery_agents: Vec<(DeliveryAgentId, StaffId)>,
    admins: Vec<(AdminId, IdentityId)>,
}

impl Tables {
    /// IDs are unique across tables, which makes mixed-up IDs fail loudly in tests.
    const fn allocate(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn staff_row_mut(&mut self, id: StaffId) -> Option<&mut StaffRow> {
        self.staff.iter_mut().find(|s| s.record.id == id)
    }

    fn counts(&self) -> RowCounts {
        RowCounts {
            identities: self.identities.len(),
            credentials: self.credentials.len(),
            customers: self.customers.len(),
            staff: self.staff.len(),
            managers: self.managers.len(),
            delivery_agents: self.delivery_agents.len(),
            admins: self.admins.len(),
        }
    }

    fn insert_record(
        &mut self,
        identity_id: Option<IdentityId>,
        staff_id: &mut Option<StaffId>,
        account: &NewAccount,
        record: PlannedRecord,
    ) -> Result<Option<IdentityId>, RepositoryError> {
        let require_identity = || {
            identity_id.ok_or_else(|| {
                RepositoryError::DataCorruption("record plan wrote a dependent before identity".into())
            })
        };
        let require_staff = |staff_id: Option<StaffId>| {
            staff_id.ok_or_else(|| {
                RepositoryError::DataCorruption("record plan wrote a dependent before staff".into())
            })
        };

        match record {
            PlannedRecord::Identity => {
                if self.identities.iter().any(|i| i.email == account.email) {
                    return Err(RepositoryError::DuplicateEmail);
                }
                let id = IdentityId::new(self.allocate());
                self.identities.push(Identity {
                    id,
                    name: account.name.clone(),
                    email: account.email.clone(),
                    phone: account.phone.clone(),
                    created_at: Utc::now(),
                });
                return Ok(Some(id));
            }
            PlannedRecord::Credential => {
                self.credentials
                    .insert(require_identity()?, account.password_hash.clone());
            }
            PlannedRecord::Staff(role) => {
                let id = StaffId::new(self.allocate());
                self.staff.push(StaffRow {
                    identity_id: require_identity()?,
                    record: StaffRecord {
                        id,
                        role,
                        status: StaffStatus::default(),
                        restaurant_id: None,
                    },
                });
                *staff_id = Some(id);
            }
            PlannedRecord::Manager => {
                let id = ManagerId::new(self.allocate());
                self.managers.push((id, require_staff(*staff_id)?));
            }
            PlannedRecord::DeliveryAgent => {
                let id = DeliveryAgentId::new(self.allocate());
                self.delivery_agents.push((id, require_staff(*staff_id)?));
            }
            PlannedRecord::Customer => {
                let owner = require_identity()?;
                if self.customers.iter().all(|(_, i)| *i != owner) {
                    let id = CustomerId::new(self.allocate());
                    self.customers.push((id, owner));
                }
            }
            PlannedRecord::Admin => {
                if !self.admins.is_empty() {
                    return Err(RepositoryError::AdminExists);
                }
                let id = AdminId::new(self.allocate());
                self.admins.push((id, require_identity()?));
            }
        }

        Ok(None)
    }
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    fail_on: Option<PlannedRecord>,
}

/// Account store that keeps every table in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountStore {
    state: Arc<Mutex<State>>,
}

impl MemoryAccountStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next registrations fail when they reach `record`.
    ///
    /// Pass `None` to stop injecting failures.
    pub async fn fail_on(&self, record: Option<PlannedRecord>) {
        self.state.lock().await.fail_on = record;
    }

    /// Current row count of every table.
    pub async fn row_counts(&self) -> RowCounts {
        self.state.lock().await.tables.counts()
    }

    /// Attach a bare staff record to an identity, with no manager or agent row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the identity doesn't exist.
    pub async fn attach_staff(
        &self,
        identity_id: IdentityId,
        role: StaffRole,
    ) -> Result<StaffId, RepositoryError> {
        let mut state = self.state.lock().await;
        let tables = &mut state.tables;
        if tables.identities.iter().all(|i| i.id != identity_id) {
            return Err(RepositoryError::NotFound);
        }

        let id = StaffId::new(tables.allocate());
        tables.staff.push(StaffRow {
            identity_id,
            record: StaffRecord {
                id,
                role,
                status: StaffStatus::default(),
                restaurant_id: None,
            },
        });
        Ok(id)
    }

    /// Grant an extra role to an existing identity.
    ///
    /// Writes the role's records from the registration plan, skipping the
    /// identity and credential rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the identity doesn't exist, or
    /// `RepositoryError::AdminExists` when granting a second admin.
    pub async fn grant_role(
        &self,
        identity_id: IdentityId,
        role: RoleKind,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(identity) = state
            .tables
            .identities
            .iter()
            .find(|i| i.id == identity_id)
            .cloned()
        else {
            return Err(RepositoryError::NotFound);
        };

        let account = NewAccount {
            name: identity.name,
            email: identity.email,
            phone: identity.phone,
            password_hash: String::new(),
            role,
        };

        let mut staged = state.tables.clone();
        let mut staff_id = None;
        for record in record_plan(role) {
            if matches!(record, PlannedRecord::Identity | PlannedRecord::Credential) {
                continue;
            }
            staged.insert_record(Some(identity_id), &mut staff_id, &account, *record)?;
        }
        state.tables = staged;

        Ok(())
    }

    /// Point a staff record at a restaurant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the staff record doesn't exist.
    pub async fn assign_restaurant(
        &self,
        staff_id: StaffId,
        restaurant_id: RestaurantId,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let row = state
            .tables
            .staff_row_mut(staff_id)
            .ok_or(RepositoryError::NotFound)?;
        row.record.restaurant_id = Some(restaurant_id);
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.tables.identities.iter().any(|i| &i.email == email))
    }

    async fn admin_exists(&self) -> Result<bool, RepositoryError> {
        Ok(!self.state.lock().await.tables.admins.is_empty())
    }

    async fn create_account(&self, account: &NewAccount) -> Result<IdentityId, RepositoryError> {
        let mut state = self.state.lock().await;

        let mut staged = state.tables.clone();
        let mut identity_id = None;
        let mut staff_id = None;
        for record in record_plan(account.role) {
            if state.fail_on == Some(*record) {
                return Err(RepositoryError::Backend(format!(
                    "injected failure writing {record:?}"
                )));
            }
            if let Some(id) = staged.insert_record(identity_id, &mut staff_id, account, *record)? {
                identity_id = Some(id);
            }
        }

        let identity_id = identity_id.ok_or_else(|| {
            RepositoryError::DataCorruption("record plan wrote no identity".into())
        })?;
        state.tables = staged;

        Ok(identity_id)
    }

    async fn find_credential(
        &self,
        email: &Email,
    ) -> Result<Option<(Identity, String)>, RepositoryError> {
        let state = self.state.lock().await;
        let tables = &state.tables;

        let Some(identity) = tables.identities.iter().find(|i| &i.email == email) else {
            return Ok(None);
        };
        Ok(tables
            .credentials
            .get(&identity.id)
            .map(|hash| (identity.clone(), hash.clone())))
    }

    async fn get_identity(&self, id: IdentityId) -> Result<Option<Identity>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.tables.identities.iter().find(|i| i.id == id).cloned())
    }

    async fn get_password_hash(&self, id: IdentityId) -> Result<Option<String>, RepositoryError> {
        Ok(self.state.lock().await.tables.credentials.get(&id).cloned())
    }

    async fn load_roles(&self, id: IdentityId) -> Result<RoleSet, RepositoryError> {
        let state = self.state.lock().await;
        let tables = &state.tables;

        let staff: Vec<StaffRecord> = tables
            .staff
            .iter()
            .filter(|s| s.identity_id == id)
            .map(|s| s.record)
            .collect();
        let owns_staff = |staff_id: &StaffId| staff.iter().any(|s| s.id == *staff_id);

        let admins = tables
            .admins
            .iter()
            .filter(|(_, owner)| *owner == id)
            .map(|(admin_id, _)| RoleRecord::Admin {
                admin_id: *admin_id,
            });
        let managers = tables
            .managers
            .iter()
            .filter(|(_, staff_id)| owns_staff(staff_id))
            .map(|(manager_id, staff_id)| RoleRecord::Manager {
                manager_id: *manager_id,
                staff_id: *staff_id,
            });
        let agents = tables
            .delivery_agents
            .iter()
            .filter(|(_, staff_id)| owns_staff(staff_id))
            .map(|(agent_id, staff_id)| RoleRecord::Driver {
                agent_id: *agent_id,
                staff_id: *staff_id,
            });
        let customers = tables
            .customers
            .iter()
            .filter(|(_, owner)| *owner == id)
            .map(|(customer_id, _)| RoleRecord::Customer {
                customer_id: *customer_id,
            });

        let records = admins.chain(managers).chain(agents).chain(customers).collect();

        Ok(RoleSet::new(records, staff))
    }

    async fn replace_password_hash(
        &self,
        id: IdentityId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let hash = state
            .tables
            .credentials
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound)?;
        password_hash.clone_into(hash);
        Ok(())
    }
}
