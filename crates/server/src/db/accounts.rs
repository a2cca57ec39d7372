//! `PostgreSQL` account store.
//!
//! Registration writes happen in one transaction. The admin singleton is
//! guarded twice: a transaction-scoped advisory lock serialises concurrent
//! admin signups, and the unique `admin.singleton` column rejects a second
//! row even if the lock were bypassed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use plated_core::{
    AdminId, CustomerId, DeliveryAgentId, Email, IdentityId, ManagerId, PlannedRecord,
    RestaurantId, RoleKind, RoleRecord, RoleSet, StaffId, StaffRecord, StaffRole, StaffStatus,
    record_plan,
};

use super::{AccountStore, NewAccount, RepositoryError};
use crate::models::Identity;

/// Advisory lock key taken by every admin registration.
const ADMIN_SINGLETON_LOCK: i64 = 0x0041_444d_494e; // "ADMIN"

const IDENTITY_EMAIL_CONSTRAINT: &str = "identity_email_key";
const ADMIN_SINGLETON_CONSTRAINT: &str = "admin_singleton_key";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct IdentityRow {
    id: i32,
    name: String,
    email: String,
    phone: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = RepositoryError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: IdentityId::new(row.id),
            name: row.name,
            email,
            phone: row.phone,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    identity: IdentityRow,
    password_hash: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct StaffRow {
    id: i32,
    role: StaffRole,
    status: StaffStatus,
    restaurant_id: Option<i32>,
}

impl From<StaffRow> for StaffRecord {
    fn from(row: StaffRow) -> Self {
        Self {
            id: StaffId::new(row.id),
            role: row.role,
            status: row.status,
            restaurant_id: row.restaurant_id.map(RestaurantId::new),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DependentRow {
    id: i32,
    staff_id: i32,
}

/// Map a unique violation on `constraint` to `conflict`, anything else to `Database`.
fn map_unique_violation(
    err: sqlx::Error,
    constraint: &str,
    conflict: RepositoryError,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
        && db_err.constraint() == Some(constraint)
    {
        return conflict;
    }
    RepositoryError::Database(err)
}

// =============================================================================
// Repository
// =============================================================================

/// Account store backed by `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a new account store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert one planned record inside the registration transaction.
    async fn insert_record(
        conn: &mut PgConnection,
        account: &NewAccount,
        record: PlannedRecord,
        ids: &mut InsertedIds,
    ) -> Result<(), RepositoryError> {
        match record {
            PlannedRecord::Identity => {
                let id: i32 = sqlx::query_scalar(
                    r"
                    INSERT INTO account.identity (name, email, phone)
                    VALUES ($1, $2, $3)
                    RETURNING id
                    ",
                )
                .bind(&account.name)
                .bind(account.email.as_str())
                .bind(account.phone.as_deref())
                .fetch_one(&mut *conn)
                .await
                .map_err(|e| {
                    map_unique_violation(
                        e,
                        IDENTITY_EMAIL_CONSTRAINT,
                        RepositoryError::DuplicateEmail,
                    )
                })?;
                ids.identity = Some(id);
            }
            PlannedRecord::Credential => {
                sqlx::query(
                    r"
                    INSERT INTO account.credential (identity_id, password_hash)
                    VALUES ($1, $2)
                    ",
                )
                .bind(ids.identity()?)
                .bind(&account.password_hash)
                .execute(&mut *conn)
                .await?;
            }
            PlannedRecord::Staff(role) => {
                let id: i32 = sqlx::query_scalar(
                    r"
                    INSERT INTO account.staff (identity_id, role, status)
                    VALUES ($1, $2, $3)
                    RETURNING id
                    ",
                )
                .bind(ids.identity()?)
                .bind(role)
                .bind(StaffStatus::default())
                .fetch_one(&mut *conn)
                .await?;
                ids.staff = Some(id);
            }
            PlannedRecord::Manager => {
                sqlx::query("INSERT INTO account.manager (staff_id) VALUES ($1)")
                    .bind(ids.staff()?)
                    .execute(&mut *conn)
                    .await?;
            }
            PlannedRecord::DeliveryAgent => {
                sqlx::query("INSERT INTO account.delivery_agent (staff_id) VALUES ($1)")
                    .bind(ids.staff()?)
                    .execute(&mut *conn)
                    .await?;
            }
            PlannedRecord::Customer => {
                sqlx::query("INSERT INTO account.customer (identity_id) VALUES ($1)")
                    .bind(ids.identity()?)
                    .execute(&mut *conn)
                    .await?;
            }
            PlannedRecord::Admin => {
                sqlx::query("INSERT INTO account.admin (identity_id) VALUES ($1)")
                    .bind(ids.identity()?)
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        map_unique_violation(
                            e,
                            ADMIN_SINGLETON_CONSTRAINT,
                            RepositoryError::AdminExists,
                        )
                    })?;
            }
        }

        Ok(())
    }
}

/// IDs produced by earlier inserts of the same registration.
#[derive(Debug, Default)]
struct InsertedIds {
    identity: Option<i32>,
    staff: Option<i32>,
}

impl InsertedIds {
    fn identity(&self) -> Result<i32, RepositoryError> {
        self.identity.ok_or_else(|| {
            RepositoryError::DataCorruption("record plan wrote a dependent before identity".into())
        })
    }

    fn staff(&self) -> Result<i32, RepositoryError> {
        self.staff.ok_or_else(|| {
            RepositoryError::DataCorruption("record plan wrote a dependent before staff".into())
        })
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM account.identity WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn admin_exists(&self) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM account.admin)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn create_account(&self, account: &NewAccount) -> Result<IdentityId, RepositoryError> {
        // Dropping `tx` on any early return rolls every insert back
        let mut tx = self.pool.begin().await?;

        if account.role == RoleKind::Admin {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(ADMIN_SINGLETON_LOCK)
                .execute(&mut *tx)
                .await?;

            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM account.admin)")
                .fetch_one(&mut *tx)
                .await?;
            if exists {
                return Err(RepositoryError::AdminExists);
            }
        }

        let mut ids = InsertedIds::default();
        for record in record_plan(account.role) {
            Self::insert_record(&mut *tx, account, *record, &mut ids).await?;
        }
        let identity_id = ids.identity()?;

        tx.commit().await?;

        Ok(IdentityId::new(identity_id))
    }

    async fn find_credential(
        &self,
        email: &Email,
    ) -> Result<Option<(Identity, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r"
            SELECT i.id, i.name, i.email, i.phone, i.created_at,
                   c.password_hash
            FROM account.identity i
            LEFT JOIN account.credential c ON c.identity_id = i.id
            WHERE i.email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let Some(password_hash) = row.password_hash else {
            return Ok(None);
        };

        Ok(Some((row.identity.try_into()?, password_hash)))
    }

    async fn get_identity(&self, id: IdentityId) -> Result<Option<Identity>, RepositoryError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r"
            SELECT id, name, email, phone, created_at
            FROM account.identity
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_password_hash(&self, id: IdentityId) -> Result<Option<String>, RepositoryError> {
        let hash: Option<String> = sqlx::query_scalar(
            "SELECT password_hash FROM account.credential WHERE identity_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hash)
    }

    async fn load_roles(&self, id: IdentityId) -> Result<RoleSet, RepositoryError> {
        // One snapshot for all five reads
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let customers: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM account.customer WHERE identity_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let admins: Vec<i32> =
            sqlx::query_scalar("SELECT id FROM account.admin WHERE identity_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        let staff = sqlx::query_as::<_, StaffRow>(
            r"
            SELECT id, role, status, restaurant_id
            FROM account.staff
            WHERE identity_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let managers = sqlx::query_as::<_, DependentRow>(
            r"
            SELECT m.id, m.staff_id
            FROM account.manager m
            JOIN account.staff s ON s.id = m.staff_id
            WHERE s.identity_id = $1
            ",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let agents = sqlx::query_as::<_, DependentRow>(
            r"
            SELECT d.id, d.staff_id
            FROM account.delivery_agent d
            JOIN account.staff s ON s.id = d.staff_id
            WHERE s.identity_id = $1
            ",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let records = admins
            .into_iter()
            .map(|row| RoleRecord::Admin {
                admin_id: AdminId::new(row),
            })
            .chain(managers.into_iter().map(|r| RoleRecord::Manager {
                manager_id: ManagerId::new(r.id),
                staff_id: StaffId::new(r.staff_id),
            }))
            .chain(agents.into_iter().map(|r| RoleRecord::Driver {
                agent_id: DeliveryAgentId::new(r.id),
                staff_id: StaffId::new(r.staff_id),
            }))
            .chain(customers.into_iter().map(|row| RoleRecord::Customer {
                customer_id: CustomerId::new(row),
            }))
            .collect();

        Ok(RoleSet::new(
            records,
            staff.into_iter().map(StaffRecord::from).collect(),
        ))
    }

    async fn replace_password_hash(
        &self,
        id: IdentityId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE account.credential
            SET password_hash = $1, updated_at = NOW()
            WHERE identity_id = $2
            ",
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
