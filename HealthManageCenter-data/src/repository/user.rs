use async_trait::async_trait;
use rusqlite::params;
use tracing::debug;

use super::errors::RepositoryError;
use super::storage;
use crate::database::Database;
use crate::models::user::{NewUser, User, UserRole};

/// Repository trait for the user roster.
///
/// No credential checking lives here; login flows are outside this core.
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    /// Persist a new account and return it with its assigned id
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Point lookup; `None` when the id is unknown
    async fn get_by_id(&self, user_id: i64) -> Result<Option<User>, RepositoryError>;

    /// Every account with the doctor role
    async fn get_all_doctors(&self) -> Result<Vec<User>, RepositoryError>;

    /// Elders assigned to the given doctor
    async fn get_elders_by_doctor(&self, doctor_id: i64) -> Result<Vec<User>, RepositoryError>;
}

/// SQLite-backed repository for the user roster
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    db: Database,
}

impl SqliteUserRepository {
    /// Create a repository over an injected database handle
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn query_list(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<User>, RepositoryError> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, storage::user_from_row)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }
}

#[async_trait]
impl UserRepositoryTrait for SqliteUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO users (name, phone, role, password, email, date_of_birth, gender, doctor_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            (
                &user.name,
                &user.phone,
                user.role.as_str(),
                &user.password,
                &user.email,
                user.date_of_birth_millis,
                &user.gender,
                user.doctor_id,
            ),
        )?;
        let user_id = conn.last_insert_rowid();
        debug!(user_id, role = user.role.as_str(), "stored user");

        Ok(User {
            user_id,
            name: user.name,
            phone: user.phone,
            role: user.role,
            password: user.password,
            email: user.email,
            date_of_birth_millis: user.date_of_birth_millis,
            gender: user.gender,
            doctor_id: user.doctor_id,
        })
    }

    async fn get_by_id(&self, user_id: i64) -> Result<Option<User>, RepositoryError> {
        let conn = self.db.connection()?;
        let user = conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE user_id = ?1",
                    storage::USER_COLUMNS
                ),
                [user_id],
                storage::user_from_row,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        Ok(user)
    }

    async fn get_all_doctors(&self) -> Result<Vec<User>, RepositoryError> {
        self.query_list(
            &format!(
                "SELECT {} FROM users WHERE role = 'doctor' ORDER BY user_id",
                storage::USER_COLUMNS
            ),
            params![],
        )
    }

    async fn get_elders_by_doctor(&self, doctor_id: i64) -> Result<Vec<User>, RepositoryError> {
        self.query_list(
            &format!(
                "SELECT {} FROM users WHERE role = 'elder' AND doctor_id = ?1 ORDER BY user_id",
                storage::USER_COLUMNS
            ),
            params![doctor_id],
        )
    }
}
