//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `UserStore` port from the `core` crate. It handles
//! all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use qualitybot_core::domain::UserCredentials;
use qualitybot_core::ports::{PortError, PortResult, UserStore};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `UserStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    password_hash: String,
}

impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
            password_hash: self.password_hash,
        }
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> PortResult<UserCredentials> {
        // Check first so the common duplicate case reports cleanly; the
        // unique index below still closes the race between two concurrent
        // signups with the same email.
        if self.find_by_email(email).await?.is_some() {
            return Err(PortError::Conflict(format!(
                "Email {} already registered",
                email
            )));
        }

        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, name, email, role, password_hash) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, name, email, role, password_hash",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let is_unique_violation = e
                .as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false);
            if is_unique_violation {
                PortError::Conflict(format!("Email {} already registered", email))
            } else {
                PortError::Unexpected(e.to_string())
            }
        })?;

        Ok(record.to_domain())
    }

    async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, role, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.map(UserRecord::to_domain))
    }

    async fn find_by_id(&self, id: Uuid) -> PortResult<Option<UserCredentials>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, role, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.map(UserRecord::to_domain))
    }
}
