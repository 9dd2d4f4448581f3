//! crates/qualitybot_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases
//! or hosted AI providers.

use crate::domain::UserCredentials;
use async_trait::async_trait;
use uuid::Uuid;

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services
/// (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// The credential store: owns user rows, enforces the unique-email invariant.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with `PortError::Conflict` when the email is
    /// already registered.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> PortResult<UserCredentials>;

    async fn find_by_email(&self, email: &str) -> PortResult<Option<UserCredentials>>;

    async fn find_by_id(&self, id: Uuid) -> PortResult<Option<UserCredentials>>;
}

/// The outbound chat relay: one fully assembled prompt in, reply text out.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn generate_reply(&self, prompt: &str) -> PortResult<String>;
}
