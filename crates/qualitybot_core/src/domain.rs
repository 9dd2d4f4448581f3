//! crates/qualitybot_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a user - the public shape returned to clients.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

// Only used internally for login/signup - contains sensitive data.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub password_hash: String,
}

impl UserCredentials {
    /// Strips the stored hash, leaving only the fields safe to return.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            role: self.role,
        }
    }
}

/// One row of imported quality-metric data. Never persisted; built from a
/// spreadsheet row during import and echoed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityData {
    pub timestamp: String,
    pub metric_name: String,
    pub value: f64,
    pub target: f64,
    pub unit: String,
    pub process: String,
    pub operator: String,
    pub notes: String,
}

/// A single prior turn of a chat conversation, as sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Either "user" or "bot"; anything else is ignored during prompt assembly.
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
}
