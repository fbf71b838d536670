//! Users as seen through the identity collaborator.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A resolved account. Read-only to this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// Authenticated identity handed in by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub email: String,
}

impl Caller {
    pub fn new(user_id: Uuid, email: &str) -> Self {
        Self {
            user_id,
            email: shared::validation::normalize_email(email),
        }
    }

    /// Fallback account view when the directory has no record for the
    /// caller.
    pub fn as_user(&self) -> User {
        User {
            id: self.user_id,
            email: self.email.clone(),
            display_name: self.email.clone(),
        }
    }
}
