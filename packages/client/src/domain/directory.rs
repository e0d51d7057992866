//! Directory seam: the backend's HTTP collaborator endpoints.

use async_trait::async_trait;

use super::{error::DirectoryError, value_object::UserId};

/// A user known to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub is_online: bool,
}

impl User {
    /// Display name, falling back to the username.
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// A stored message returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: Option<i64>,
    pub from: Option<i64>,
    pub sender_name: Option<String>,
    pub content: String,
    pub sent_at: Option<String>,
}

/// Read-only access to users and message history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatDirectory: Send + Sync {
    /// The user the stored credential belongs to.
    async fn me(&self) -> Result<User, DirectoryError>;

    async fn users(&self) -> Result<Vec<User>, DirectoryError>;

    /// Messages exchanged with `peer`, in the order the backend returns them.
    async fn history(&self, peer: UserId) -> Result<Vec<HistoryEntry>, DirectoryError>;
}
