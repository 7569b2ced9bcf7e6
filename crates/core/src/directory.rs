//! Users, notification groups, and the recipient-lookup seam.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::GroupId;

pub type UserId = Uuid;

/// A notification group; membership is carried on the user side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    /// Empty string means "no address on file", matching host semantics.
    pub email: String,
    pub active: bool,
    pub groups: Vec<GroupId>,
}

impl User {
    pub fn new(login: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            login: login.into(),
            email: email.into(),
            active: true,
            groups: Vec::new(),
        }
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.groups.push(group);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

// ── Directory seam ──────────────────────────────────────────────────

/// User search, owned by the host framework.
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Active members of `group` that have a non-empty email address.
    ///
    /// An unknown group resolves to no members, not an error; the host
    /// treats the search domain as a filter, and so does this.
    async fn mail_recipients(&self, group: GroupId) -> Vec<User>;
}

/// In-memory directory for embedding and tests.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<Vec<User>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        let mut guard = self.users.write().expect("directory lock poisoned");
        guard.push(user);
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn mail_recipients(&self, group: GroupId) -> Vec<User> {
        let guard = self.users.read().expect("directory lock poisoned");
        guard
            .iter()
            .filter(|u| u.active && !u.email.is_empty() && u.groups.contains(&group))
            .cloned()
            .collect()
    }
}
