//! Authentication backends.
//!
//! An [`AuthBackend`] resolves users and groups. [`UserDirectory`] is the
//! in-memory implementation; it trusts the username forwarded by an
//! authenticating proxy in the [`REMOTE_USER_HEADER`] header, like Django's
//! `RemoteUserBackend`.
//!
//! Only use the remote-user header behind a proxy that sets it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use djinn_core::{ContentError, ContentResult};

use crate::permissions::Group;
use crate::user::User;

/// The request header carrying the authenticated username.
pub const REMOTE_USER_HEADER: &str = "x-remote-user";

/// Resolves users and groups.
///
/// Implementations must be `Send + Sync`; one backend serves all requests.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Returns the user with the given username.
    async fn get_user(&self, username: &str) -> ContentResult<Option<User>>;

    /// Returns the group with the given id.
    async fn get_group(&self, id: u64) -> ContentResult<Option<Group>>;

    /// Authenticates the username forwarded by a trusted proxy.
    ///
    /// Unknown and inactive users yield `None`.
    async fn authenticate_remote(&self, remote_user: &str) -> ContentResult<Option<User>> {
        Ok(self
            .get_user(remote_user)
            .await?
            .filter(|user| user.is_active))
    }
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    groups: Vec<Group>,
}

/// In-memory users and groups.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: Arc<RwLock<BTreeMap<String, User>>>,
    groups: Arc<RwLock<BTreeMap<u64, Group>>>,
}

impl UserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a directory from JSON: `{"users": [...], "groups": [...]}`.
    pub fn from_json_str(json: &str) -> ContentResult<Self> {
        let file: DirectoryFile = serde_json::from_str(json)
            .map_err(|e| ContentError::ConfigurationError(format!("Invalid user directory: {e}")))?;
        Ok(Self {
            users: Arc::new(RwLock::new(
                file.users
                    .into_iter()
                    .map(|u| (u.username.clone(), u))
                    .collect(),
            )),
            groups: Arc::new(RwLock::new(
                file.groups.into_iter().map(|g| (g.id, g)).collect(),
            )),
        })
    }

    /// Adds or replaces a user.
    pub async fn add_user(&self, user: User) {
        tracing::debug!(username = %user.username, "adding user");
        self.users.write().await.insert(user.username.clone(), user);
    }

    /// Adds or replaces a group.
    pub async fn add_group(&self, group: Group) {
        tracing::debug!(group = group.id, name = %group.name, "adding group");
        self.groups.write().await.insert(group.id, group);
    }

    /// Returns the number of users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl AuthBackend for UserDirectory {
    async fn get_user(&self, username: &str) -> ContentResult<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn get_group(&self, id: u64) -> ContentResult<Option<Group>> {
        Ok(self.groups.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_user() {
        let directory = UserDirectory::new();
        directory.add_user(User::new("alice")).await;

        let user = directory.get_user("alice").await.unwrap();
        assert_eq!(user.unwrap().username, "alice");
        assert!(directory.get_user("bob").await.unwrap().is_none());
        assert_eq!(directory.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_authenticate_remote_skips_inactive() {
        let directory = UserDirectory::new();
        let mut inactive = User::new("ghost");
        inactive.is_active = false;
        directory.add_user(inactive).await;
        directory.add_user(User::new("alice")).await;

        assert!(directory.authenticate_remote("ghost").await.unwrap().is_none());
        assert!(directory.authenticate_remote("nobody").await.unwrap().is_none());
        assert!(directory.authenticate_remote("alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_groups() {
        let directory = UserDirectory::new();
        directory.add_group(Group::new(3, "editors")).await;
        assert_eq!(directory.get_group(3).await.unwrap().unwrap().name, "editors");
        assert!(directory.get_group(4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_from_json_str() {
        let directory = UserDirectory::from_json_str(
            r#"{
                "users": [{"username": "alice", "permissions": ["contenttypes.view"], "groups": [1]}],
                "groups": [{"id": 1, "name": "editors", "permissions": ["contenttypes.add_contenttype"]}]
            }"#,
        )
        .unwrap();

        let alice = directory.get_user("alice").await.unwrap().unwrap();
        assert!(alice.has_perm("contenttypes.view"));
        assert!(alice.is_member_of(1));
        let group = directory.get_group(1).await.unwrap().unwrap();
        assert!(group.permissions.contains("contenttypes.add_contenttype"));
    }

    #[test]
    fn test_from_json_str_invalid() {
        let err = UserDirectory::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ContentError::ConfigurationError(_)));
    }
}
