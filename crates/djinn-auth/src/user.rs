//! User model.
//!
//! A [`User`] carries its identity, the active and superuser flags, the
//! permission names assigned to it directly and the ids of the groups it
//! belongs to. The anonymous user is a `User` too, built by
//! [`User::anonymous`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A user, modeled after Django's `AbstractUser`.
///
/// # Examples
///
/// ```
/// use djinn_auth::User;
///
/// let user = User::new("alice").with_perm("contenttypes.view");
/// assert!(user.is_authenticated());
/// assert!(user.has_perm("contenttypes.view"));
/// assert!(!user.has_perm("contenttypes.add_contenttype"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// The user's unique username.
    pub username: String,
    /// Inactive users are treated as having no permissions.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Superusers hold every permission.
    #[serde(default)]
    pub is_superuser: bool,
    /// Permission names (`"app_label.codename"`) assigned directly.
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Ids of the groups this user belongs to.
    #[serde(default)]
    pub groups: BTreeSet<u64>,
    #[serde(skip)]
    anonymous: bool,
}

const fn default_true() -> bool {
    true
}

impl User {
    /// Creates an active user with no permissions.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            is_active: true,
            is_superuser: false,
            permissions: BTreeSet::new(),
            groups: BTreeSet::new(),
            anonymous: false,
        }
    }

    /// Creates the anonymous user: not authenticated, no permissions.
    pub fn anonymous() -> Self {
        Self {
            username: String::new(),
            is_active: false,
            is_superuser: false,
            permissions: BTreeSet::new(),
            groups: BTreeSet::new(),
            anonymous: true,
        }
    }

    /// Creates an active superuser.
    pub fn superuser(username: impl Into<String>) -> Self {
        Self {
            is_superuser: true,
            ..Self::new(username)
        }
    }

    /// Adds a direct permission.
    #[must_use]
    pub fn with_perm(mut self, perm: impl Into<String>) -> Self {
        self.permissions.insert(perm.into());
        self
    }

    /// Adds a group membership.
    #[must_use]
    pub fn in_group(mut self, group_id: u64) -> Self {
        self.groups.insert(group_id);
        self
    }

    /// Returns `false` only for the anonymous user.
    pub const fn is_authenticated(&self) -> bool {
        !self.anonymous
    }

    /// Returns `true` only for the anonymous user.
    pub const fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Returns `true` if the user belongs to the group.
    pub fn is_member_of(&self, group_id: u64) -> bool {
        self.groups.contains(&group_id)
    }

    /// Checks a global permission, ignoring groups and objects.
    pub fn has_perm(&self, perm: &str) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_superuser || self.permissions.contains(perm)
    }

    /// Renders the profile URL pattern (`{username}` is substituted).
    pub fn profile_url(&self, pattern: &str) -> String {
        pattern.replace("{username}", &self.username)
    }
}
