//! Permission evaluation.
//!
//! Permissions are plain `"app_label.codename"` strings. A user can hold a
//! permission in three ways:
//!
//! - **Globally**, assigned directly to the user
//! - **Through a group**, when the check is made in the context of a group
//!   the user belongs to
//! - **As owner**, when the check is made against an object the user owns
//!   and the permission is one of the configured owner permissions
//!
//! Inactive users have no permissions; superusers have all of them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use djinn_core::Settings;

use crate::user::User;

/// A group of users with shared permissions.
///
/// Group permissions only apply when a check is made in the group's context
/// (creating content inside the group, for instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Unique id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Permission names members hold inside this group.
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl Group {
    /// Creates a group with no permissions.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            permissions: BTreeSet::new(),
        }
    }

    /// Adds a permission to this group.
    #[must_use]
    pub fn with_perm(mut self, perm: impl Into<String>) -> Self {
        self.permissions.insert(perm.into());
        self
    }
}

/// An object permissions can be checked against.
pub trait PermissionTarget: Send + Sync {
    /// Username of the object's owner, if any.
    fn owner(&self) -> Option<&str>;
}

/// Evaluates permissions for users, optionally in a group or object context.
///
/// # Examples
///
/// ```
/// use djinn_auth::{Group, PermissionChecker, User};
///
/// let checker = PermissionChecker::new(vec!["contenttypes.change_contenttype".into()]);
/// let group = Group::new(1, "editors").with_perm("contenttypes.add_contenttype");
/// let user = User::new("alice").in_group(1);
///
/// assert!(checker.has_perm(&user, "contenttypes.add_contenttype", Some(&group)));
/// assert!(!checker.has_perm(&user, "contenttypes.add_contenttype", None));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PermissionChecker {
    owner_permissions: BTreeSet<String>,
}

impl PermissionChecker {
    /// Creates a checker granting `owner_permissions` to object owners.
    pub fn new(owner_permissions: Vec<String>) -> Self {
        Self {
            owner_permissions: owner_permissions.into_iter().collect(),
        }
    }

    /// Creates a checker from [`Settings::owner_permissions`].
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.owner_permissions.clone())
    }

    /// Checks `perm` globally and, if given, in the context of `group`.
    ///
    /// Group permissions count only when the user is a member.
    pub fn has_perm(&self, user: &User, perm: &str, group: Option<&Group>) -> bool {
        if !user.is_active {
            return false;
        }
        if user.has_perm(perm) {
            return true;
        }
        let granted = group.is_some_and(|g| user.is_member_of(g.id) && g.permissions.contains(perm));
        if !granted {
            tracing::debug!(user = %user.username, perm, group = ?group.map(|g| g.id), "permission not held");
        }
        granted
    }

    /// Checks `perm` globally and, if given, against `obj`.
    ///
    /// The owner of `obj` holds the configured owner permissions on it.
    pub fn has_permission(&self, perm: &str, user: &User, obj: Option<&dyn PermissionTarget>) -> bool {
        if !user.is_active {
            return false;
        }
        if user.has_perm(perm) {
            return true;
        }
        let granted = user.is_authenticated()
            && self.owner_permissions.contains(perm)
            && obj
                .and_then(|o| o.owner())
                .is_some_and(|owner| owner == user.username);
        if !granted {
            tracing::debug!(user = %user.username, perm, "object permission not held");
        }
        granted
    }

    /// Returns the permissions owners hold on their objects.
    pub const fn owner_permissions(&self) -> &BTreeSet<String> {
        &self.owner_permissions
    }
}
