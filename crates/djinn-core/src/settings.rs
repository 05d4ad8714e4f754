//! Settings for the djinn stack.
//!
//! [`Settings`] holds everything the content-type views read at start-up:
//! logging, the listen address, template directories, the default
//! permission names used when a content type does not configure its own,
//! and the raw `[content_types.<name>]` tables the registry is built from.
//!
//! Unlike a process-wide settings object, a `Settings` value is constructed
//! once and handed to whatever needs it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default permission names, used when a registry entry leaves the
/// corresponding `*_permission` attribute unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultPermissions {
    /// Checked by the detail view.
    pub view: String,
    /// Checked by the create view.
    pub add: String,
    /// Checked by the update view.
    pub edit: String,
    /// Checked by the delete view.
    pub delete: String,
}

impl Default for DefaultPermissions {
    fn default() -> Self {
        Self {
            view: "contenttypes.view".to_string(),
            add: "contenttypes.add_contenttype".to_string(),
            edit: "contenttypes.change_contenttype".to_string(),
            delete: "contenttypes.delete_contenttype".to_string(),
        }
    }
}

/// The complete set of settings.
///
/// # Examples
///
/// ```
/// use djinn_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.profile_url, "/profile/{username}/");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,
    /// Address the HTTP server binds to.
    pub bind_address: String,

    // ── Templates ────────────────────────────────────────────────────

    /// Directories searched for `<app>/<ct>_<mode>.html` templates.
    pub template_dirs: Vec<PathBuf>,

    // ── Auth ─────────────────────────────────────────────────────────

    /// Pattern for a user's profile page; `{username}` is substituted.
    /// Cancelled creations and successful deletions redirect here.
    pub profile_url: String,
    /// Fallback permission names.
    pub default_permissions: DefaultPermissions,
    /// Permissions an object's owner holds on that object.
    pub owner_permissions: Vec<String>,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log filter (e.g. "info", "djinn_contenttypes=debug").
    pub log_level: String,

    // ── Content types ────────────────────────────────────────────────

    /// Raw attribute tables, keyed by content-type name.
    pub content_types: BTreeMap<String, serde_json::Map<String, serde_json::Value>>,
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = DefaultPermissions::default();
        Self {
            debug: true,
            bind_address: "127.0.0.1:8000".to_string(),
            template_dirs: Vec::new(),
            profile_url: "/profile/{username}/".to_string(),
            owner_permissions: vec![defaults.view.clone(), defaults.edit.clone(), defaults.delete.clone()],
            default_permissions: defaults,
            log_level: "info".to_string(),
            content_types: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Renders [`Settings::profile_url`] for `username`.
    pub fn profile_url_for(&self, username: &str) -> String {
        self.profile_url.replace("{username}", username)
    }
}
