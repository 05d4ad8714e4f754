//! System checks.
//!
//! Checks inspect start-up configuration and report problems as
//! [`CheckMessage`]s instead of failing. The content-type registry uses them
//! to flag entries with missing attributes, since lookups on such entries
//! silently fall back to defaults.
//!
//! ```
//! use djinn_core::checks::{CheckMessage, CheckLevel, CheckRegistry};
//!
//! let mut registry = CheckRegistry::new();
//! registry.register(
//!     |_settings| {
//!         vec![CheckMessage::warning(
//!             "Custom check warning",
//!             Some("Consider fixing this."),
//!             None,
//!             Some("myapp.W001"),
//!         )]
//!     },
//!     &["myapp"],
//! );
//!
//! let settings = djinn_core::settings::Settings::default();
//! let messages = registry.run_checks(None, &settings);
//! assert_eq!(messages[0].level, CheckLevel::Warning);
//! ```

use crate::settings::Settings;

/// Severity level for a check message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckLevel {
    /// Debugging information.
    Debug = 0,
    /// Informational message.
    Info = 1,
    /// A potential problem.
    Warning = 2,
    /// A definite problem that should be fixed.
    Error = 3,
    /// A critical error that prevents the application from running.
    Critical = 4,
}

impl std::fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A diagnostic message produced by a system check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckMessage {
    /// The severity level.
    pub level: CheckLevel,
    /// The human-readable message describing the issue.
    pub msg: String,
    /// An optional hint on how to fix the issue.
    pub hint: Option<String>,
    /// The object (setting, content type, etc.) that has the issue.
    pub obj: Option<String>,
    /// A unique identifier for this check message (e.g. "contenttypes.W001").
    pub id: Option<String>,
}

impl CheckMessage {
    /// Creates a new `CheckMessage` with the given level and details.
    pub fn new(
        level: CheckLevel,
        msg: impl Into<String>,
        hint: Option<&str>,
        obj: Option<&str>,
        id: Option<&str>,
    ) -> Self {
        Self {
            level,
            msg: msg.into(),
            hint: hint.map(String::from),
            obj: obj.map(String::from),
            id: id.map(String::from),
        }
    }

    /// Creates an info-level message.
    pub fn info(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Info, msg, hint, obj, id)
    }

    /// Creates a warning-level message.
    pub fn warning(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Warning, msg, hint, obj, id)
    }

    /// Creates an error-level message.
    pub fn error(msg: impl Into<String>, hint: Option<&str>, obj: Option<&str>, id: Option<&str>) -> Self {
        Self::new(CheckLevel::Error, msg, hint, obj, id)
    }

    /// Returns `true` if this is a warning or higher severity.
    pub fn is_serious(&self) -> bool {
        self.level >= CheckLevel::Warning
    }
}

impl std::fmt::Display for CheckMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.id {
            write!(f, "({id}) ")?;
        }
        write!(f, "{}: {}", self.level, self.msg)?;
        if let Some(ref hint) = self.hint {
            write!(f, "\n\tHINT: {hint}")?;
        }
        if let Some(ref obj) = self.obj {
            write!(f, "\n\tObject: {obj}")?;
        }
        Ok(())
    }
}

/// A check function that receives settings and returns diagnostic messages.
pub type CheckFn = fn(&Settings) -> Vec<CheckMessage>;

struct RegisteredCheck {
    func: CheckFn,
    tags: Vec<String>,
}

/// Registry for system check functions, filterable by tag.
pub struct CheckRegistry {
    checks: Vec<RegisteredCheck>,
}

impl CheckRegistry {
    /// Creates a new empty check registry.
    pub const fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Creates a registry pre-loaded with the settings checks below.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(check_profile_url, &["auth"]);
        registry.register(check_template_dirs, &["templates"]);
        registry
    }

    /// Registers a check function with the given tags.
    pub fn register(&mut self, func: CheckFn, tags: &[&str]) {
        self.checks.push(RegisteredCheck {
            func,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        });
    }

    /// Runs all registered checks (or only those matching one of `tags`).
    pub fn run_checks(&self, tags: Option<&[&str]>, settings: &Settings) -> Vec<CheckMessage> {
        self.checks
            .iter()
            .filter(|check| {
                tags.map_or(true, |filter_tags| {
                    filter_tags.iter().any(|t| check.tags.iter().any(|own| own == t))
                })
            })
            .flat_map(|check| (check.func)(settings))
            .collect()
    }

    /// Returns the number of registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns `true` if no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// Built-in checks
// ============================================================

/// The profile URL must contain `{username}`, or every user is redirected to
/// the same page after cancelling or deleting.
fn check_profile_url(settings: &Settings) -> Vec<CheckMessage> {
    if settings.profile_url.contains("{username}") {
        return Vec::new();
    }
    vec![CheckMessage::warning(
        "profile_url does not contain {username}.",
        Some("Use a pattern such as \"/profile/{username}/\"."),
        Some("settings.profile_url"),
        Some("auth.W001"),
    )]
}

fn check_template_dirs(settings: &Settings) -> Vec<CheckMessage> {
    settings
        .template_dirs
        .iter()
        .filter(|dir| !dir.is_dir())
        .map(|dir| {
            CheckMessage::warning(
                format!("Template directory '{}' does not exist.", dir.display()),
                None,
                Some("settings.template_dirs"),
                Some("templates.W001"),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_level_ordering() {
        assert!(CheckLevel::Debug < CheckLevel::Info);
        assert!(CheckLevel::Info < CheckLevel::Warning);
        assert!(CheckLevel::Warning < CheckLevel::Error);
        assert!(CheckLevel::Error < CheckLevel::Critical);
    }

    #[test]
    fn test_check_message_display() {
        let m = CheckMessage::warning("Bad thing", Some("Fix it"), Some("news"), Some("x.W001"));
        let text = m.to_string();
        assert!(text.starts_with("(x.W001) WARNING: Bad thing"));
        assert!(text.contains("HINT: Fix it"));
        assert!(text.contains("Object: news"));
    }

    #[test]
    fn test_is_serious() {
        assert!(!CheckMessage::info("i", None, None, None).is_serious());
        assert!(CheckMessage::warning("w", None, None, None).is_serious());
        assert!(CheckMessage::error("e", None, None, None).is_serious());
    }

    #[test]
    fn test_builtins_clean_on_defaults() {
        let registry = CheckRegistry::with_builtins();
        assert_eq!(registry.len(), 2);
        assert!(registry.run_checks(None, &Settings::default()).is_empty());
    }

    #[test]
    fn test_profile_url_check() {
        let settings = Settings {
            profile_url: "/home/".to_string(),
            ..Settings::default()
        };
        let messages = CheckRegistry::with_builtins().run_checks(Some(&["auth"]), &settings);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id.as_deref(), Some("auth.W001"));
    }

    #[test]
    fn test_template_dir_check() {
        let settings = Settings {
            template_dirs: vec!["/definitely/not/here".into()],
            ..Settings::default()
        };
        let registry = CheckRegistry::with_builtins();
        assert_eq!(registry.run_checks(Some(&["templates"]), &settings).len(), 1);
        assert!(registry.run_checks(Some(&["auth"]), &settings).is_empty());
    }
}
