//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `DJINN_DEBUG` | `debug` |
//! | `DJINN_LOG_LEVEL` | `log_level` |
//! | `DJINN_BIND_ADDRESS` | `bind_address` |
//! | `DJINN_PROFILE_URL` | `profile_url` |
//! | `DJINN_TEMPLATE_DIRS` | `template_dirs` (comma-separated) |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use djinn_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("djinn.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::ContentError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Fields missing from the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, ContentError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| ContentError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_onto_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, ContentError> {
    from_toml_str(&read_file(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, ContentError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, ContentError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| ContentError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_onto_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, ContentError> {
    from_json_str(&read_file(path.as_ref(), "JSON")?)
}

/// Loads settings from a file, choosing the format by extension
/// (`.json` is JSON, anything else TOML), then applies environment overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, ContentError> {
    let path = path.as_ref();
    let mut settings = if path.extension().is_some_and(|ext| ext == "json") {
        from_json_file(path)?
    } else {
        from_toml_file(path)?
    };
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `DJINN_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

/// Applies overrides from an arbitrary lookup; `apply_env_overrides` passes
/// the process environment.
fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("DJINN_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("DJINN_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("DJINN_BIND_ADDRESS") {
        settings.bind_address = val;
    }

    if let Some(val) = lookup("DJINN_PROFILE_URL") {
        settings.profile_url = val;
    }

    if let Some(val) = lookup("DJINN_TEMPLATE_DIRS") {
        settings.template_dirs = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_file(path: &Path, format: &str) -> Result<String, ContentError> {
    std::fs::read_to_string(path).map_err(|e| {
        ContentError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_onto_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<Settings, ContentError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        ContentError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        ContentError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => serde_json::Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            log_level = "debug"
            bind_address = "0.0.0.0:9000"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.bind_address, "0.0.0.0:9000");
        // Defaults preserved
        assert_eq!(settings.profile_url, "/profile/{username}/");
    }

    #[test]
    fn test_from_toml_str_content_types() {
        let toml = r#"
            [content_types.news]
            app = "djinn_news"
            label = "News"
            global_add = true
            create_tmp_object = true

            [content_types.event]
            app = "djinn_events"
            view_permission = "djinn_events.view_event"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.content_types.len(), 2);
        let news = &settings.content_types["news"];
        assert_eq!(news["app"], serde_json::json!("djinn_news"));
        assert_eq!(news["global_add"], serde_json::json!(true));
        assert_eq!(
            settings.content_types["event"]["view_permission"],
            serde_json::json!("djinn_events.view_event")
        );
    }

    #[test]
    fn test_from_toml_str_partial_default_permissions() {
        let toml = r#"
            [default_permissions]
            view = "intranet.view"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.default_permissions.view, "intranet.view");
        assert_eq!(
            settings.default_permissions.add,
            "contenttypes.add_contenttype"
        );
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("[[invalid toml content");
        assert!(matches!(result, Err(ContentError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str("debug = \"not a bool\"");
        assert!(result.is_err());
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{
            "debug": false,
            "owner_permissions": ["contenttypes.view"]
        }"#;

        let settings = from_json_str(json).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.owner_permissions, vec!["contenttypes.view"]);
    }

    #[test]
    fn test_from_json_str_empty_object() {
        let settings = from_json_str("{}").unwrap();
        assert!(settings.debug);
    }

    // ── Files ───────────────────────────────────────────────────────

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "log_level = \"warn\"").unwrap();

        let settings = from_toml_file(file.path()).unwrap();
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "{{\"log_level\": \"error\"}}").unwrap();

        let settings = from_json_file(file.path()).unwrap();
        assert_eq!(settings.log_level, "error");
    }

    #[test]
    fn test_from_file_missing() {
        let result = from_toml_file("/nonexistent/djinn.toml");
        assert!(matches!(result, Err(ContentError::ConfigurationError(_))));
    }

    // ── Overrides ───────────────────────────────────────────────────

    #[test]
    fn test_apply_overrides() {
        let env: HashMap<&str, &str> = [
            ("DJINN_DEBUG", "false"),
            ("DJINN_LOG_LEVEL", "trace"),
            ("DJINN_BIND_ADDRESS", "0.0.0.0:80"),
            ("DJINN_PROFILE_URL", "/people/{username}"),
            ("DJINN_TEMPLATE_DIRS", "templates, shared/templates,"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        apply_overrides(&mut settings, |key| env.get(key).map(|v| (*v).to_string()));

        assert!(!settings.debug);
        assert_eq!(settings.log_level, "trace");
        assert_eq!(settings.bind_address, "0.0.0.0:80");
        assert_eq!(settings.profile_url_for("ann"), "/people/ann");
        assert_eq!(
            settings.template_dirs,
            vec![PathBuf::from("templates"), PathBuf::from("shared/templates")]
        );
    }

    #[test]
    fn test_apply_overrides_debug_truthy() {
        let mut settings = Settings::default();
        settings.debug = false;
        apply_overrides(&mut settings, |key| {
            (key == "DJINN_DEBUG").then(|| "YES".to_string())
        });
        assert!(settings.debug);
    }

    // ── Helpers ─────────────────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"a": {"x": 1, "y": 2}, "b": 1});
        let over = serde_json::json!({"a": {"y": 3}});
        let merged = merge_json(base, over);
        assert_eq!(merged, serde_json::json!({"a": {"x": 1, "y": 3}, "b": 1}));
    }
}
