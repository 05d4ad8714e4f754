//! The content-type registry.
//!
//! [`CTRegistry`] maps a content-type name to a [`ContentTypeEntry`], an open
//! attribute dictionary. Any attribute is accepted; these are the ones the
//! views and menus read:
//!
//! | Attribute           | Meaning                                             |
//! |---------------------|-----------------------------------------------------|
//! | `model`             | Model name backing the type                         |
//! | `app`               | App id, used in URL names and template paths        |
//! | `label`             | Front-end name of the type                          |
//! | `global_add`        | Show in the global add menu                         |
//! | `global_filter`     | Show in the search filters                          |
//! | `add_permission`    | Permission needed to add                            |
//! | `view_permission`   | Permission needed to view                           |
//! | `edit_permission`   | Permission needed to edit                           |
//! | `delete_permission` | Permission needed to delete                         |
//! | `name_plural`       | Plural label                                        |
//! | `filter_label`      | Label in the search filter; empty hides the type    |
//! | `group_add`         | Can be added in a group context                     |
//! | `create_tmp_object` | Create a temporary object when the add form opens   |
//! | `template_name`     | Explicit template, bypassing the naming convention  |
//!
//! The registry is built once at start-up and shared behind an `Arc`.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use djinn_core::checks::CheckMessage;
use djinn_core::settings::DefaultPermissions;
use djinn_core::Settings;

/// The attribute dictionary of one content type.
///
/// # Examples
///
/// ```
/// use djinn_contenttypes::registry::ContentTypeEntry;
///
/// let entry = ContentTypeEntry::new()
///     .with("app", "djinn_news")
///     .with("label", "News")
///     .with("global_add", true);
///
/// assert_eq!(entry.app(), Some("djinn_news"));
/// assert!(entry.global_add());
/// assert!(!entry.group_add());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentTypeEntry {
    attrs: Map<String, Value>,
}

impl ContentTypeEntry {
    /// Creates an entry with no attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an entry from a raw attribute map.
    pub const fn from_map(attrs: Map<String, Value>) -> Self {
        Self { attrs }
    }

    /// Returns the entry with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets an attribute.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attrs.insert(key.to_string(), value.into());
    }

    /// Returns an attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// Returns a string attribute; other JSON types yield `None`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// Returns the truthiness of an attribute; missing is `false`.
    pub fn get_flag(&self, key: &str) -> bool {
        self.attrs.get(key).is_some_and(is_truthy)
    }

    /// Returns the underlying attribute map.
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.attrs
    }

    pub fn model(&self) -> Option<&str> {
        self.get_str("model")
    }

    pub fn app(&self) -> Option<&str> {
        self.get_str("app")
    }

    pub fn label(&self) -> Option<&str> {
        self.get_str("label")
    }

    pub fn name_plural(&self) -> Option<&str> {
        self.get_str("name_plural")
    }

    pub fn filter_label(&self) -> Option<&str> {
        self.get_str("filter_label")
    }

    pub fn template_name(&self) -> Option<&str> {
        self.get_str("template_name")
    }

    pub fn global_add(&self) -> bool {
        self.get_flag("global_add")
    }

    pub fn global_filter(&self) -> bool {
        self.get_flag("global_filter")
    }

    pub fn group_add(&self) -> bool {
        self.get_flag("group_add")
    }

    pub fn create_tmp_object(&self) -> bool {
        self.get_flag("create_tmp_object")
    }

    /// Returns the configured permission of the given kind.
    pub fn permission(&self, kind: PermissionKind) -> Option<&str> {
        self.get_str(kind.attr())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// The four permissions a content type can configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionKind {
    View,
    Add,
    Edit,
    Delete,
}

impl PermissionKind {
    /// The registry attribute holding this permission.
    pub const fn attr(self) -> &'static str {
        match self {
            Self::View => "view_permission",
            Self::Add => "add_permission",
            Self::Edit => "edit_permission",
            Self::Delete => "delete_permission",
        }
    }

    /// The fallback permission name.
    pub fn default_from(self, defaults: &DefaultPermissions) -> &str {
        match self {
            Self::View => &defaults.view,
            Self::Add => &defaults.add,
            Self::Edit => &defaults.edit,
            Self::Delete => &defaults.delete,
        }
    }
}

/// Registry of content types, keyed by name.
///
/// # Examples
///
/// ```
/// use djinn_contenttypes::registry::{CTRegistry, ContentTypeEntry};
///
/// let registry = CTRegistry::new();
/// registry.register("news", ContentTypeEntry::new().with("app", "djinn_news"));
/// registry.register("event", ContentTypeEntry::new().with("app", "djinn_events"));
///
/// assert_eq!(registry.list_types(&["event"]), vec!["news".to_string()]);
/// assert_eq!(
///     registry.get_attr_or("news", "label", serde_json::json!("Content")),
///     serde_json::json!("Content")
/// );
/// ```
#[derive(Debug, Default)]
pub struct CTRegistry {
    types: RwLock<BTreeMap<String, ContentTypeEntry>>,
}

impl CTRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from the `[content_types.<name>]` settings tables.
    pub fn from_settings(settings: &Settings) -> Self {
        let registry = Self::new();
        for (name, attrs) in &settings.content_types {
            registry.register(name, ContentTypeEntry::from_map(attrs.clone()));
        }
        registry
    }

    /// Registers a content type. Registering a name again overwrites it.
    pub fn register(&self, name: &str, entry: ContentTypeEntry) {
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        if types.insert(name.to_string(), entry).is_some() {
            tracing::debug!(name, "content type re-registered, previous entry replaced");
        } else {
            tracing::debug!(name, "content type registered");
        }
    }

    /// Returns all details of a content type.
    pub fn get(&self, name: &str) -> Option<ContentTypeEntry> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Returns one attribute, or `None` if the type or attribute is missing.
    pub fn get_attr(&self, name: &str, attr: &str) -> Option<Value> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .and_then(|entry| entry.get(attr))
            .cloned()
    }

    /// Returns one attribute, or `default` if the type or attribute is missing.
    pub fn get_attr_or(&self, name: &str, attr: &str, default: Value) -> Value {
        self.get_attr(name, attr).unwrap_or(default)
    }

    /// Returns the model name of a registered type, defaulting to its key.
    pub fn model(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|entry| entry.model().unwrap_or(name).to_string())
    }

    /// Returns the permission of the given kind for a type, falling back to
    /// the configured default.
    pub fn permission(&self, name: &str, kind: PermissionKind, defaults: &DefaultPermissions) -> String {
        self.get_attr(name, kind.attr())
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| kind.default_from(defaults).to_string())
    }

    /// Returns the registered names not in `excludes`, sorted.
    pub fn list_types(&self, excludes: &[&str]) -> Vec<String> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|name| !excludes.contains(&name.as_str()))
            .cloned()
            .collect()
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.types.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports entries whose lookups would silently fall back to defaults.
    pub fn check(&self) -> Vec<CheckMessage> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        let mut messages = Vec::new();
        for (name, entry) in types.iter() {
            if entry.app().is_none() {
                messages.push(CheckMessage::warning(
                    format!("Content type '{name}' has no 'app' attribute."),
                    Some("Set 'app' to the application the type belongs to."),
                    Some(name),
                    Some("contenttypes.W001"),
                ));
            }
            if entry.label().is_none() {
                messages.push(CheckMessage::info(
                    format!("Content type '{name}' has no 'label'; its name is shown instead."),
                    None,
                    Some(name),
                    Some("contenttypes.I001"),
                ));
            }
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn news() -> ContentTypeEntry {
        ContentTypeEntry::new()
            .with("app", "djinn_news")
            .with("label", "News")
            .with("add_permission", "djinn_news.add_news")
    }

    #[test]
    fn test_register_and_get() {
        let registry = CTRegistry::new();
        registry.register("news", news());
        assert_eq!(registry.get("news").unwrap().label(), Some("News"));
        assert!(registry.get("event").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_overwrites() {
        let registry = CTRegistry::new();
        registry.register("news", news());
        registry.register("news", ContentTypeEntry::new().with("label", "Nieuws"));
        let entry = registry.get("news").unwrap();
        assert_eq!(entry.label(), Some("Nieuws"));
        assert_eq!(entry.app(), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_model_defaults_to_key() {
        let registry = CTRegistry::new();
        registry.register("news", news());
        registry.register("event", news().with("model", "agendaitem"));
        assert_eq!(registry.model("news").as_deref(), Some("news"));
        assert_eq!(registry.model("event").as_deref(), Some("agendaitem"));
        assert_eq!(registry.model("nope"), None);
    }

    #[test]
    fn test_get_attr() {
        let registry = CTRegistry::new();
        registry.register("news", news());
        assert_eq!(registry.get_attr("news", "app"), Some(json!("djinn_news")));
        assert_eq!(registry.get_attr("news", "missing"), None);
        assert_eq!(registry.get_attr("nope", "app"), None);
        assert_eq!(registry.get_attr_or("nope", "app", json!(42)), json!(42));
    }

    #[test]
    fn test_list_types_sorted_with_excludes() {
        let registry = CTRegistry::new();
        registry.register("news", news());
        registry.register("event", news());
        registry.register("blog", news());
        assert_eq!(registry.list_types(&[]), vec!["blog", "event", "news"]);
        assert_eq!(registry.list_types(&["blog", "nope"]), vec!["event", "news"]);
    }

    #[test]
    fn test_permission_falls_back_to_defaults() {
        let registry = CTRegistry::new();
        registry.register("news", news());
        let defaults = DefaultPermissions::default();
        assert_eq!(
            registry.permission("news", PermissionKind::Add, &defaults),
            "djinn_news.add_news"
        );
        assert_eq!(
            registry.permission("news", PermissionKind::Edit, &defaults),
            "contenttypes.change_contenttype"
        );
        assert_eq!(
            registry.permission("unregistered", PermissionKind::View, &defaults),
            "contenttypes.view"
        );
    }

    #[test]
    fn test_flags() {
        let entry = ContentTypeEntry::new()
            .with("global_add", 1)
            .with("global_filter", "")
            .with("group_add", true)
            .with("create_tmp_object", false);
        assert!(entry.global_add());
        assert!(!entry.global_filter());
        assert!(entry.group_add());
        assert!(!entry.create_tmp_object());
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        let mut attrs = Map::new();
        attrs.insert("app".into(), json!("djinn_news"));
        settings.content_types.insert("news".into(), attrs);

        let registry = CTRegistry::from_settings(&settings);
        assert_eq!(registry.get("news").unwrap().app(), Some("djinn_news"));
    }

    #[test]
    fn test_check_reports_missing_keys() {
        let registry = CTRegistry::new();
        registry.register("news", news());
        registry.register("bare", ContentTypeEntry::new());

        let messages = registry.check();
        let ids: Vec<_> = messages.iter().filter_map(|m| m.id.as_deref()).collect();
        assert_eq!(ids, vec!["contenttypes.W001", "contenttypes.I001"]);
        assert!(messages.iter().all(|m| m.obj.as_deref() == Some("bare")));
    }

    #[test]
    fn test_entry_serde_is_flat() {
        let entry: ContentTypeEntry =
            serde_json::from_value(json!({"app": "a", "global_add": true})).unwrap();
        assert_eq!(entry.app(), Some("a"));
        assert_eq!(serde_json::to_value(&entry).unwrap()["global_add"], json!(true));
    }
}
