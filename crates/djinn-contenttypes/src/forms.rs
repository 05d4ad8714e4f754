//! Content forms.
//!
//! A [`ContentForm`] is a list of [`FieldDef`]s. It validates submitted
//! [`QueryDict`] data into cleaned JSON values and writes them into a
//! [`ContentObject`]. Three field names map onto typed columns instead of
//! [`ContentObject::fields`]: `slug`, `publish_from` and `publish_to`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use djinn_core::ValidationErrors;
use djinn_http::QueryDict;

use crate::content::ContentObject;

const REQUIRED: &str = "This field is required.";

/// The kind of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single-line string, optionally bounded.
    Char { max_length: Option<usize> },
    /// Free text.
    Text,
    Integer,
    /// A checkbox; absent means `false`.
    Boolean,
    /// RFC 3339, or `YYYY-MM-DD HH:MM[:SS]` read as UTC.
    DateTime,
    /// Letters, digits, hyphens and underscores.
    Slug,
}

impl FieldKind {
    const fn name(self) -> &'static str {
        match self {
            Self::Char { .. } => "char",
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Slug => "slug",
        }
    }
}

/// One form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub label: String,
}

impl FieldDef {
    /// Creates a required field labelled after its name.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        let label = capitalize(&name.replace('_', " "));
        Self {
            name,
            kind,
            required: true,
            label,
        }
    }

    pub fn char(name: impl Into<String>, max_length: usize) -> Self {
        Self::new(name, FieldKind::Char { max_length: Some(max_length) })
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean).optional()
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::DateTime)
    }

    pub fn slug(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Slug)
    }

    /// Makes the field optional.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Sets the display label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Cleans one raw value. Empty optional values clean to `null`.
    ///
    /// # Examples
    ///
    /// ```
    /// use djinn_contenttypes::forms::FieldDef;
    ///
    /// let field = FieldDef::integer("weight");
    /// assert_eq!(field.clean(Some("12")), Ok(serde_json::json!(12)));
    /// assert!(field.clean(Some("twelve")).is_err());
    /// assert!(field.clean(None).is_err());
    /// ```
    pub fn clean(&self, raw: Option<&str>) -> Result<Value, String> {
        if self.kind == FieldKind::Boolean {
            return Ok(Value::Bool(raw.is_some_and(is_checked)));
        }

        let value = raw.map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return if self.required {
                Err(REQUIRED.to_string())
            } else {
                Ok(Value::Null)
            };
        }

        match self.kind {
            FieldKind::Char { max_length } => {
                let length = value.chars().count();
                match max_length {
                    Some(max) if length > max => Err(format!(
                        "Ensure this value has at most {max} characters (it has {length})."
                    )),
                    _ => Ok(Value::from(value)),
                }
            }
            FieldKind::Text => Ok(Value::from(value)),
            FieldKind::Integer => value
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| "Enter a whole number.".to_string()),
            FieldKind::DateTime => parse_datetime(value)
                .map(|dt| Value::from(dt.to_rfc3339()))
                .ok_or_else(|| "Enter a valid date/time.".to_string()),
            FieldKind::Slug => {
                if value
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
                {
                    Ok(Value::from(value))
                } else {
                    Err("Enter a valid slug consisting of letters, numbers, underscores or hyphens.".to_string())
                }
            }
            FieldKind::Boolean => Ok(Value::Bool(is_checked(value))),
        }
    }
}

fn is_checked(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "off" | "no"
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Parses the date/time formats accepted by [`FieldKind::DateTime`].
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// A set of fields validated together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentForm {
    fields: Vec<FieldDef>,
}

impl ContentForm {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validates submitted data.
    ///
    /// With `partial`, fields absent from `data` are skipped: neither
    /// required nor present in the result.
    ///
    /// # Examples
    ///
    /// ```
    /// use djinn_contenttypes::forms::{ContentForm, FieldDef};
    /// use djinn_http::QueryDict;
    ///
    /// let form = ContentForm::new(vec![FieldDef::char("title", 100), FieldDef::text("body")]);
    /// let data = QueryDict::parse("title=Hello");
    ///
    /// assert!(form.validate(&data, false).is_err());
    /// let cleaned = form.validate(&data, true).unwrap();
    /// assert_eq!(cleaned.len(), 1);
    /// ```
    pub fn validate(&self, data: &QueryDict, partial: bool) -> Result<Map<String, Value>, ValidationErrors> {
        let mut cleaned = Map::new();
        let mut errors = ValidationErrors::new();

        for field in &self.fields {
            if partial && !data.contains_key(&field.name) {
                continue;
            }
            match field.clean(data.get(&field.name)) {
                Ok(value) => {
                    cleaned.insert(field.name.clone(), value);
                }
                Err(message) => errors.add(&field.name, message),
            }
        }

        if errors.is_empty() {
            Ok(cleaned)
        } else {
            Err(errors)
        }
    }

    /// Cleans whatever initial data is usable, skipping unknown fields and
    /// values that fail to clean.
    pub fn clean_initial(&self, initial: &QueryDict) -> Map<String, Value> {
        initial
            .iter()
            .filter_map(|(name, raw)| {
                let field = self.field(name)?;
                field.clean(Some(raw)).ok().map(|v| (name.to_string(), v))
            })
            .collect()
    }

    /// Writes cleaned data into `object`.
    pub fn apply(&self, object: &mut ContentObject, cleaned: Map<String, Value>) {
        for (name, value) in cleaned {
            match name.as_str() {
                "slug" => object.slug = value.as_str().map(String::from),
                "publish_from" => object.publish_from = value.as_str().and_then(parse_datetime),
                "publish_to" => object.publish_to = value.as_str().and_then(parse_datetime),
                _ => {
                    object.fields.insert(name, value);
                }
            }
        }
    }

    /// Returns the current values of `object` for this form's fields.
    pub fn values_of(&self, object: &ContentObject) -> Map<String, Value> {
        self.fields
            .iter()
            .filter_map(|field| {
                let value = match field.name.as_str() {
                    "slug" => object.slug.clone().map(Value::from),
                    "publish_from" => object.publish_from.map(|dt| Value::from(dt.to_rfc3339())),
                    "publish_to" => object.publish_to.map(|dt| Value::from(dt.to_rfc3339())),
                    name => object.field(name).cloned(),
                }?;
                Some((field.name.clone(), value))
            })
            .collect()
    }

    /// Builds the template context for the fields: one object per field with
    /// `name`, `label`, `kind`, `required`, `value` (a string) and `errors`.
    pub fn context(&self, values: &Map<String, Value>, errors: Option<&ValidationErrors>) -> Value {
        let fields = self
            .fields
            .iter()
            .map(|field| {
                let value = match values.get(&field.name) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                };
                let field_errors = errors
                    .and_then(|e| e.get(&field.name))
                    .map(<[String]>::to_vec)
                    .unwrap_or_default();
                serde_json::json!({
                    "name": field.name,
                    "label": field.label,
                    "kind": field.kind.name(),
                    "required": field.required,
                    "value": value,
                    "errors": field_errors,
                })
            })
            .collect();
        Value::Array(fields)
    }
}

/// Converts a [`QueryDict`] into a JSON map of last values.
pub fn data_map(data: &QueryDict) -> Map<String, Value> {
    data.iter()
        .map(|(k, v)| (k.to_string(), Value::from(v)))
        .collect()
}
