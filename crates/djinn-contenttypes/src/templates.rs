//! Template resolution and rendering.
//!
//! [`TemplateResolver`] turns a content type, a view mode and the request
//! into an ordered list of candidate template names:
//!
//! 1. the configured `template_name`, if any, and nothing else;
//! 2. otherwise `<app>/<ct>_<mode><modal>.html` then
//!    `djinn_contenttypes/base_<mode><modal>.html`, where `<modal>` is
//!    `_modal` for AJAX requests or when the `modal` query parameter is set;
//! 3. detail views answering an AJAX request that did not ask for a modal
//!    try `<app>/snippets/<ct>.html` first.
//!
//! [`TemplateRenderer`] renders the first candidate that exists with `tera`.
//! The `djinn_contenttypes/base_*` templates are built in; template
//! directories can override them.

use std::fmt;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tera::Tera;

use djinn_core::{ContentError, ContentResult};
use djinn_http::HttpRequest;

/// The mode a view renders in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Add,
    Edit,
    Detail,
    Delete,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Detail => "detail",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes candidate template names for one content type.
///
/// # Examples
///
/// ```
/// use djinn_contenttypes::templates::{Mode, TemplateResolver};
/// use djinn_http::HttpRequest;
///
/// let resolver = TemplateResolver::new("djinn_news", "news");
/// let request = HttpRequest::builder().query_string("modal=1").build();
///
/// assert_eq!(
///     resolver.template_names(Mode::Edit, &request),
///     vec![
///         "djinn_news/news_edit_modal.html".to_string(),
///         "djinn_contenttypes/base_edit_modal.html".to_string(),
///     ]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateResolver {
    app: String,
    ct: String,
    template_name: Option<String>,
}

impl TemplateResolver {
    pub fn new(app: impl Into<String>, ct: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            ct: ct.into(),
            template_name: None,
        }
    }

    /// Sets an explicit template that bypasses the naming convention.
    #[must_use]
    pub fn with_template_name(mut self, template_name: Option<String>) -> Self {
        self.template_name = template_name;
        self
    }

    pub fn template_names(&self, mode: Mode, request: &HttpRequest) -> Vec<String> {
        if let Some(name) = &self.template_name {
            return vec![name.clone()];
        }

        let modal = if request.get().is_set("modal") || request.is_ajax() {
            "_modal"
        } else {
            ""
        };

        let mut names = Vec::with_capacity(3);
        if mode == Mode::Detail && request.is_ajax() && !request.param_is_set("modal") {
            names.push(format!("{}/snippets/{}.html", self.app, self.ct));
        }
        names.push(format!("{}/{}_{mode}{modal}.html", self.app, self.ct));
        names.push(format!("djinn_contenttypes/base_{mode}{modal}.html"));
        names
    }
}

const BASE_PAGE_START: &str = r#"<!DOCTYPE html>
<html>
<head><title>{{ ct_label }}</title></head>
<body>
{% for message in messages %}<p class="message {{ message.level }}">{{ message.message }}</p>
{% endfor %}"#;

const BASE_PAGE_END: &str = "</body>\n</html>\n";

const DETAIL_BODY: &str = r#"<article class="{{ ct_name }}">
<h1>{{ ct_label }} {{ object.id }}</h1>
<dl>
{% for key, value in object.fields %}<dt>{{ key }}</dt><dd>{{ value }}</dd>
{% endfor %}</dl>
{% if edit_url %}<a href="{{ edit_url | safe }}">Edit</a>{% endif %}
{% if delete_url %}<a href="{{ delete_url | safe }}">Delete</a>{% endif %}
</article>
"#;

const FORM_BODY: &str = r#"<form method="post" action="{{ form_action | safe }}" class="{{ ct_name }}-{{ mode }}">
{% if object %}{% if object.is_tmp %}<input type="hidden" name="is_tmp" value="{{ object.id }}">
{% endif %}{% endif %}{% for field in form %}<p>
<label for="id_{{ field.name }}">{{ field.label }}</label>
{% if field.kind == "boolean" %}<input type="checkbox" id="id_{{ field.name }}" name="{{ field.name }}"{% if field.value == "true" %} checked{% endif %}>
{% elif field.kind == "text" %}<textarea id="id_{{ field.name }}" name="{{ field.name }}">{{ field.value }}</textarea>
{% else %}<input type="text" id="id_{{ field.name }}" name="{{ field.name }}" value="{{ field.value }}">
{% endif %}{% for error in field.errors %}<span class="error">{{ error }}</span>
{% endfor %}</p>
{% endfor %}<button type="submit" name="action" value="save">Save</button>
<button type="submit" name="action" value="cancel">Cancel</button>
</form>
"#;

const DELETE_BODY: &str = r#"<form method="post" action="{{ delete_url | safe }}">
<p>Delete {{ ct_label }} {{ object.id }}?</p>
<button type="submit">Delete</button>
</form>
"#;

fn builtin_templates() -> Vec<(String, String)> {
    let bodies = [
        (Mode::Add, FORM_BODY),
        (Mode::Edit, FORM_BODY),
        (Mode::Detail, DETAIL_BODY),
        (Mode::Delete, DELETE_BODY),
    ];
    bodies
        .iter()
        .flat_map(|(mode, body)| {
            [
                (
                    format!("djinn_contenttypes/base_{mode}.html"),
                    format!("{BASE_PAGE_START}\n{body}{BASE_PAGE_END}"),
                ),
                (
                    format!("djinn_contenttypes/base_{mode}_modal.html"),
                    format!("<div class=\"modal\">\n{body}</div>\n"),
                ),
            ]
        })
        .collect()
}

/// Renders templates with `tera`.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Creates a renderer with only the built-in templates.
    pub fn new() -> ContentResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(builtin_templates())
            .map_err(|e| ContentError::TemplateError(e.to_string()))?;
        Ok(Self { tera })
    }

    /// Loads `**/*.html` from each directory, in order, over the built-ins.
    /// Missing directories are skipped.
    pub fn from_dirs(dirs: &[PathBuf]) -> ContentResult<Self> {
        let mut tera = Tera::default();
        for dir in dirs {
            if !dir.is_dir() {
                tracing::warn!(dir = %dir.display(), "template directory does not exist, skipping");
                continue;
            }
            let glob = format!("{}/**/*.html", dir.display());
            let loaded = Tera::new(&glob).map_err(|e| {
                ContentError::TemplateError(format!("Loading templates from {}: {e}", dir.display()))
            })?;
            tracing::debug!(dir = %dir.display(), count = loaded.get_template_names().count(), "loaded templates");
            tera.extend(&loaded)
                .map_err(|e| ContentError::TemplateError(e.to_string()))?;
        }
        tera.extend(&Self::new()?.tera)
            .map_err(|e| ContentError::TemplateError(e.to_string()))?;
        Ok(Self { tera })
    }

    /// Adds or replaces a template.
    pub fn add_template(&mut self, name: &str, content: &str) -> ContentResult<()> {
        self.tera
            .add_raw_template(name, content)
            .map_err(|e| ContentError::TemplateError(format!("{name}: {e}")))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Renders the first of `names` that exists.
    pub fn render(&self, names: &[String], context: &Map<String, Value>) -> ContentResult<String> {
        let name = names
            .iter()
            .find(|name| self.has_template(name))
            .ok_or_else(|| ContentError::TemplateDoesNotExist(names.join(", ")))?;
        let context = tera::Context::from_serialize(context)
            .map_err(|e| ContentError::TemplateError(e.to_string()))?;
        tracing::trace!(template = %name, "rendering");
        self.tera
            .render(name, &context)
            .map_err(|e| ContentError::TemplateError(format!("{name}: {e:?}")))
    }
}
