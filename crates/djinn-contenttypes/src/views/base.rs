//! The view trait and what the content views share.
//!
//! [`View`] dispatches on the HTTP method, answering 405 for anything a view
//! does not implement. The content views are composed from a shared
//! [`ViewContext`] (registry, store, auth backend, permission checker, URL
//! conf, templates, settings) and per-type [`ContentTypeOptions`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde_json::{Map, Value};

use djinn_auth::{AuthBackend, PermissionChecker, User};
use djinn_core::{ContentError, ContentResult, Settings};
use djinn_http::urls::UrlConf;
use djinn_http::{HttpRequest, HttpResponse};

use crate::content::ContentObject;
use crate::forms::ContentForm;
use crate::messages;
use crate::registry::{CTRegistry, ContentTypeEntry, PermissionKind};
use crate::store::ObjectStore;
use crate::templates::{Mode, TemplateRenderer, TemplateResolver};

/// Base trait for views, mirroring Django's `View`.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use djinn_contenttypes::views::View;
/// use djinn_http::{HttpRequest, HttpResponse};
///
/// struct Ping;
///
/// #[async_trait]
/// impl View for Ping {
///     async fn get(&self, _request: HttpRequest) -> HttpResponse {
///         HttpResponse::ok("pong")
///     }
/// }
/// ```
#[async_trait]
pub trait View: Send + Sync {
    /// Returns the HTTP methods this view allows.
    fn allowed_methods(&self) -> Vec<Method> {
        vec![Method::GET, Method::HEAD]
    }

    /// Dispatches the request to the handler for its method.
    async fn dispatch(&self, request: HttpRequest) -> HttpResponse {
        match *request.method() {
            Method::GET => self.get(request).await,
            Method::POST => self.post(request).await,
            Method::DELETE => self.delete(request).await,
            Method::HEAD => self.head(request).await,
            _ => self.http_method_not_allowed(request).await,
        }
    }

    /// Handles GET requests. Returns 405 by default.
    async fn get(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles POST requests. Returns 405 by default.
    async fn post(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles DELETE requests. Returns 405 by default.
    async fn delete(&self, request: HttpRequest) -> HttpResponse {
        self.http_method_not_allowed(request).await
    }

    /// Handles HEAD requests. Delegates to `get` by default.
    async fn head(&self, request: HttpRequest) -> HttpResponse {
        self.get(request).await
    }

    /// Returns a 405 Method Not Allowed response with the allowed methods header.
    async fn http_method_not_allowed(&self, request: HttpRequest) -> HttpResponse {
        tracing::debug!(method = %request.method(), path = request.path(), "method not allowed");
        let methods = self.allowed_methods();
        let method_strs: Vec<&str> = methods.iter().map(Method::as_str).collect();
        HttpResponse::not_allowed(&method_strs)
    }
}

/// Everything the content views need, shared by all of them.
pub struct ViewContext {
    pub settings: Settings,
    pub registry: Arc<CTRegistry>,
    pub store: Arc<dyn ObjectStore>,
    pub auth: Arc<dyn AuthBackend>,
    pub permissions: PermissionChecker,
    pub urls: UrlConf,
    pub templates: TemplateRenderer,
}

impl ViewContext {
    /// Creates a context; the permission checker is configured from `settings`.
    pub fn new(
        settings: Settings,
        registry: Arc<CTRegistry>,
        store: Arc<dyn ObjectStore>,
        auth: Arc<dyn AuthBackend>,
        urls: UrlConf,
        templates: TemplateRenderer,
    ) -> Self {
        Self {
            permissions: PermissionChecker::from_settings(&settings),
            settings,
            registry,
            store,
            auth,
            urls,
            templates,
        }
    }

    /// Returns the permission of `kind` configured for `ct`, or the default.
    pub fn permission(&self, ct: &str, kind: PermissionKind) -> String {
        self.registry
            .permission(ct, kind, &self.settings.default_permissions)
    }

    /// Returns the profile page of `user`.
    pub fn profile_url(&self, user: &User) -> String {
        user.profile_url(&self.settings.profile_url)
    }

    /// Checks `kind` for `user` against `object`.
    pub(crate) fn require_permission(
        &self,
        ct: &str,
        kind: PermissionKind,
        user: &User,
        object: &ContentObject,
    ) -> ContentResult<()> {
        let perm = self.permission(ct, kind);
        if self.permissions.has_permission(&perm, user, Some(object)) {
            Ok(())
        } else {
            Err(ContentError::PermissionDenied(format!(
                "'{}' lacks '{perm}' on {ct} {}",
                user.username, object.id
            )))
        }
    }

    /// Returns the add URL, built from the request's URL arguments.
    pub fn add_url(&self, options: &ContentTypeOptions, kwargs: &HashMap<String, String>) -> ContentResult<String> {
        self.urls.reverse(&options.url_name("add"), kwargs)
    }

    /// Returns the detail URL: `pk`, plus `slug` when the object has one.
    pub fn view_url(&self, options: &ContentTypeOptions, object: &ContentObject) -> ContentResult<String> {
        let mut kwargs = pk_kwargs(object);
        if let Some(slug) = object.url_slug() {
            kwargs.insert("slug".to_string(), slug.to_string());
        }
        self.urls.reverse(&options.url_name("view"), &kwargs)
    }

    pub fn edit_url(&self, options: &ContentTypeOptions, object: &ContentObject) -> ContentResult<String> {
        self.urls.reverse(&options.url_name("edit"), &pk_kwargs(object))
    }

    pub fn delete_url(&self, options: &ContentTypeOptions, object: &ContentObject) -> ContentResult<String> {
        self.urls.reverse(&options.url_name("delete"), &pk_kwargs(object))
    }

    /// Adds `object` and its URLs to a template context. URLs that cannot
    /// be reversed are left empty.
    pub(crate) fn insert_object(
        &self,
        context: &mut Map<String, Value>,
        options: &ContentTypeOptions,
        object: Option<&ContentObject>,
    ) -> ContentResult<()> {
        let Some(object) = object else {
            context.insert("object".into(), Value::Null);
            return Ok(());
        };
        let urls = [
            ("view_url", self.view_url(options, object)),
            ("edit_url", self.edit_url(options, object)),
            ("delete_url", self.delete_url(options, object)),
        ];
        for (key, url) in urls {
            context.insert(key.into(), Value::from(url.unwrap_or_default()));
        }
        let value = serde_json::to_value(object)
            .map_err(|e| ContentError::TemplateError(format!("Serializing object: {e}")))?;
        context.insert("object".into(), value);
        Ok(())
    }

    /// Renders `mode` for `options`, adding the common context: `app`,
    /// `ct_name`, `ct_label`, `mode`, `user` and the queued `messages`,
    /// which are then cleared. Options without a `template_name` use the
    /// registry's.
    pub(crate) fn render(
        &self,
        options: &ContentTypeOptions,
        request: &HttpRequest,
        mode: Mode,
        mut context: Map<String, Value>,
    ) -> ContentResult<HttpResponse> {
        let mut resolver = options.resolver();
        if options.template_name.is_none() {
            if let Some(name) = self
                .registry
                .get(&options.ct)
                .and_then(|entry| entry.template_name().map(String::from))
            {
                resolver = resolver.with_template_name(Some(name));
            }
        }
        let names = resolver.template_names(mode, request);
        let queued = messages::get_messages(request);
        let label = options
            .label
            .clone()
            .or_else(|| self.registry.get(&options.ct)?.label().map(String::from))
            .unwrap_or_else(|| options.ct.clone());

        context.insert("app".into(), Value::from(options.app.as_str()));
        context.insert("ct_name".into(), Value::from(options.ct.as_str()));
        context.insert("ct_label".into(), Value::from(label));
        context.insert("mode".into(), Value::from(mode.as_str()));
        context.insert("user".into(), Value::from(current_user(request).username));
        context.insert(
            "messages".into(),
            serde_json::to_value(&queued)
                .map_err(|e| ContentError::TemplateError(format!("Serializing messages: {e}")))?,
        );

        let html = self.templates.render(&names, &context)?;
        let mut response = HttpResponse::ok(html);
        if !queued.is_empty() {
            messages::clear(&mut response);
        }
        Ok(response)
    }
}

fn pk_kwargs(object: &ContentObject) -> HashMap<String, String> {
    HashMap::from([("pk".to_string(), object.id.to_string())])
}

/// What a view knows about the content type it serves.
#[derive(Debug, Clone)]
pub struct ContentTypeOptions {
    /// App id, the prefix of URL names and template paths.
    pub app: String,
    /// Content type name, the registry key.
    pub ct: String,
    /// Display name; the registry's `label` is used when unset.
    pub label: Option<String>,
    pub form: ContentForm,
    pub template_name: Option<String>,
    /// URL arguments copied into the add form's initial data.
    pub fk_fields: Vec<String>,
}

impl ContentTypeOptions {
    pub fn new(app: impl Into<String>, ct: impl Into<String>, form: ContentForm) -> Self {
        Self {
            app: app.into(),
            ct: ct.into(),
            label: None,
            form,
            template_name: None,
            fk_fields: Vec::new(),
        }
    }

    /// Builds options for a registered type; the entry must name its `app`.
    pub fn from_entry(name: &str, entry: &ContentTypeEntry) -> ContentResult<Self> {
        let app = entry.app().ok_or_else(|| {
            ContentError::ImproperlyConfigured(format!("Content type '{name}' has no 'app'"))
        })?;
        Ok(Self::new(app, name, ContentForm::default())
            .with_template_name(entry.template_name().map(String::from))
            .with_label(entry.label()))
    }

    #[must_use]
    pub fn with_label(mut self, label: Option<&str>) -> Self {
        self.label = label.map(String::from);
        self
    }

    #[must_use]
    pub fn with_template_name(mut self, template_name: Option<String>) -> Self {
        self.template_name = template_name;
        self
    }

    #[must_use]
    pub fn with_fk_fields(mut self, fk_fields: &[&str]) -> Self {
        self.fk_fields = fk_fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    /// Returns the conventional URL name, e.g. `djinn_news_edit_news`.
    pub fn url_name(&self, action: &str) -> String {
        format!("{}_{action}_{}", self.app, self.ct)
    }

    pub fn resolver(&self) -> TemplateResolver {
        TemplateResolver::new(self.app.as_str(), self.ct.as_str())
            .with_template_name(self.template_name.clone())
    }
}

/// Returns the user attached to the request, or the anonymous user.
pub fn current_user(request: &HttpRequest) -> User {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .unwrap_or_else(User::anonymous)
}

/// Parses the object id from the first URL argument of `keys` present.
pub(crate) fn object_id(request: &HttpRequest, keys: &[&str]) -> ContentResult<u64> {
    let raw = keys
        .iter()
        .find_map(|key| request.kwarg(key))
        .ok_or_else(|| ContentError::NotFound(format!("No {} in URL", keys.join("/"))))?;
    raw.parse()
        .map_err(|_| ContentError::NotFound(format!("Invalid object id '{raw}'")))
}

/// Turns an error into its response, logging it by severity.
pub(crate) fn error_response(error: &ContentError) -> HttpResponse {
    match error {
        ContentError::PermissionDenied(reason) => tracing::info!(%reason, "permission denied"),
        e if e.is_not_found() => tracing::debug!(error = %e, "not found"),
        e => tracing::error!(error = %e, "view failed"),
    }
    HttpResponse::from_error(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing;

    #[async_trait]
    impl View for Nothing {}

    #[tokio::test]
    async fn test_default_handlers_return_405() {
        for method in [Method::GET, Method::POST, Method::DELETE, Method::PUT] {
            let request = HttpRequest::builder().method(method).build();
            let response = Nothing.dispatch(request).await;
            assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(response.headers().get("allow").unwrap(), "GET, HEAD");
        }
    }

    #[test]
    fn test_url_name() {
        let options = ContentTypeOptions::new("djinn_news", "news", ContentForm::default());
        assert_eq!(options.url_name("view"), "djinn_news_view_news");
    }

    #[test]
    fn test_from_entry_requires_app() {
        let entry = ContentTypeEntry::new().with("template_name", "x.html");
        assert!(ContentTypeOptions::from_entry("news", &entry).is_err());

        let entry = entry.with("app", "djinn_news");
        let options = ContentTypeOptions::from_entry("news", &entry).unwrap();
        assert_eq!(options.app, "djinn_news");
        assert_eq!(options.template_name.as_deref(), Some("x.html"));
    }

    #[test]
    fn test_current_user() {
        let request = HttpRequest::builder().build();
        assert!(current_user(&request).is_anonymous());
        let request = HttpRequest::builder().extension(User::new("alice")).build();
        assert_eq!(current_user(&request).username, "alice");
    }

    #[test]
    fn test_object_id() {
        let request = HttpRequest::builder().kwarg("id", "5").build();
        assert_eq!(object_id(&request, &["id", "pk"]).unwrap(), 5);
        let request = HttpRequest::builder().kwarg("pk", "x").build();
        assert!(object_id(&request, &["pk"]).unwrap_err().is_not_found());
        let request = HttpRequest::builder().build();
        assert!(object_id(&request, &["pk"]).is_err());
    }

    #[test]
    fn test_error_response_status() {
        let response = error_response(&ContentError::PermissionDenied("x".into()));
        assert_eq!(response.status(), http::StatusCode::FORBIDDEN);
        let response = error_response(&ContentError::NoReverseMatch("x".into()));
        assert_eq!(response.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
