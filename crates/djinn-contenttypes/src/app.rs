//! The application: content-type views mounted on an axum router.
//!
//! [`ContentTypesApp`] collects the registry, object store, auth backend and
//! templates, mounts the four views of each content type under conventional
//! URL names and serves them.
//!
//! # Examples
//!
//! ```no_run
//! use djinn_contenttypes::app::ContentTypesApp;
//! use djinn_contenttypes::forms::{ContentForm, FieldDef};
//! use djinn_contenttypes::views::ContentTypeOptions;
//! use djinn_core::Settings;
//!
//! # async fn example() -> djinn_core::ContentResult<()> {
//! let form = ContentForm::new(vec![FieldDef::char("title", 200)]);
//! let app = ContentTypesApp::new(Settings::default())?
//!     .mount(ContentTypeOptions::new("djinn_news", "news", form))?;
//! app.serve("127.0.0.1:8000").await?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::response::IntoResponse;
use axum::routing::any;
use tower_http::trace::TraceLayer;

use djinn_auth::{AuthBackend, User, UserDirectory, REMOTE_USER_HEADER};
use djinn_core::checks::{CheckMessage, CheckRegistry};
use djinn_core::logging::request_span;
use djinn_core::{ContentError, ContentResult, Settings};
use djinn_http::urls::{RoutePattern, UrlConf};
use djinn_http::{HttpRequest, HttpResponse};

use crate::registry::CTRegistry;
use crate::store::{InMemoryStore, ObjectStore};
use crate::templates::TemplateRenderer;
use crate::views::{
    CTDetailView, ContentTypeOptions, CreateView, DeleteView, DetailView, UpdateView, View,
    ViewContext,
};

/// URL name of the detail view for any content type.
pub const CT_VIEW_NAME: &str = "contenttypes_view";

/// Builder for the content-types web application.
pub struct ContentTypesApp {
    settings: Settings,
    registry: Arc<CTRegistry>,
    store: Arc<dyn ObjectStore>,
    auth: Arc<dyn AuthBackend>,
    templates: Option<TemplateRenderer>,
    urls: UrlConf,
    mounted: Vec<ContentTypeOptions>,
}

impl ContentTypesApp {
    /// Creates an app with a registry loaded from `settings`, an empty
    /// in-memory store and an empty user directory.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in routes cannot be parsed.
    pub fn new(settings: Settings) -> ContentResult<Self> {
        let mut urls = UrlConf::new();
        urls.add(CT_VIEW_NAME, "ct/<str:ctype>/<int:id>/")?;
        Ok(Self {
            registry: Arc::new(CTRegistry::from_settings(&settings)),
            settings,
            store: Arc::new(InMemoryStore::new()),
            auth: Arc::new(UserDirectory::new()),
            templates: None,
            urls,
            mounted: Vec::new(),
        })
    }

    #[must_use]
    pub fn registry(mut self, registry: Arc<CTRegistry>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = store;
        self
    }

    #[must_use]
    pub fn auth(mut self, auth: Arc<dyn AuthBackend>) -> Self {
        self.auth = auth;
        self
    }

    /// Uses `templates` instead of loading `settings.template_dirs`.
    #[must_use]
    pub fn templates(mut self, templates: TemplateRenderer) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn urls(&self) -> &UrlConf {
        &self.urls
    }

    /// Registers the add, detail, edit and delete routes of a content type:
    ///
    /// - `<app>/<ct>/add/` and `<app>/<ct>/add/<int:parentusergroup>/`
    /// - `<app>/<ct>/<int:pk>/` and `<app>/<ct>/<int:pk>/<slug:slug>/`
    /// - `<app>/<ct>/<int:pk>/edit/`
    /// - `<app>/<ct>/<int:pk>/delete/`
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::ImproperlyConfigured`] if the type is already
    /// mounted.
    pub fn mount(mut self, options: ContentTypeOptions) -> ContentResult<Self> {
        if self.urls.contains(&options.url_name("view")) {
            return Err(ContentError::ImproperlyConfigured(format!(
                "Content type '{}' of '{}' is already mounted",
                options.ct, options.app
            )));
        }
        let base = format!("{}/{}", options.app, options.ct);
        let routes = [
            ("add", format!("{base}/add/")),
            ("add", format!("{base}/add/<int:parentusergroup>/")),
            ("view", format!("{base}/<int:pk>/")),
            ("view", format!("{base}/<int:pk>/<slug:slug>/")),
            ("edit", format!("{base}/<int:pk>/edit/")),
            ("delete", format!("{base}/<int:pk>/delete/")),
        ];
        for (action, route) in &routes {
            self.urls.add(&options.url_name(action), route)?;
        }
        tracing::debug!(app = %options.app, ct = %options.ct, "mounted content type");
        self.mounted.push(options);
        Ok(self)
    }

    /// Runs the settings checks and the registry checks.
    pub fn check(&self) -> Vec<CheckMessage> {
        let mut messages = CheckRegistry::with_builtins().run_checks(None, &self.settings);
        messages.extend(self.registry.check());
        messages
    }

    /// Builds the axum router.
    ///
    /// # Errors
    ///
    /// Fails if the template directories cannot be loaded.
    pub fn into_router(self) -> ContentResult<axum::Router> {
        let templates = match self.templates {
            Some(templates) => templates,
            None => TemplateRenderer::from_dirs(&self.settings.template_dirs)?,
        };
        let ctx = Arc::new(ViewContext::new(
            self.settings,
            self.registry,
            self.store,
            self.auth,
            self.urls,
            templates,
        ));

        let mut views: HashMap<String, Arc<dyn View>> = HashMap::new();
        views.insert(CT_VIEW_NAME.to_string(), Arc::new(CTDetailView::new(ctx.clone())));
        for options in self.mounted {
            views.insert(options.url_name("add"), Arc::new(CreateView::new(ctx.clone(), options.clone())));
            views.insert(options.url_name("view"), Arc::new(DetailView::new(ctx.clone(), options.clone())));
            views.insert(options.url_name("edit"), Arc::new(UpdateView::new(ctx.clone(), options.clone())));
            views.insert(options.url_name("delete"), Arc::new(DeleteView::new(ctx.clone(), options)));
        }

        let mut router = axum::Router::new();
        for (name, pattern) in ctx.urls.patterns() {
            let Some(view) = views.get(name).cloned() else {
                continue;
            };
            let path = pattern.to_axum_path();
            let pattern = pattern.clone();
            let auth = ctx.auth.clone();
            let handler = move |req: Request<Body>| {
                let view = view.clone();
                let pattern = pattern.clone();
                let auth = auth.clone();
                async move { handle(view.as_ref(), &pattern, auth.as_ref(), req).await }
            };
            router = router.route(&path, any(handler));
        }

        Ok(router
            .fallback(|| async { HttpResponse::not_found("Not found") })
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                request_span(req.method().as_str(), req.uri().path())
            })))
    }

    /// Serves the app on `addr` until the server stops.
    ///
    /// # Errors
    ///
    /// Returns an error if the router cannot be built, the address cannot be
    /// bound or the server fails.
    pub async fn serve(self, addr: &str) -> ContentResult<()> {
        let router = self.into_router()?;
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            ContentError::ImproperlyConfigured(format!("Failed to bind to {addr}: {e}"))
        })?;
        tracing::info!("serving content types at http://{addr}/");
        axum::serve(listener, router).await?;
        Ok(())
    }
}

async fn handle(
    view: &dyn View,
    pattern: &RoutePattern,
    auth: &dyn AuthBackend,
    req: Request<Body>,
) -> axum::response::Response {
    let (parts, body) = req.into_parts();
    let body_bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default()
        .to_vec();
    let mut request = HttpRequest::from_axum(parts, body_bytes);

    // axum matched the shape; the converters still have to accept the values.
    let Some(kwargs) = pattern.match_path(request.path()) else {
        return HttpResponse::not_found("Not found").into_response();
    };
    request.set_kwargs(kwargs);

    let user = resolve_user(auth, &request).await;
    request.extensions_mut().insert(user);
    view.dispatch(request).await.into_response()
}

/// Returns the user named by the remote-user header, or the anonymous user.
async fn resolve_user(auth: &dyn AuthBackend, request: &HttpRequest) -> User {
    let Some(remote_user) = request
        .headers()
        .get(REMOTE_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    else {
        return User::anonymous();
    };
    match auth.authenticate_remote(remote_user).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!(remote_user, "unknown or inactive remote user");
            User::anonymous()
        }
        Err(e) => {
            tracing::warn!(error = %e, "user lookup failed");
            User::anonymous()
        }
    }
}
