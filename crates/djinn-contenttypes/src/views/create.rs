//! The add view.

use std::sync::Arc;

use async_trait::async_trait;
use http::{Method, StatusCode};
use serde_json::{Map, Value};

use djinn_auth::{Group, User};
use djinn_core::{ContentError, ContentResult, ValidationErrors};
use djinn_http::{HttpRequest, HttpResponse, HttpResponseRedirect, QueryDict};

use super::base::{current_user, error_response, ContentTypeOptions, View, ViewContext};
use crate::content::ContentObject;
use crate::forms::data_map;
use crate::registry::PermissionKind;
use crate::templates::Mode;

/// Creates objects of one content type.
///
/// Types registered with `create_tmp_object` get a temporary object as soon
/// as the form is opened. The form then posts its id back as `is_tmp`, and
/// saving the form turns it into a real object.
pub struct CreateView {
    ctx: Arc<ViewContext>,
    options: ContentTypeOptions,
}

impl CreateView {
    pub const fn new(ctx: Arc<ViewContext>, options: ContentTypeOptions) -> Self {
        Self { ctx, options }
    }

    /// GET parameters plus the configured URL arguments.
    fn initial(&self, request: &HttpRequest) -> ContentResult<QueryDict> {
        let mut initial = QueryDict::new();
        for (key, value) in request.get().iter() {
            initial.append(key, value);
        }
        for field in &self.options.fk_fields {
            let value = request.kwarg(field).ok_or_else(|| {
                ContentError::ImproperlyConfigured(format!(
                    "{} expects URL argument '{field}'",
                    self.options.url_name("add")
                ))
            })?;
            initial.append(field, value);
        }
        Ok(initial)
    }

    /// Checks the add permission, in the context of the `parentusergroup`
    /// group when the URL names one.
    async fn check_permission(&self, request: &HttpRequest, user: &User) -> ContentResult<()> {
        let group = match request.kwarg("parentusergroup") {
            Some(raw) => Some(self.parent_group(raw).await?),
            None => None,
        };
        let perm = self.ctx.permission(&self.options.ct, PermissionKind::Add);
        if self.ctx.permissions.has_perm(user, &perm, group.as_ref()) {
            Ok(())
        } else {
            Err(ContentError::PermissionDenied(format!(
                "'{}' lacks '{perm}'",
                user.username
            )))
        }
    }

    async fn parent_group(&self, raw: &str) -> ContentResult<Group> {
        let id: u64 = raw
            .parse()
            .map_err(|_| ContentError::NotFound(format!("Invalid group id '{raw}'")))?;
        self.ctx
            .auth
            .get_group(id)
            .await?
            .ok_or_else(|| ContentError::NotFound(format!("Group {id}")))
    }

    /// Returns the temporary object the form works on, if the type uses one.
    async fn object(
        &self,
        request: &HttpRequest,
        user: &User,
        initial: &QueryDict,
    ) -> ContentResult<Option<ContentObject>> {
        let uses_tmp = self
            .ctx
            .registry
            .get(&self.options.ct)
            .is_some_and(|entry| entry.create_tmp_object());
        if !uses_tmp {
            return Ok(None);
        }

        if let Some(raw) = request.param("is_tmp").filter(|v| !v.is_empty()) {
            let id = raw
                .parse()
                .map_err(|_| ContentError::NotFound(format!("Invalid temporary object id '{raw}'")))?;
            let object = self.ctx.store.get(&self.options.ct, id).await?;
            // Only the creator's own draft can be picked up again.
            if !object.is_tmp || object.creator.as_deref() != Some(user.username.as_str()) {
                return Err(ContentError::PermissionDenied(format!(
                    "'{}' cannot use object {id} as a temporary object",
                    user.username
                )));
            }
            return Ok(Some(object));
        }

        let mut object = ContentObject::new(self.options.ct.as_str());
        object.is_tmp = true;
        object.set_creator(user);
        self.options
            .form
            .apply(&mut object, self.options.form.clean_initial(initial));
        let object = self.ctx.store.create(object).await?;
        tracing::debug!(ct = %self.options.ct, id = object.id, "created temporary object");
        Ok(Some(object))
    }

    fn render_form(
        &self,
        request: &HttpRequest,
        object: Option<&ContentObject>,
        values: &Map<String, Value>,
        errors: Option<&ValidationErrors>,
    ) -> ContentResult<HttpResponse> {
        let mut context = Map::new();
        self.ctx.insert_object(&mut context, &self.options, object)?;
        context.insert("form".into(), self.options.form.context(values, errors));
        let action = self
            .ctx
            .add_url(&self.options, request.kwargs())
            .unwrap_or_else(|_| request.path().to_string());
        context.insert("form_action".into(), Value::from(action));
        self.ctx.render(&self.options, request, Mode::Add, context)
    }

    async fn handle(&self, request: &HttpRequest) -> ContentResult<HttpResponse> {
        let user = current_user(request);
        self.check_permission(request, &user).await?;
        let initial = self.initial(request)?;
        let object = self.object(request, &user, &initial).await?;

        if *request.method() != Method::POST {
            let mut values = object
                .as_ref()
                .map(|o| self.options.form.values_of(o))
                .unwrap_or_default();
            values.extend(data_map(&initial));
            return self.render_form(request, object.as_ref(), &values, None);
        }

        if request.post().get("action") == Some("cancel") {
            if let Some(object) = object.filter(|o| o.is_tmp) {
                if let Err(e) = self.ctx.store.delete(&object).await {
                    tracing::warn!(error = %e, id = object.id, "could not remove temporary object");
                }
            }
            return Ok(HttpResponseRedirect::new(&self.ctx.profile_url(&user)));
        }

        match self.options.form.validate(request.post(), false) {
            Ok(cleaned) => {
                let mut object =
                    object.unwrap_or_else(|| ContentObject::new(self.options.ct.as_str()));
                self.options.form.apply(&mut object, cleaned);
                object.set_creator(&user);
                object.is_tmp = false;
                object.set_owner(&user);
                self.ctx.store.save(&mut object).await?;
                tracing::info!(ct = %self.options.ct, id = object.id, user = %user.username, "created object");
                Ok(HttpResponseRedirect::new(&self.ctx.view_url(&self.options, &object)?))
            }
            Err(errors) => {
                let values = data_map(request.post());
                let response = self.render_form(request, object.as_ref(), &values, Some(&errors))?;
                Ok(response.with_status(StatusCode::ACCEPTED))
            }
        }
    }
}

#[async_trait]
impl View for CreateView {
    fn allowed_methods(&self) -> Vec<Method> {
        vec![Method::GET, Method::POST, Method::HEAD]
    }

    async fn get(&self, request: HttpRequest) -> HttpResponse {
        self.handle(&request)
            .await
            .unwrap_or_else(|e| error_response(&e))
    }

    async fn post(&self, request: HttpRequest) -> HttpResponse {
        self.handle(&request)
            .await
            .unwrap_or_else(|e| error_response(&e))
    }
}
