//! The edit view.

use std::sync::Arc;

use async_trait::async_trait;
use http::{Method, StatusCode};
use serde_json::{Map, Value};

use djinn_core::{ContentResult, ValidationErrors};
use djinn_http::{HttpRequest, HttpResponse, HttpResponseRedirect};

use super::base::{current_user, error_response, object_id, ContentTypeOptions, View, ViewContext};
use crate::content::ContentObject;
use crate::forms::data_map;
use crate::messages;
use crate::registry::PermissionKind;
use crate::templates::Mode;

/// Edits one object, looked up by the `pk` URL argument.
///
/// A request with `partial` set only validates the fields it carries.
pub struct UpdateView {
    ctx: Arc<ViewContext>,
    options: ContentTypeOptions,
}

impl UpdateView {
    pub const fn new(ctx: Arc<ViewContext>, options: ContentTypeOptions) -> Self {
        Self { ctx, options }
    }

    fn render_form(
        &self,
        request: &HttpRequest,
        object: &ContentObject,
        values: &Map<String, Value>,
        errors: Option<&ValidationErrors>,
    ) -> ContentResult<HttpResponse> {
        let mut context = Map::new();
        self.ctx.insert_object(&mut context, &self.options, Some(object))?;
        context.insert("form".into(), self.options.form.context(values, errors));
        let action = self
            .ctx
            .edit_url(&self.options, object)
            .unwrap_or_else(|_| request.path().to_string());
        context.insert("form_action".into(), Value::from(action));
        self.ctx.render(&self.options, request, Mode::Edit, context)
    }

    async fn handle(&self, request: &HttpRequest) -> ContentResult<HttpResponse> {
        let user = current_user(request);
        let id = object_id(request, &["pk"])?;
        let mut object = self.ctx.store.get(&self.options.ct, id).await?;
        self.ctx
            .require_permission(&self.options.ct, PermissionKind::Edit, &user, &object)?;

        if *request.method() != Method::POST {
            let mut values = self.options.form.values_of(&object);
            values.extend(data_map(request.get()));
            return self.render_form(request, &object, &values, None);
        }

        if request.post().get("action") == Some("cancel") {
            if object.is_tmp {
                self.ctx.store.delete(&object).await?;
                return Ok(HttpResponseRedirect::new(&self.ctx.profile_url(&user)));
            }
            return Ok(HttpResponseRedirect::new(&self.ctx.view_url(&self.options, &object)?));
        }

        let partial = request.param_is_set("partial");
        match self.options.form.validate(request.post(), partial) {
            Ok(cleaned) => {
                self.options.form.apply(&mut object, cleaned);
                object.set_changed_by(&user);
                object.is_tmp = false;
                self.ctx.store.save(&mut object).await?;
                tracing::info!(ct = %self.options.ct, id = object.id, user = %user.username, partial, "saved object");

                let mut response =
                    HttpResponseRedirect::new(&self.ctx.view_url(&self.options, &object)?);
                messages::success(request, &mut response, "Saved changes");
                Ok(response)
            }
            Err(errors) => {
                let values = data_map(request.post());
                let response = self.render_form(request, &object, &values, Some(&errors))?;
                Ok(response.with_status(StatusCode::ACCEPTED))
            }
        }
    }
}

#[async_trait]
impl View for UpdateView {
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
