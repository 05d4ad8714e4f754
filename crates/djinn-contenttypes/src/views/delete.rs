//! The delete view.

use std::sync::Arc;

use async_trait::async_trait;
use http::Method;
use serde_json::Map;

use djinn_core::ContentResult;
use djinn_http::{HttpRequest, HttpResponse, HttpResponseRedirect};

use super::base::{current_user, error_response, object_id, ContentTypeOptions, View, ViewContext};
use crate::registry::PermissionKind;
use crate::templates::Mode;

/// Deletes one object, looked up by the `pk` URL argument.
///
/// GET answers with the confirmation snippet; DELETE and POST delete.
pub struct DeleteView {
    ctx: Arc<ViewContext>,
    options: ContentTypeOptions,
}

impl DeleteView {
    pub const fn new(ctx: Arc<ViewContext>, options: ContentTypeOptions) -> Self {
        Self { ctx, options }
    }

    async fn confirm(&self, request: &HttpRequest) -> ContentResult<HttpResponse> {
        let id = object_id(request, &["pk"])?;
        let object = self.ctx.store.get(&self.options.ct, id).await?;
        let mut context = Map::new();
        self.ctx.insert_object(&mut context, &self.options, Some(&object))?;
        let response = self.ctx.render(&self.options, request, Mode::Delete, context)?;
        Ok(response.with_content_type("text/plain"))
    }

    async fn remove(&self, request: &HttpRequest) -> ContentResult<HttpResponse> {
        let user = current_user(request);
        let id = object_id(request, &["pk"])?;
        let mut object = self.ctx.store.get(&self.options.ct, id).await?;
        self.ctx
            .require_permission(&self.options.ct, PermissionKind::Delete, &user, &object)?;

        // The store sees who deleted it.
        object.set_changed_by(&user);
        if let Err(e) = self.ctx.store.delete(&object).await {
            tracing::warn!(error = %e, ct = %self.options.ct, id, "delete failed");
            return Ok(HttpResponseRedirect::new(&self.ctx.view_url(&self.options, &object)?));
        }
        tracing::info!(ct = %self.options.ct, id, user = %user.username, "deleted object");

        if request.is_ajax() {
            Ok(HttpResponse::ok("Bye bye").with_content_type("text/plain"))
        } else {
            Ok(HttpResponseRedirect::new(&self.ctx.profile_url(&user)))
        }
    }
}

#[async_trait]
impl View for DeleteView {
    fn allowed_methods(&self) -> Vec<Method> {
        vec![Method::GET, Method::POST, Method::DELETE, Method::HEAD]
    }

    async fn get(&self, request: HttpRequest) -> HttpResponse {
        self.confirm(&request)
            .await
            .unwrap_or_else(|e| error_response(&e))
    }

    async fn post(&self, request: HttpRequest) -> HttpResponse {
        self.delete(request).await
    }

    async fn delete(&self, request: HttpRequest) -> HttpResponse {
        self.remove(&request)
            .await
            .unwrap_or_else(|e| error_response(&e))
    }
}
