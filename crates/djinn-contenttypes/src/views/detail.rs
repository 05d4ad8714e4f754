//! Detail views.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;

use djinn_core::{ContentError, ContentResult};
use djinn_http::{HttpRequest, HttpResponse};

use super::base::{current_user, error_response, object_id, ContentTypeOptions, View, ViewContext};
use crate::content::ContentObject;
use crate::registry::PermissionKind;
use crate::templates::Mode;

/// Shows one object of a known content type, looked up by the `pk` URL
/// argument.
pub struct DetailView {
    ctx: Arc<ViewContext>,
    options: ContentTypeOptions,
}

impl DetailView {
    pub const fn new(ctx: Arc<ViewContext>, options: ContentTypeOptions) -> Self {
        Self { ctx, options }
    }

    async fn handle(&self, request: &HttpRequest) -> ContentResult<HttpResponse> {
        let id = object_id(request, &["pk"])?;
        let object = self.ctx.store.get(&self.options.ct, id).await?;
        render_detail(&self.ctx, &self.options, request, &object)
    }
}

#[async_trait]
impl View for DetailView {
    async fn get(&self, request: HttpRequest) -> HttpResponse {
        self.handle(&request)
            .await
            .unwrap_or_else(|e| error_response(&e))
    }
}

/// Shows an object of any registered content type, taken from the `ctype`
/// and `id` (or `pk`) URL arguments.
pub struct CTDetailView {
    ctx: Arc<ViewContext>,
}

impl CTDetailView {
    pub const fn new(ctx: Arc<ViewContext>) -> Self {
        Self { ctx }
    }

    async fn handle(&self, request: &HttpRequest) -> ContentResult<HttpResponse> {
        let ctype = request
            .kwarg("ctype")
            .ok_or_else(|| ContentError::NotFound("No content type in URL".into()))?;
        let entry = self
            .ctx
            .registry
            .get(ctype)
            .ok_or_else(|| ContentError::NotFound(format!("Unknown content type '{ctype}'")))?;
        let options = ContentTypeOptions::from_entry(ctype, &entry)?;
        let id = object_id(request, &["id", "pk"])?;
        let object = self.ctx.store.get(ctype, id).await?;
        render_detail(&self.ctx, &options, request, &object)
    }
}

#[async_trait]
impl View for CTDetailView {
    async fn get(&self, request: HttpRequest) -> HttpResponse {
        self.handle(&request)
            .await
            .unwrap_or_else(|e| error_response(&e))
    }
}

fn render_detail(
    ctx: &ViewContext,
    options: &ContentTypeOptions,
    request: &HttpRequest,
    object: &ContentObject,
) -> ContentResult<HttpResponse> {
    let user = current_user(request);
    ctx.require_permission(&options.ct, PermissionKind::View, &user, object)?;

    let mut context = Map::new();
    ctx.insert_object(&mut context, options, Some(object))?;
    let mut response = ctx.render(options, request, Mode::Detail, context)?;
    if request.is_ajax() {
        response.set_content_type("text/plain");
    }
    Ok(response)
}
