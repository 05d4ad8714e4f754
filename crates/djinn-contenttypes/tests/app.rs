//! End-to-end tests through the axum router.

use std::sync::Arc;

use axum::body::Body;
use axum::Router;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use djinn_auth::{User, UserDirectory, REMOTE_USER_HEADER};
use djinn_contenttypes::forms::{ContentForm, FieldDef};
use djinn_contenttypes::registry::{CTRegistry, ContentTypeEntry};
use djinn_contenttypes::views::ContentTypeOptions;
use djinn_contenttypes::ContentTypesApp;
use djinn_core::checks::CheckLevel;
use djinn_core::Settings;

fn news_options() -> ContentTypeOptions {
    let form = ContentForm::new(vec![
        FieldDef::char("title", 100),
        FieldDef::text("body").optional(),
        FieldDef::slug("slug").optional(),
    ]);
    ContentTypeOptions::new("djinn_news", "news", form)
}

async fn news_app(settings: Settings) -> ContentTypesApp {
    let registry = CTRegistry::new();
    registry.register(
        "news",
        ContentTypeEntry::new()
            .with("app", "djinn_news")
            .with("label", "News")
            .with("add_permission", "djinn_news.add_news"),
    );
    let directory = UserDirectory::new();
    directory
        .add_user(User::new("alice").with_perm("djinn_news.add_news"))
        .await;
    directory.add_user(User::new("bob")).await;
    let mut retired = User::new("old");
    retired.is_active = false;
    retired.is_superuser = true;
    directory.add_user(retired).await;

    ContentTypesApp::new(settings)
        .unwrap()
        .registry(Arc::new(registry))
        .auth(Arc::new(directory))
        .mount(news_options())
        .unwrap()
}

async fn router() -> Router {
    news_app(Settings::default()).await.into_router().unwrap()
}

fn request(method: Method, uri: &str, user: Option<&str>) -> http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match user {
        Some(user) => builder.header(REMOTE_USER_HEADER, user),
        None => builder,
    }
}

fn form(builder: http::request::Builder, body: &str) -> Request<Body> {
    builder
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty(builder: http::request::Builder) -> Request<Body> {
    builder.body(Body::empty()).unwrap()
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8_lossy(&body).into_owned())
}

fn set_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(http::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .map(String::from)
}

#[tokio::test]
async fn test_add_then_view() {
    let router = router().await;

    let (status, headers, _) = send(
        &router,
        form(
            request(Method::POST, "/djinn_news/news/add/", Some("alice")),
            "title=First+post&slug=first-post",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers["location"], "/djinn_news/news/1/first-post/");

    let (status, headers, body) = send(
        &router,
        empty(request(Method::GET, "/djinn_news/news/1/first-post/", Some("alice"))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["content-type"], "text/html; charset=utf-8");
    assert!(body.contains("First post"));

    let (status, _, body) = send(&router, empty(request(Method::GET, "/ct/news/1/", Some("alice")))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("First post"));
}

#[tokio::test]
async fn test_anonymous_and_unknown_users_are_refused() {
    let router = router().await;
    for user in [None, Some("nobody"), Some("old"), Some("bob")] {
        let (status, _, _) = send(
            &router,
            empty(request(Method::GET, "/djinn_news/news/add/", user)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "user {user:?}");
    }
}

#[tokio::test]
async fn test_not_found() {
    let router = router().await;
    for uri in [
        "/nowhere/",
        "/djinn_news/news/abc/",
        "/djinn_news/news/5/",
        "/ct/event/1/",
    ] {
        let (status, _, _) = send(&router, empty(request(Method::GET, uri, Some("alice")))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_edit_flashes_saved_changes_once() {
    let router = router().await;
    send(
        &router,
        form(
            request(Method::POST, "/djinn_news/news/add/", Some("alice")),
            "title=Draft",
        ),
    )
    .await;

    let (status, headers, _) = send(
        &router,
        form(
            request(Method::POST, "/djinn_news/news/1/edit/", Some("alice")),
            "title=Final",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FOUND);
    assert_eq!(headers["location"], "/djinn_news/news/1/");
    let flash = set_cookie(&headers, "messages").unwrap();
    let pair = flash.split(';').next().unwrap();

    let (status, headers, body) = send(
        &router,
        empty(request(Method::GET, "/djinn_news/news/1/", Some("alice")).header("cookie", pair)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Saved changes"));
    assert!(body.contains("Final"));
    assert!(set_cookie(&headers, "messages")
        .unwrap()
        .contains("Max-Age=0"));
}

#[tokio::test]
async fn test_edit_by_other_user_is_forbidden() {
    let router = router().await;
    send(
        &router,
        form(
            request(Method::POST, "/djinn_news/news/add/", Some("alice")),
            "title=Mine",
        ),
    )
    .await;

    let (status, _, _) = send(
        &router,
        form(
            request(Method::POST, "/djinn_news/news/1/edit/", Some("bob")),
            "title=Yours",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_over_ajax() {
    let router = router().await;
    send(
        &router,
        form(
            request(Method::POST, "/djinn_news/news/add/", Some("alice")),
            "title=Short-lived",
        ),
    )
    .await;

    let (status, headers, body) = send(
        &router,
        empty(
            request(Method::DELETE, "/djinn_news/news/1/delete/", Some("alice"))
                .header("x-requested-with", "XMLHttpRequest"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Bye bye");
    assert_eq!(headers["content-type"], "text/plain; charset=utf-8");

    let (status, _, _) = send(&router, empty(request(Method::GET, "/djinn_news/news/1/", Some("alice")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_method_not_allowed() {
    let router = router().await;
    let (status, headers, _) = send(&router, empty(request(Method::PUT, "/djinn_news/news/add/", Some("alice")))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(headers["allow"], "GET, POST, HEAD");
}

#[tokio::test]
async fn test_template_dirs_override_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let app_dir = dir.path().join("djinn_news");
    std::fs::create_dir_all(&app_dir).unwrap();
    std::fs::write(
        app_dir.join("news_add.html"),
        "custom add form for {{ ct_label }}",
    )
    .unwrap();

    let settings = Settings {
        template_dirs: vec![dir.path().to_path_buf()],
        ..Settings::default()
    };
    let router = news_app(settings).await.into_router().unwrap();
    let (status, _, body) = send(&router, empty(request(Method::GET, "/djinn_news/news/add/", Some("alice")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "custom add form for News");
}

#[tokio::test]
async fn test_mount_twice_fails() {
    let app = news_app(Settings::default()).await;
    assert!(app.mount(news_options()).is_err());
}

#[tokio::test]
async fn test_check_reports_registry_problems() {
    let registry = CTRegistry::new();
    registry.register("event", ContentTypeEntry::new());
    let app = ContentTypesApp::new(Settings::default())
        .unwrap()
        .registry(Arc::new(registry));

    let messages = app.check();
    let w001 = messages
        .iter()
        .find(|m| m.id.as_deref() == Some("contenttypes.W001"))
        .unwrap();
    assert_eq!(w001.level, CheckLevel::Warning);
    assert!(messages
        .iter()
        .any(|m| m.id.as_deref() == Some("contenttypes.I001")));
}
