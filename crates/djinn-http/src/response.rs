//! HTTP response types.
//!
//! [`HttpResponse`] and [`HttpResponseRedirect`] mirror Django's response
//! classes. Views build these; the application layer turns them into axum
//! responses via [`IntoResponse`].

use axum::response::IntoResponse;
use http::{HeaderMap, HeaderValue, StatusCode};

use djinn_core::ContentError;

use crate::cookies::Cookie;

/// An HTTP response, modeled after Django's `HttpResponse`.
///
/// # Examples
///
/// ```
/// use djinn_http::HttpResponse;
///
/// let response = HttpResponse::ok("Hello, World!");
/// assert_eq!(response.status(), http::StatusCode::OK);
/// assert_eq!(response.content_type(), "text/html");
/// ```
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
    charset: String,
    content_type: String,
    cookies: Vec<Cookie>,
}

impl HttpResponse {
    /// Creates a new `HttpResponse` with the given status code and text body.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            charset: "utf-8".to_string(),
            content_type: "text/html".to_string(),
            cookies: Vec::new(),
        }
    }

    /// Creates a 200 OK response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Creates a 404 Not Found response.
    pub fn not_found(body: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, body)
    }

    /// Creates a 403 Forbidden response.
    pub fn forbidden(body: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, body)
    }

    /// Creates a 500 Internal Server Error response.
    pub fn server_error(body: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    /// Creates a 405 Method Not Allowed response with the list of permitted methods.
    pub fn not_allowed(permitted_methods: &[&str]) -> Self {
        let body = format!("Method Not Allowed. Permitted: {}", permitted_methods.join(", "));
        let mut response = Self::new(StatusCode::METHOD_NOT_ALLOWED, body);
        if let Ok(value) = HeaderValue::from_str(&permitted_methods.join(", ")) {
            response.headers.insert(http::header::ALLOW, value);
        }
        response
    }

    /// Builds the plain-text response for an error, using its status code.
    pub fn from_error(error: &ContentError) -> Self {
        let status =
            StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Self::new(status, error.to_string());
        response.set_content_type("text/plain");
        response
    }

    /// Returns this response with a different status code.
    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Returns this response with a different content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the status code.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Returns a reference to the headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a mutable reference to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the charset.
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Returns the content type, without charset.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Sets the content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Returns the body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the body as bytes.
    pub fn content_bytes(&self) -> Vec<u8> {
        self.body.as_bytes().to_vec()
    }

    /// Returns the `Location` header, if this is a redirect.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// Adds a cookie to be sent with the response.
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.retain(|c| c.name != cookie.name);
        self.cookies.push(cookie);
    }

    /// Returns the cookies that will be sent.
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Returns the full content type header value including charset.
    fn full_content_type(&self) -> String {
        if self.content_type.starts_with("text/") || self.content_type.contains("json") {
            format!("{}; charset={}", self.content_type, self.charset)
        } else {
            self.content_type.clone()
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> axum::response::Response {
        let content_type = self.full_content_type();
        let mut response = (self.status, self.body).into_response();
        let headers = response.headers_mut();

        if let Ok(ct) = HeaderValue::from_str(&content_type) {
            headers.insert(http::header::CONTENT_TYPE, ct);
        }
        for (key, value) in &self.headers {
            headers.insert(key, value.clone());
        }
        for cookie in &self.cookies {
            if let Ok(value) = HeaderValue::from_str(&cookie.to_set_cookie_header()) {
                headers.append(http::header::SET_COOKIE, value);
            }
        }
        response
    }
}

/// An HTTP redirect response (302 Found).
///
/// Equivalent to Django's `HttpResponseRedirect`.
pub struct HttpResponseRedirect;

impl HttpResponseRedirect {
    /// Creates a 302 Found redirect to the given URL.
    pub fn new(url: &str) -> HttpResponse {
        let mut response = HttpResponse::new(StatusCode::FOUND, "");
        if let Ok(value) = HeaderValue::from_str(url) {
            response.headers.insert(http::header::LOCATION, value);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_defaults() {
        let response = HttpResponse::ok("hi");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), "hi");
        assert_eq!(response.charset(), "utf-8");
        assert_eq!(response.full_content_type(), "text/html; charset=utf-8");
    }

    #[test]
    fn test_with_status_and_content_type() {
        let response = HttpResponse::ok("form")
            .with_status(StatusCode::ACCEPTED)
            .with_content_type("text/plain");
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.content_type(), "text/plain");
    }

    #[test]
    fn test_not_allowed_sets_allow_header() {
        let response = HttpResponse::not_allowed(&["GET", "POST"]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get("allow").unwrap(), "GET, POST");
    }

    #[test]
    fn test_from_error() {
        let response = HttpResponse::from_error(&ContentError::PermissionDenied("nope".into()));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.content_type(), "text/plain");
        assert!(response.body().contains("nope"));

        let response = HttpResponse::from_error(&ContentError::DoesNotExist("news 9".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_redirect() {
        let response = HttpResponseRedirect::new("/profile/bob/");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.location(), Some("/profile/bob/"));
    }

    #[test]
    fn test_set_cookie_replaces_same_name() {
        let mut response = HttpResponse::ok("");
        response.set_cookie(Cookie::new("messages", "a"));
        response.set_cookie(Cookie::new("messages", "b"));
        assert_eq!(response.cookies().len(), 1);
        assert_eq!(response.cookies()[0].value, "b");
    }

    #[test]
    fn test_into_response_headers() {
        let mut response = HttpResponseRedirect::new("/news/news/1/");
        response.set_cookie(Cookie::new("messages", "x"));
        let axum_response = response.into_response();

        assert_eq!(axum_response.status(), StatusCode::FOUND);
        assert_eq!(
            axum_response.headers().get("location").unwrap(),
            "/news/news/1/"
        );
        assert_eq!(
            axum_response.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            axum_response.headers().get("set-cookie").unwrap(),
            "messages=x; Path=/"
        );
    }
}
