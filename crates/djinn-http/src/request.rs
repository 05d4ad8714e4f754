//! HTTP request type.
//!
//! [`HttpRequest`] mirrors Django's `HttpRequest`: method, path, headers,
//! GET and POST parameters, cookies, plus the keyword arguments captured from
//! the URL. Per-request values added by the application (the current user)
//! live in [`HttpRequest::extensions`].

use std::collections::HashMap;
use std::sync::OnceLock;

use http::{Extensions, HeaderMap, Method};

use crate::cookies;
use crate::querydict::QueryDict;

/// An HTTP request, modeled after Django's `HttpRequest`.
///
/// # Examples
///
/// ```
/// use djinn_http::HttpRequest;
///
/// let request = HttpRequest::builder()
///     .method(http::Method::GET)
///     .path("/news/news/add/")
///     .query_string("title=Hello")
///     .build();
///
/// assert_eq!(request.get().get("title"), Some("Hello"));
/// assert!(!request.is_ajax());
/// ```
#[derive(Debug)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query_string: String,
    content_type: Option<String>,
    get: QueryDict,
    post: QueryDict,
    headers: HeaderMap,
    body: Vec<u8>,
    kwargs: HashMap<String, String>,
    extensions: Extensions,
    cached_cookies: OnceLock<HashMap<String, String>>,
}

impl HttpRequest {
    /// Creates a new [`HttpRequestBuilder`].
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Creates an `HttpRequest` from axum request parts and the body bytes.
    ///
    /// URL-encoded bodies are parsed into [`HttpRequest::post`].
    pub fn from_axum(parts: http::request::Parts, body: Vec<u8>) -> Self {
        let uri = parts.uri;
        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        Self::assemble(
            parts.method,
            uri.path().to_string(),
            uri.query().unwrap_or("").to_string(),
            content_type,
            parts.headers,
            body,
            parts.extensions,
        )
    }

    fn assemble(
        method: Method,
        path: String,
        query_string: String,
        content_type: Option<String>,
        headers: HeaderMap,
        body: Vec<u8>,
        extensions: Extensions,
    ) -> Self {
        let get = QueryDict::parse(&query_string);
        let post = if content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
        {
            QueryDict::parse(&String::from_utf8_lossy(&body))
        } else {
            QueryDict::new()
        };

        Self {
            method,
            path,
            query_string,
            content_type,
            get,
            post,
            headers,
            body,
            kwargs: HashMap::new(),
            extensions,
            cached_cookies: OnceLock::new(),
        }
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string (without the leading `?`).
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Returns the content type of the request body, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the GET query parameters.
    pub const fn get(&self) -> &QueryDict {
        &self.get
    }

    /// Returns the POST form parameters.
    pub const fn post(&self) -> &QueryDict {
        &self.post
    }

    /// Looks `key` up in POST, then GET (Django's old `request.REQUEST`).
    pub fn param(&self, key: &str) -> Option<&str> {
        self.post.get(key).or_else(|| self.get.get(key))
    }

    /// Returns `true` if `key` is set to a non-empty value in POST or GET.
    pub fn param_is_set(&self, key: &str) -> bool {
        self.param(key).is_some_and(|v| !v.is_empty())
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw request body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the keyword arguments captured from the URL.
    pub const fn kwargs(&self) -> &HashMap<String, String> {
        &self.kwargs
    }

    /// Returns one captured URL argument.
    pub fn kwarg(&self, name: &str) -> Option<&str> {
        self.kwargs.get(name).map(String::as_str)
    }

    /// Replaces the captured URL arguments.
    pub fn set_kwargs(&mut self, kwargs: HashMap<String, String>) {
        self.kwargs = kwargs;
    }

    /// Returns the request extensions.
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns the request extensions mutably.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Returns `true` if the request was made via `XMLHttpRequest`.
    pub fn is_ajax(&self) -> bool {
        self.headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"))
    }

    /// Returns the full path including the query string.
    pub fn get_full_path(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }

    /// Parses cookies from the `Cookie` header; cached after the first call.
    pub fn cookies(&self) -> &HashMap<String, String> {
        self.cached_cookies.get_or_init(|| {
            self.headers
                .get(http::header::COOKIE)
                .and_then(|v| v.to_str().ok())
                .map_or_else(HashMap::new, cookies::parse_cookie_header)
        })
    }

    /// Gets a specific cookie value by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies().get(name).map(String::as_str)
    }
}

/// Builder for constructing [`HttpRequest`] instances without a server.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    content_type: Option<String>,
    headers: HeaderMap,
    body: Vec<u8>,
    kwargs: HashMap<String, String>,
    extensions: Extensions,
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query_string: String::new(),
            content_type: None,
            headers: HeaderMap::new(),
            body: Vec::new(),
            kwargs: HashMap::new(),
            extensions: Extensions::new(),
        }
    }
}

impl HttpRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request path.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Sets the query string (without leading `?`).
    #[must_use]
    pub fn query_string(mut self, qs: &str) -> Self {
        self.query_string = qs.to_string();
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, ct: &str) -> Self {
        self.content_type = Some(ct.to_string());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Marks the request as an `XMLHttpRequest`.
    #[must_use]
    pub fn ajax(self) -> Self {
        self.header("x-requested-with", "XMLHttpRequest")
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Sets a URL-encoded form body and the matching content type.
    #[must_use]
    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = QueryDict::from_pairs(pairs).urlencode().into_bytes();
        self.content_type = Some("application/x-www-form-urlencoded".to_string());
        self
    }

    /// Adds a captured URL argument.
    #[must_use]
    pub fn kwarg(mut self, name: &str, value: &str) -> Self {
        self.kwargs.insert(name.to_string(), value.to_string());
        self
    }

    /// Inserts a request extension.
    #[must_use]
    pub fn extension<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Builds the [`HttpRequest`].
    pub fn build(self) -> HttpRequest {
        let mut request = HttpRequest::assemble(
            self.method,
            self.path,
            self.query_string,
            self.content_type,
            self.headers,
            self.body,
            self.extensions,
        );
        request.kwargs = self.kwargs;
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let req = HttpRequest::builder().build();
        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.path(), "/");
        assert_eq!(req.query_string(), "");
        assert!(req.content_type().is_none());
        assert!(req.body().is_empty());
        assert!(req.kwargs().is_empty());
    }

    #[test]
    fn test_get_full_path() {
        let req = HttpRequest::builder()
            .path("/news/news/add/")
            .query_string("modal=1")
            .build();
        assert_eq!(req.get_full_path(), "/news/news/add/?modal=1");
        let req = HttpRequest::builder().path("/news/").build();
        assert_eq!(req.get_full_path(), "/news/");
    }

    #[test]
    fn test_is_ajax() {
        assert!(!HttpRequest::builder().build().is_ajax());
        assert!(HttpRequest::builder().ajax().build().is_ajax());
        let req = HttpRequest::builder()
            .header("x-requested-with", "xmlhttprequest")
            .build();
        assert!(req.is_ajax());
    }

    #[test]
    fn test_form_body_parsed_into_post() {
        let req = HttpRequest::builder()
            .method(Method::POST)
            .form(&[("title", "Hello World"), ("action", "cancel")])
            .build();
        assert_eq!(req.post().get("title"), Some("Hello World"));
        assert_eq!(req.post().get("action"), Some("cancel"));
    }

    #[test]
    fn test_non_form_body_not_parsed() {
        let req = HttpRequest::builder()
            .method(Method::POST)
            .content_type("application/json")
            .body(b"{\"title\": \"x\"}".to_vec())
            .build();
        assert!(req.post().is_empty());
    }

    #[test]
    fn test_param_prefers_post() {
        let req = HttpRequest::builder()
            .method(Method::POST)
            .query_string("is_tmp=1&partial=1")
            .form(&[("is_tmp", "2")])
            .build();
        assert_eq!(req.param("is_tmp"), Some("2"));
        assert_eq!(req.param("partial"), Some("1"));
        assert!(req.param_is_set("partial"));
        assert!(!req.param_is_set("missing"));
    }

    #[test]
    fn test_kwargs() {
        let mut req = HttpRequest::builder().kwarg("pk", "7").build();
        assert_eq!(req.kwarg("pk"), Some("7"));
        req.set_kwargs(HashMap::from([("id".to_string(), "3".to_string())]));
        assert_eq!(req.kwarg("pk"), None);
        assert_eq!(req.kwarg("id"), Some("3"));
    }

    #[test]
    fn test_extensions() {
        #[derive(Clone, Debug, PartialEq)]
        struct Marker(u8);

        let mut req = HttpRequest::builder().extension(Marker(1)).build();
        assert_eq!(req.extensions().get::<Marker>(), Some(&Marker(1)));
        req.extensions_mut().insert(Marker(2));
        assert_eq!(req.extensions().get::<Marker>(), Some(&Marker(2)));
    }

    #[test]
    fn test_cookies() {
        let req = HttpRequest::builder()
            .header("cookie", "session=abc123; theme=dark")
            .build();
        assert_eq!(req.cookie("session"), Some("abc123"));
        assert_eq!(req.cookie("theme"), Some("dark"));
        assert_eq!(req.cookie("missing"), None);
    }

    #[test]
    fn test_from_axum() {
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("http://example.com/news/news/add/?modal=1")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(())
            .unwrap();

        let (parts, ()) = request.into_parts();
        let req = HttpRequest::from_axum(parts, b"title=Hi".to_vec());

        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.path(), "/news/news/add/");
        assert_eq!(req.get().get("modal"), Some("1"));
        assert_eq!(req.post().get("title"), Some("Hi"));
    }
}
