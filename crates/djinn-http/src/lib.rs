//! # djinn-http
//!
//! The HTTP layer: request and response types modeled after Django's, query
//! dictionaries, cookies, and named URL patterns with reverse resolution.
//!
//! ## Modules
//!
//! - [`request`] - [`HttpRequest`] and its builder
//! - [`response`] - [`HttpResponse`] and [`HttpResponseRedirect`]
//! - [`querydict`] - Multi-value GET/POST parameters
//! - [`cookies`] - `Cookie` header parsing and `Set-Cookie` formatting
//! - [`urls`] - Route patterns and reverse URL generation

pub mod cookies;
pub mod querydict;
pub mod request;
pub mod response;
pub mod urls;

pub use cookies::Cookie;
pub use querydict::QueryDict;
pub use request::HttpRequest;
pub use response::{HttpResponse, HttpResponseRedirect};
