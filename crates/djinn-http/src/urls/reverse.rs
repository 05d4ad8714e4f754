//! Named URL patterns and reverse URL generation.
//!
//! A name may be registered with several patterns (a detail URL with and
//! without a slug, for instance). [`UrlConf::reverse`] picks the pattern
//! whose parameters are exactly the supplied arguments, falling back to the
//! first pattern whose parameters are all supplied.

use std::collections::HashMap;

use djinn_core::{ContentError, ContentResult};

use super::pattern::RoutePattern;

/// A set of named URL patterns.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use djinn_http::urls::UrlConf;
///
/// let mut urls = UrlConf::new();
/// urls.add("news_view_news", "news/news/<int:pk>/").unwrap();
///
/// let kwargs = HashMap::from([("pk".to_string(), "7".to_string())]);
/// assert_eq!(urls.reverse("news_view_news", &kwargs).unwrap(), "/news/news/7/");
/// ```
#[derive(Debug, Clone, Default)]
pub struct UrlConf {
    patterns: Vec<(String, RoutePattern)>,
}

impl UrlConf {
    /// Creates an empty `UrlConf`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `route` and registers it under `name`, returning the pattern.
    pub fn add(&mut self, name: &str, route: &str) -> ContentResult<RoutePattern> {
        let pattern = RoutePattern::parse(route)?;
        tracing::trace!(name, route = pattern.route(), "registered url pattern");
        self.patterns.push((name.to_string(), pattern.clone()));
        Ok(pattern)
    }

    /// Returns `true` if at least one pattern is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.patterns.iter().any(|(n, _)| n == name)
    }

    /// Returns all registered `(name, pattern)` pairs in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = (&str, &RoutePattern)> {
        self.patterns.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// Returns the number of registered patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Generates the URL for `name` with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NoReverseMatch`] if no pattern is registered
    /// under `name` or none accepts the arguments.
    pub fn reverse(&self, name: &str, kwargs: &HashMap<String, String>) -> ContentResult<String> {
        let candidates: Vec<&RoutePattern> = self
            .patterns
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, p)| p)
            .collect();

        if candidates.is_empty() {
            return Err(ContentError::NoReverseMatch(name.to_string()));
        }

        let exact = candidates.iter().find(|p| {
            let params = p.params();
            params.len() == kwargs.len() && params.iter().all(|param| kwargs.contains_key(*param))
        });
        if let Some(pattern) = exact {
            return pattern.reverse(kwargs);
        }

        let mut last_error = None;
        for pattern in candidates
            .iter()
            .filter(|p| p.params().iter().all(|param| kwargs.contains_key(*param)))
        {
            match pattern.reverse(kwargs) {
                Ok(url) => return Ok(url),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            let mut supplied: Vec<&str> = kwargs.keys().map(String::as_str).collect();
            supplied.sort_unstable();
            ContentError::NoReverseMatch(format!(
                "{name} with arguments [{}]",
                supplied.join(", ")
            ))
        }))
    }

    /// Resolves a request path to the first matching `(name, kwargs)`.
    pub fn resolve(&self, path: &str) -> Option<(&str, HashMap<String, String>)> {
        self.patterns
            .iter()
            .find_map(|(name, pattern)| pattern.match_path(path).map(|kw| (name.as_str(), kw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kwargs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn news_urls() -> UrlConf {
        let mut urls = UrlConf::new();
        urls.add("news_add_news", "news/news/add/").unwrap();
        urls.add("news_view_news", "news/news/<int:pk>/").unwrap();
        urls.add("news_view_news", "news/news/<int:pk>/<slug:slug>/")
            .unwrap();
        urls
    }

    #[test]
    fn test_reverse_unknown_name() {
        let err = news_urls().reverse("nope", &HashMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "Reverse for 'nope' not found");
    }

    #[test]
    fn test_reverse_picks_exact_pattern() {
        let urls = news_urls();
        assert_eq!(
            urls.reverse("news_view_news", &kwargs(&[("pk", "4")])).unwrap(),
            "/news/news/4/"
        );
        assert_eq!(
            urls.reverse("news_view_news", &kwargs(&[("pk", "4"), ("slug", "hi")]))
                .unwrap(),
            "/news/news/4/hi/"
        );
    }

    #[test]
    fn test_reverse_ignores_extra_arguments() {
        let urls = news_urls();
        let url = urls
            .reverse("news_add_news", &kwargs(&[("parentusergroup", "2")]))
            .unwrap();
        assert_eq!(url, "/news/news/add/");
    }

    #[test]
    fn test_reverse_missing_arguments() {
        let urls = news_urls();
        assert!(urls
            .reverse("news_view_news", &kwargs(&[("slug", "hi")]))
            .is_err());
    }

    #[test]
    fn test_resolve() {
        let urls = news_urls();
        let (name, kw) = urls.resolve("/news/news/9/some-slug/").unwrap();
        assert_eq!(name, "news_view_news");
        assert_eq!(kw["slug"], "some-slug");
        assert!(urls.resolve("/elsewhere/").is_none());
    }

    #[test]
    fn test_len_and_contains() {
        let urls = news_urls();
        assert_eq!(urls.len(), 3);
        assert!(urls.contains("news_add_news"));
        assert!(!UrlConf::new().contains("news_add_news"));
        assert!(UrlConf::new().is_empty());
    }
}
