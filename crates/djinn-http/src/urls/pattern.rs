//! URL path patterns.
//!
//! A [`RoutePattern`] is parsed from Django's `path()` syntax, e.g.
//! `"news/<int:pk>/edit/"`. It can match a request path, substitute keyword
//! arguments back into a URL, and render the equivalent axum route.

use std::collections::HashMap;
use std::fmt::Write as _;

use regex::Regex;

use djinn_core::{ContentError, ContentResult};

use super::converters::Converter;

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Param { name: String, converter: Converter },
}

/// A parsed URL pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    route: String,
    segments: Vec<Segment>,
    regex: Regex,
}

impl RoutePattern {
    /// Parses a `path()`-style route. A placeholder without a type
    /// (`<name>`) uses the `str` converter.
    ///
    /// # Examples
    ///
    /// ```
    /// use djinn_http::urls::pattern::RoutePattern;
    ///
    /// let pattern = RoutePattern::parse("news/<int:pk>/").unwrap();
    /// assert_eq!(pattern.params(), vec!["pk"]);
    /// assert_eq!(pattern.to_axum_path(), "/news/{pk}/");
    /// ```
    pub fn parse(route: &str) -> ContentResult<Self> {
        let route = route.trim_start_matches('/');
        let mut segments = Vec::new();
        let mut regex_src = String::from("^/?");
        let mut remaining = route;

        while let Some(start) = remaining.find('<') {
            let prefix = &remaining[..start];
            if !prefix.is_empty() {
                regex_src.push_str(&regex::escape(prefix));
                segments.push(Segment::Literal(prefix.to_string()));
            }

            let end = remaining[start..].find('>').ok_or_else(|| {
                ContentError::ImproperlyConfigured(format!(
                    "Unclosed angle bracket in route: {route}"
                ))
            })? + start;

            let inner = &remaining[start + 1..end];
            let (type_name, name) = inner.split_once(':').unwrap_or(("str", inner));
            if name.is_empty() {
                return Err(ContentError::ImproperlyConfigured(format!(
                    "Empty parameter name in route: {route}"
                )));
            }
            let converter: Converter = type_name.parse()?;

            write!(regex_src, "(?P<{name}>{})", converter.regex()).ok();
            segments.push(Segment::Param {
                name: name.to_string(),
                converter,
            });

            remaining = &remaining[end + 1..];
        }

        if !remaining.is_empty() {
            regex_src.push_str(&regex::escape(remaining));
            segments.push(Segment::Literal(remaining.to_string()));
        }
        regex_src.push('$');

        let regex = Regex::new(&regex_src).map_err(|e| {
            ContentError::ImproperlyConfigured(format!("Invalid route '{route}': {e}"))
        })?;

        Ok(Self {
            route: route.to_string(),
            segments,
            regex,
        })
    }

    /// Returns the route as written, without a leading `/`.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Returns the parameter names, in order.
    pub fn params(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param { name, .. } => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Matches a full request path, returning the captured arguments.
    pub fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let captures = self.regex.captures(path)?;
        let kwargs = self
            .params()
            .into_iter()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();
        Some(kwargs)
    }

    /// Substitutes `kwargs` into the pattern, producing an absolute URL.
    ///
    /// Fails if an argument is missing or rejected by its converter.
    pub fn reverse(&self, kwargs: &HashMap<String, String>) -> ContentResult<String> {
        let mut url = String::from("/");
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Param { name, converter } => {
                    let value = kwargs.get(name).ok_or_else(|| {
                        ContentError::NoReverseMatch(format!(
                            "{} (missing argument '{name}')",
                            self.route
                        ))
                    })?;
                    if !converter.accepts(value) {
                        return Err(ContentError::NoReverseMatch(format!(
                            "{} ('{value}' is not a valid {converter} for '{name}')",
                            self.route
                        )));
                    }
                    url.push_str(value);
                }
            }
        }
        Ok(url)
    }

    /// Renders the pattern in axum's route syntax (`/news/{pk}/`).
    pub fn to_axum_path(&self) -> String {
        let mut path = String::from("/");
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Param { name, .. } => {
                    write!(path, "{{{name}}}").ok();
                }
            }
        }
        path
    }
}
