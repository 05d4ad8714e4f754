//! Query string dictionary for GET and POST parameters.
//!
//! [`QueryDict`] is a multi-value map, mirroring Django's `QueryDict`: a key
//! may appear several times, [`QueryDict::get`] returns the last value and
//! [`QueryDict::get_list`] returns all of them.

use std::collections::BTreeMap;

/// A read-only multi-value dictionary of form or query parameters.
///
/// # Examples
///
/// ```
/// use djinn_http::QueryDict;
///
/// let qd = QueryDict::parse("color=red&color=blue&size=large");
/// assert_eq!(qd.get("color"), Some("blue"));
/// assert_eq!(qd.get_list("color"), Some(&["red".to_string(), "blue".to_string()][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDict {
    data: BTreeMap<String, Vec<String>>,
}

impl QueryDict {
    /// Creates a new, empty `QueryDict`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a URL-encoded string (`"key1=val1&key2=val2"`).
    ///
    /// Handles percent-encoding and `+` as space. A key without `=` gets an
    /// empty value.
    pub fn parse(query_string: &str) -> Self {
        let mut qd = Self::new();
        for pair in query_string.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            qd.append(&percent_decode(key), &percent_decode(value));
        }
        qd
    }

    /// Builds a `QueryDict` from key/value pairs.
    pub fn from_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> Self {
        let mut qd = Self::new();
        for (key, value) in pairs {
            qd.append(key.as_ref(), value.as_ref());
        }
        qd
    }

    /// Appends a value for `key`.
    pub fn append(&mut self, key: &str, value: &str) {
        self.data
            .entry(key.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Returns the last value for the given key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Returns all values for the given key.
    pub fn get_list(&self, key: &str) -> Option<&[String]> {
        self.data.get(key).map(Vec::as_slice)
    }

    /// Returns `true` if `key` is present with a non-empty last value.
    ///
    /// This is the truthiness test used for flag parameters such as
    /// `?modal=1` or `partial=true`.
    pub fn is_set(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| !v.is_empty())
    }

    /// Returns `true` if the specified key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Returns an iterator over the keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Returns `(key, last value)` pairs, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().filter_map(|(key, values)| {
            values.last().map(|v| (key.as_str(), v.as_str()))
        })
    }

    /// Returns the number of distinct keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the `QueryDict` contains no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Encodes this `QueryDict` as a URL query string.
    pub fn urlencode(&self) -> String {
        self.data
            .iter()
            .flat_map(|(key, values)| {
                values
                    .iter()
                    .map(move |value| format!("{}={}", percent_encode(key), percent_encode(value)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Decodes a form-encoded component (`+` is a space).
fn percent_decode(input: &str) -> String {
    let plus_decoded = input.replace('+', " ");
    percent_encoding::percent_decode_str(&plus_decoded)
        .decode_utf8_lossy()
        .into_owned()
}

/// Percent-encodes a string for use in a URL query.
pub(crate) fn percent_encode(input: &str) -> String {
    percent_encoding::utf8_percent_encode(input, percent_encoding::NON_ALPHANUMERIC).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let qd = QueryDict::parse("key=value");
        assert_eq!(qd.get("key"), Some("value"));
        assert_eq!(qd.len(), 1);
    }

    #[test]
    fn test_parse_multiple_values() {
        let qd = QueryDict::parse("color=red&color=blue&color=green");
        assert_eq!(qd.get("color"), Some("green"));
        assert_eq!(qd.get_list("color").unwrap().len(), 3);
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(QueryDict::parse("").is_empty());
        assert!(QueryDict::parse("&&").is_empty());
    }

    #[test]
    fn test_parse_key_without_value() {
        let qd = QueryDict::parse("modal&x=1");
        assert!(qd.contains_key("modal"));
        assert_eq!(qd.get("modal"), Some(""));
        assert!(!qd.is_set("modal"));
        assert!(qd.is_set("x"));
    }

    #[test]
    fn test_parse_decoding() {
        let qd = QueryDict::parse("title=Hello+World&q=a%26b");
        assert_eq!(qd.get("title"), Some("Hello World"));
        assert_eq!(qd.get("q"), Some("a&b"));
    }

    #[test]
    fn test_iter_uses_last_value() {
        let qd = QueryDict::parse("b=1&a=2&b=3");
        let pairs: Vec<_> = qd.iter().collect();
        assert_eq!(pairs, vec![("a", "2"), ("b", "3")]);
    }

    #[test]
    fn test_from_pairs_and_urlencode() {
        let qd = QueryDict::from_pairs(&[("title", "a b"), ("action", "cancel")]);
        assert_eq!(qd.urlencode(), "action=cancel&title=a%20b");
        assert_eq!(QueryDict::parse(&qd.urlencode()), qd);
    }
}
