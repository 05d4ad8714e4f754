//! Path converters for URL patterns.
//!
//! | Name   | Regex            |
//! |--------|------------------|
//! | `int`  | `[0-9]+`         |
//! | `str`  | `[^/]+`          |
//! | `slug` | `[-a-zA-Z0-9_]+` |

use std::fmt;
use std::str::FromStr;

use djinn_core::ContentError;

/// A built-in path converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// One or more ASCII digits.
    Int,
    /// Any non-empty segment without `/`.
    Str,
    /// Letters, digits, hyphens and underscores.
    Slug,
}

impl Converter {
    /// Returns the regex fragment that matches a value for this converter.
    pub const fn regex(self) -> &'static str {
        match self {
            Self::Int => "[0-9]+",
            Self::Str => "[^/]+",
            Self::Slug => "[-a-zA-Z0-9_]+",
        }
    }

    /// Returns `true` if `value` is a valid, complete value for this converter.
    pub fn accepts(self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        match self {
            Self::Int => value.bytes().all(|b| b.is_ascii_digit()),
            Self::Str => !value.contains('/'),
            Self::Slug => value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'),
        }
    }
}

impl FromStr for Converter {
    type Err = ContentError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "int" => Ok(Self::Int),
            "str" => Ok(Self::Str),
            "slug" => Ok(Self::Slug),
            other => Err(ContentError::ImproperlyConfigured(format!(
                "Unknown path converter: '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Str => write!(f, "str"),
            Self::Slug => write!(f, "slug"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("int".parse::<Converter>().unwrap(), Converter::Int);
        assert_eq!("slug".parse::<Converter>().unwrap(), Converter::Slug);
        assert!("uuid".parse::<Converter>().is_err());
    }

    #[test]
    fn test_int_accepts() {
        assert!(Converter::Int.accepts("42"));
        assert!(!Converter::Int.accepts("4a"));
        assert!(!Converter::Int.accepts(""));
    }

    #[test]
    fn test_slug_accepts() {
        assert!(Converter::Slug.accepts("hello-world_2"));
        assert!(!Converter::Slug.accepts("hello world"));
    }

    #[test]
    fn test_str_accepts() {
        assert!(Converter::Str.accepts("news item"));
        assert!(!Converter::Str.accepts("a/b"));
    }
}
