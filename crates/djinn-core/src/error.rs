//! Core error types for the djinn stack.
//!
//! [`ContentError`] covers the failures the content-type views can run into:
//! permission and lookup failures, URL reversal, configuration, templates,
//! form validation and storage. Each variant maps to an HTTP status code via
//! [`ContentError::status_code`], which is how views turn errors into
//! responses.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Per-field validation errors produced by a content form.
///
/// Keys are field names; the reserved key `__all__` holds form-level errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    /// Creates an empty error collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error message for `field`.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    /// Returns the messages recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    /// Returns `true` if no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of fields with errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns the underlying field → messages map.
    pub const fn as_map(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.errors {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// The primary error type for the djinn crates.
#[derive(Error, Debug)]
pub enum ContentError {
    // ── HTTP-level ───────────────────────────────────────────────────

    /// The user lacks the permission required for the operation (403).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The requested resource (content type, group, route) is unknown (404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// A request used an HTTP method the view does not handle (405).
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    // ── Storage ──────────────────────────────────────────────────────

    /// A lookup expected exactly one object and found none (404).
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// The object store failed.
    #[error("Database error: {0}")]
    Database(String),

    // ── URLs ─────────────────────────────────────────────────────────

    /// A named URL could not be reversed.
    #[error("Reverse for '{0}' not found")]
    NoReverseMatch(String),

    // ── Validation ───────────────────────────────────────────────────

    /// Submitted form data failed validation.
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration file or value could not be read.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The application is wired up inconsistently.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── Templates ────────────────────────────────────────────────────

    /// None of the candidate templates exist.
    #[error("Template does not exist: {0}")]
    TemplateDoesNotExist(String),

    /// A template failed to parse or render.
    #[error("Template error: {0}")]
    TemplateError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContentError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `Validation` -> 400
    /// - `PermissionDenied` -> 403
    /// - `NotFound`, `DoesNotExist` -> 404
    /// - `MethodNotAllowed` -> 405
    /// - everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::PermissionDenied(_) => 403,
            Self::NotFound(_) | Self::DoesNotExist(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::Database(_)
            | Self::NoReverseMatch(_)
            | Self::ConfigurationError(_)
            | Self::ImproperlyConfigured(_)
            | Self::TemplateDoesNotExist(_)
            | Self::TemplateError(_)
            | Self::Io(_) => 500,
        }
    }

    /// Returns `true` for the two "nothing there" variants.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::DoesNotExist(_))
    }
}

impl From<ValidationErrors> for ContentError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

/// A convenience type alias for `Result<T, ContentError>`.
pub type ContentResult<T> = Result<T, ContentError>;
