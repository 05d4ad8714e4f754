//! # djinn-core
//!
//! Core types for the djinn crates. This crate has no web dependencies and
//! provides the foundation the HTTP, auth and content-type crates build on.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Settings with defaults
//! - [`settings_loader`] - TOML/JSON loading and environment overrides
//! - [`logging`] - Tracing-based logging integration
//! - [`checks`] - Start-up configuration checks

pub mod checks;
pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;

// Re-export the most commonly used types at the crate root.
pub use error::{ContentError, ContentResult, ValidationErrors};
pub use settings::Settings;
