//! URL patterns and reverse resolution.
//!
//! - [`converters`]: path converters (`int`, `str`, `slug`)
//! - [`pattern`]: `path()`-style route parsing and matching
//! - [`reverse`]: named patterns and reverse URL generation
//!
//! Request routing itself is done by axum; [`RoutePattern::to_axum_path`]
//! bridges the two syntaxes.

pub mod converters;
pub mod pattern;
pub mod reverse;

pub use pattern::RoutePattern;
pub use reverse::UrlConf;
