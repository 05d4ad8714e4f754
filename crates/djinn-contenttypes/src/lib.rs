//! # djinn-contenttypes
//!
//! A registry of content types and the generic views that add, show, edit
//! and delete them.
//!
//! ## Modules
//!
//! - [`registry`] - Content-type registry with per-type settings and permissions
//! - [`content`] - Content objects and publication windows
//! - [`store`] - Object storage
//! - [`forms`] - Form fields, validation and initial data
//! - [`templates`] - Template resolution and rendering
//! - [`messages`] - Flash messages
//! - [`views`] - The content views
//! - [`app`] - Routing and serving

pub mod app;
pub mod content;
pub mod forms;
pub mod messages;
pub mod registry;
pub mod store;
pub mod templates;
pub mod views;

pub use app::ContentTypesApp;
pub use content::{ContentObject, Publishable};
pub use registry::{CTRegistry, ContentTypeEntry, PermissionKind};
pub use store::{InMemoryStore, ObjectStore};
