//! Content views.
//!
//! - [`base`] - The `View` trait, the shared [`ViewContext`] and per-type options
//! - [`detail`] - `DetailView` and the generic `CTDetailView`
//! - [`create`] - `CreateView`, with temporary objects
//! - [`update`] - `UpdateView`
//! - [`delete`] - `DeleteView`

pub mod base;
pub mod create;
pub mod delete;
pub mod detail;
pub mod update;

pub use base::{current_user, ContentTypeOptions, View, ViewContext};
pub use create::CreateView;
pub use delete::DeleteView;
pub use detail::{CTDetailView, DetailView};
pub use update::UpdateView;
