//! # djinn-auth
//!
//! Users and authorization, modeled after `django.contrib.auth`:
//!
//! - **Users** with direct permissions and group memberships (`user`)
//! - **Permission evaluation** in a global, group or object-owner context
//!   (`permissions`)
//! - **Backends** resolving users and groups, including the trusted
//!   remote-user header (`backends`)
//!
//! Inactive users hold no permissions; superusers hold all of them.

pub mod backends;
pub mod permissions;
pub mod user;

pub use backends::{AuthBackend, UserDirectory, REMOTE_USER_HEADER};
pub use permissions::{Group, PermissionChecker, PermissionTarget};
pub use user::User;
