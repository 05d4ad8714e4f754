//! Content objects.
//!
//! A [`ContentObject`] is one stored record of some content type. Its typed
//! columns are the ones the views act on (the temporary flag, who created and
//! last changed it, its owner, the publication window); everything a form
//! collects goes into [`ContentObject::fields`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use djinn_auth::{PermissionTarget, User};

/// Content with a publication window.
pub trait Publishable {
    fn is_tmp(&self) -> bool;
    fn publish_from(&self) -> Option<DateTime<Utc>>;
    fn publish_to(&self) -> Option<DateTime<Utc>>;

    /// Temporary content is never public.
    fn is_public(&self) -> bool {
        !self.is_tmp()
    }

    /// Returns `true` if `now` falls inside the publication window.
    ///
    /// An unset bound is open: no `publish_from` means published from the
    /// start, no `publish_to` means never unpublished.
    fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        self.publish_from().map_or(true, |from| from <= now)
            && self.publish_to().map_or(true, |to| to > now)
    }

    fn is_published(&self) -> bool {
        self.is_published_at(Utc::now())
    }
}

/// A stored record of some content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentObject {
    /// Store-assigned id; `0` until first saved.
    pub id: u64,
    /// Name of the content type.
    pub ctype: String,
    /// Provisional object of an unfinished add flow.
    pub is_tmp: bool,
    pub creator: Option<String>,
    pub changed_by: Option<String>,
    pub owner: Option<String>,
    pub slug: Option<String>,
    pub publish_from: Option<DateTime<Utc>>,
    pub publish_to: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub changed: DateTime<Utc>,
    /// Form data.
    pub fields: Map<String, Value>,
}

impl ContentObject {
    /// Creates an unsaved object of the given type.
    pub fn new(ctype: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            ctype: ctype.into(),
            is_tmp: false,
            creator: None,
            changed_by: None,
            owner: None,
            slug: None,
            publish_from: None,
            publish_to: None,
            created: now,
            changed: now,
            fields: Map::new(),
        }
    }

    /// Returns `true` once the store has assigned an id.
    pub const fn is_saved(&self) -> bool {
        self.id != 0
    }

    /// Returns a form field value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Records `user` as creator and last editor.
    pub fn set_creator(&mut self, user: &User) {
        let username = authenticated_name(user);
        self.creator.clone_from(&username);
        self.changed_by = username;
    }

    /// Records `user` as last editor.
    pub fn set_changed_by(&mut self, user: &User) {
        self.changed_by = authenticated_name(user);
    }

    /// Makes `user` the owner, granting the owner permissions.
    pub fn set_owner(&mut self, user: &User) {
        self.owner = authenticated_name(user);
    }

    /// Returns the slug if it is set and non-empty.
    pub fn url_slug(&self) -> Option<&str> {
        self.slug.as_deref().filter(|s| !s.is_empty())
    }
}

fn authenticated_name(user: &User) -> Option<String> {
    user.is_authenticated().then(|| user.username.clone())
}

impl Publishable for ContentObject {
    fn is_tmp(&self) -> bool {
        self.is_tmp
    }

    fn publish_from(&self) -> Option<DateTime<Utc>> {
        self.publish_from
    }

    fn publish_to(&self) -> Option<DateTime<Utc>> {
        self.publish_to
    }
}

impl PermissionTarget for ContentObject {
    fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }
}
