//! Saved searches usable as targeting.

use serde::{Deserialize, Serialize};

use super::ids::BookmarkId;

/// A persisted, named search query that can be reused as targeting.
///
/// # Examples
///
/// ```
/// use invocation_composer::domain::{Bookmark, BookmarkId};
///
/// let bookmark = Bookmark::new(BookmarkId(1), "web servers", "hostgroup = web");
/// assert_eq!(bookmark.query, "hostgroup = web");
/// assert!(!bookmark.public);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Identifier of the bookmark.
    pub id: BookmarkId,
    /// Display name.
    pub name: String,
    /// The saved search query.
    pub query: String,
    /// Whether the bookmark is shared with other users.
    #[serde(default)]
    pub public: bool,
}

impl Bookmark {
    /// Creates a private bookmark.
    pub fn new(id: BookmarkId, name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            query: query.into(),
            public: false,
        }
    }

    /// Marks the bookmark as public.
    #[must_use]
    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }
}
