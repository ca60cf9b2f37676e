//! Read-only collaborators: job templates and bookmarks.
//!
//! The composer resolves templates and bookmarks through these traits and
//! never mutates what they return. Lookup failures are reported as
//! [`CatalogError`] and passed through to the caller untouched.
//!
//! Permission filtering is the implementor's concern: a catalog scoped to a
//! user simply reports records that user may not see as not found.
//!
//! - [`InMemoryCatalog`](memory::InMemoryCatalog) implements both traits and
//!   backs the tests.

pub mod memory;

use thiserror::Error;

use crate::domain::{Bookmark, BookmarkId, JobTemplate, TemplateId};

pub use memory::InMemoryCatalog;

/// Errors raised while resolving templates or bookmarks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No template with this identifier.
    #[error("job template not found: {template_id}")]
    TemplateNotFound {
        /// The identifier that was looked up.
        template_id: TemplateId,
    },

    /// No template registered under this job name.
    #[error("no job template found for job name '{job_name}'")]
    TemplateNotFoundByJobName {
        /// The job name that was looked up.
        job_name: String,
    },

    /// No bookmark with this identifier.
    #[error("bookmark not found: {bookmark_id}")]
    BookmarkNotFound {
        /// The identifier that was looked up.
        bookmark_id: BookmarkId,
    },
}

/// Resolves job templates.
pub trait TemplateCatalog: Send + Sync {
    /// Looks up a template by identifier.
    ///
    /// # Errors
    ///
    /// [`CatalogError::TemplateNotFound`] if there is no such template.
    fn template(&self, id: TemplateId) -> Result<JobTemplate, CatalogError>;

    /// Looks up the first template registered under `job_name`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::TemplateNotFoundByJobName`] if none is registered.
    fn template_by_job_name(&self, job_name: &str) -> Result<JobTemplate, CatalogError>;
}

/// Resolves saved searches.
pub trait BookmarkCatalog: Send + Sync {
    /// Looks up a bookmark by identifier.
    ///
    /// # Errors
    ///
    /// [`CatalogError::BookmarkNotFound`] if there is no such bookmark.
    fn bookmark(&self, id: BookmarkId) -> Result<Bookmark, CatalogError>;
}
