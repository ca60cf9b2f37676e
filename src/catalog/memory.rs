//! In-memory template and bookmark catalog.
//!
//! # Examples
//!
//! ```
//! use invocation_composer::catalog::{BookmarkCatalog, InMemoryCatalog, TemplateCatalog};
//! use invocation_composer::domain::{Bookmark, BookmarkId, JobTemplate, TemplateId};
//!
//! let catalog = InMemoryCatalog::new()
//!     .with_template(JobTemplate::new(TemplateId(1), "Run Command", "Commands"))
//!     .with_bookmark(Bookmark::new(BookmarkId(1), "all", "name ~ *"));
//!
//! assert_eq!(catalog.template(TemplateId(1)).unwrap().name, "Run Command");
//! assert_eq!(catalog.template_by_job_name("commands").unwrap().id, TemplateId(1));
//! assert!(catalog.bookmark(BookmarkId(2)).is_err());
//! ```

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{BookmarkCatalog, CatalogError, TemplateCatalog};
use crate::domain::{Bookmark, BookmarkId, JobTemplate, TemplateId};

/// Thread-safe catalog holding templates and bookmarks in memory.
///
/// Templates keep registration order, so [`template_by_job_name`] returns the
/// earliest template registered under a job name. Job names compare
/// case-insensitively.
///
/// [`template_by_job_name`]: TemplateCatalog::template_by_job_name
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    templates: RwLock<IndexMap<TemplateId, JobTemplate>>,
    bookmarks: RwLock<IndexMap<BookmarkId, Bookmark>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template (chainable).
    #[must_use]
    pub fn with_template(self, template: JobTemplate) -> Self {
        self.insert_template(template);
        self
    }

    /// Registers a bookmark (chainable).
    #[must_use]
    pub fn with_bookmark(self, bookmark: Bookmark) -> Self {
        self.insert_bookmark(bookmark);
        self
    }

    /// Registers or replaces a template.
    pub fn insert_template(&self, template: JobTemplate) {
        self.templates.write().insert(template.id, template);
    }

    /// Registers or replaces a bookmark.
    pub fn insert_bookmark(&self, bookmark: Bookmark) {
        self.bookmarks.write().insert(bookmark.id, bookmark);
    }

    /// Number of registered templates.
    pub fn template_count(&self) -> usize {
        self.templates.read().len()
    }
}

impl TemplateCatalog for InMemoryCatalog {
    fn template(&self, id: TemplateId) -> Result<JobTemplate, CatalogError> {
        self.templates
            .read()
            .get(&id)
            .cloned()
            .ok_or(CatalogError::TemplateNotFound { template_id: id })
    }

    fn template_by_job_name(&self, job_name: &str) -> Result<JobTemplate, CatalogError> {
        self.templates
            .read()
            .values()
            .find(|template| template.has_job_name(job_name))
            .cloned()
            .ok_or_else(|| CatalogError::TemplateNotFoundByJobName {
                job_name: job_name.to_string(),
            })
    }
}

impl BookmarkCatalog for InMemoryCatalog {
    fn bookmark(&self, id: BookmarkId) -> Result<Bookmark, CatalogError> {
        self.bookmarks
            .read()
            .get(&id)
            .cloned()
            .ok_or(CatalogError::BookmarkNotFound { bookmark_id: id })
    }
}
