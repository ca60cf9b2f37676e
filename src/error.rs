//! Error types for invocation composition.
//!
//! [`ComposerError`] separates the three ways a composition can end badly:
//!
//! - [`ConfigurationConflict`](ComposerError::ConfigurationConflict): the
//!   request is ill-formed and composition aborted before anything was built.
//! - [`NotSaved`](ComposerError::NotSaved): the assembled graph failed
//!   validation; every problem found is carried in [`ValidationErrors`].
//! - [`Catalog`](ComposerError::Catalog) / [`Store`](ComposerError::Store):
//!   a collaborator failed and its error is passed through unchanged.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::store::StoreError;
use crate::validation::ValidationErrors;

/// Errors that can occur while composing or saving a job invocation.
///
/// # Examples
///
/// ```
/// use invocation_composer::ComposerError;
///
/// let err = ComposerError::ConfigurationConflict {
///     message: "both bookmark and search query given".to_string(),
/// };
/// assert!(err.is_configuration_conflict());
/// assert!(!err.is_not_saved());
/// ```
#[derive(Error, Debug)]
pub enum ComposerError {
    /// Mutually exclusive parameters were supplied together.
    #[error("Configuration conflict: {message}")]
    ConfigurationConflict {
        /// What conflicted.
        message: String,
    },

    /// Validation rejected the invocation graph; nothing was persisted.
    #[error("{0}")]
    NotSaved(ValidationErrors),

    /// A template or bookmark could not be resolved.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The store failed while writing the graph; the transaction was rolled
    /// back.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The parameter bag could not be decoded.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Composer configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ComposerError {
    /// Returns `true` for a construction-time configuration conflict.
    pub fn is_configuration_conflict(&self) -> bool {
        matches!(self, Self::ConfigurationConflict { .. })
    }

    /// Returns `true` for a save-time validation rejection.
    pub fn is_not_saved(&self) -> bool {
        matches!(self, Self::NotSaved(_))
    }

    /// The aggregated validation failures, if this is a rejection.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::NotSaved(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for ComposerError {
    fn from(errors: ValidationErrors) -> Self {
        Self::NotSaved(errors)
    }
}

impl From<serde_json::Error> for ComposerError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidParams(err.to_string())
    }
}

impl From<std::io::Error> for ComposerError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::de::Error> for ComposerError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("TOML parse error: {}", err))
    }
}
