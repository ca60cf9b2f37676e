//! Composition, validation and transactional persistence of job invocations.
//!
//! A *job invocation* records which job template to run, against which
//! hosts, with which input values. This crate turns an untyped request
//! ([`InvocationParams`]) into that record:
//!
//! 1. [`InvocationComposer::compose`] resolves targeting (a saved bookmark
//!    or an ad-hoc search query) and job templates through the catalog
//!    traits, and binds input values to each template's declared inputs.
//! 2. [`InvocationComposer::save`] validates the whole graph, reporting
//!    every problem at once, and writes it in a single transaction.
//!
//! # Module Organization
//!
//! - [`composer`] - The composer and its context
//! - [`domain`] - Invocation graph and collaborator records
//! - [`types`] - The request parameter bag
//! - [`validation`] - Structured validation errors and the graph validator
//! - [`catalog`] - Template and bookmark lookup traits
//! - [`store`] - Transactional persistence traits and in-memory store
//! - [`config`] - Composer configuration
//! - [`error`] - Error types
//! - [`constants`] - Targeting literals and defaults

pub mod catalog;
pub mod composer;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod store;
pub mod types;
pub mod validation;

// Re-exports for ergonomic access
pub use composer::{ComposerContext, ComposerState, InvocationComposer};
pub use config::ComposerConfig;
pub use error::ComposerError;
pub use types::{InputParam, InvocationParams};
pub use validation::{ValidationError, ValidationErrors};
