//! Transactional persistence for invocation graphs.
//!
//! # Architecture
//!
//! 1. **[`InvocationStore`]** -- hands out transactions. Implementations must
//!    be `Send + Sync` so one store can serve many composers.
//! 2. **[`Transaction`]** -- stages inserts for the four persisted entities
//!    and applies them all on [`commit`](Transaction::commit), or none of
//!    them on [`rollback`](Transaction::rollback).
//!
//! The store does no validation: the composer validates the whole graph
//! before it opens a transaction.
//!
//! # Backends
//!
//! - [`InMemoryStore`](memory::InMemoryStore) -- `parking_lot`-guarded tables,
//!   used by tests and embedded callers.
//!
//! # Rows
//!
//! Committed data is exposed as flat row types ([`InvocationRow`],
//! [`TargetingRow`], [`TemplateInvocationRow`], [`InputValueRow`]) linked by
//! identifier.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    BookmarkId, ConcurrencyControl, InputValue, InputValueId, InvocationId, JobInvocation,
    PrincipalId, Targeting, TargetingId, TemplateId, TemplateInvocation, TemplateInvocationId,
};

pub use memory::InMemoryStore;

/// Errors raised by a store while writing a graph.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store refused the write because a limit was reached.
    #[error("capacity exceeded: {message}")]
    CapacityExceeded {
        /// Which limit was hit.
        message: String,
    },

    /// A row references a parent that was never inserted.
    #[error("dangling reference: {message}")]
    DanglingReference {
        /// Which reference is dangling.
        message: String,
    },

    /// Backend-specific failure.
    #[error("backend error: {message}")]
    Backend {
        /// Human-readable description.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// A committed job invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRow {
    /// Row identifier.
    pub id: InvocationId,
    /// Correlation id of the composition that produced the row.
    pub correlation_id: Uuid,
    /// Job name.
    pub job_name: Option<String>,
    /// Rendered description.
    pub description: Option<String>,
    /// Concurrency limits.
    pub concurrency_control: Option<ConcurrencyControl>,
    /// Execution timeout in seconds.
    pub execution_timeout_interval: Option<u64>,
    /// Commit timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

/// A committed targeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingRow {
    /// Row identifier.
    pub id: TargetingId,
    /// Owning invocation.
    pub invocation_id: InvocationId,
    /// Targeting type literal.
    pub targeting_type: String,
    /// Saved search, if targeting by bookmark.
    pub bookmark_id: Option<BookmarkId>,
    /// Ad-hoc query, if targeting by search.
    pub search_query: Option<String>,
    /// Owner of the targeting.
    pub user_id: PrincipalId,
}

/// A committed template invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInvocationRow {
    /// Row identifier.
    pub id: TemplateInvocationId,
    /// Owning invocation.
    pub invocation_id: InvocationId,
    /// Bound template.
    pub template_id: TemplateId,
}

/// A committed input value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputValueRow {
    /// Row identifier.
    pub id: InputValueId,
    /// Owning template invocation.
    pub template_invocation_id: TemplateInvocationId,
    /// Declared name of the input.
    pub input_name: String,
    /// Supplied value.
    pub value: Option<String>,
}

/// Hands out transactions over the invocation tables.
pub trait InvocationStore: Send + Sync {
    /// Opens a transaction.
    ///
    /// # Errors
    ///
    /// [`StoreError::Backend`] if the backend cannot start a transaction.
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StoreError>;
}

/// A unit of work over the invocation tables.
///
/// Inserts return the identifier the row will have once committed. Nothing
/// is visible to readers before [`commit`](Self::commit) succeeds. Dropping
/// a transaction without committing rolls it back.
pub trait Transaction {
    /// Stages the invocation row.
    fn insert_invocation(&mut self, invocation: &JobInvocation) -> Result<InvocationId, StoreError>;

    /// Stages the targeting row of `invocation_id`.
    fn insert_targeting(
        &mut self,
        invocation_id: InvocationId,
        targeting: &Targeting,
    ) -> Result<TargetingId, StoreError>;

    /// Stages a template invocation row of `invocation_id`.
    fn insert_template_invocation(
        &mut self,
        invocation_id: InvocationId,
        template_invocation: &TemplateInvocation,
    ) -> Result<TemplateInvocationId, StoreError>;

    /// Stages an input value row of `template_invocation_id`.
    fn insert_input_value(
        &mut self,
        template_invocation_id: TemplateInvocationId,
        input_value: &InputValue,
    ) -> Result<InputValueId, StoreError>;

    /// Applies every staged row atomically.
    ///
    /// # Errors
    ///
    /// On error nothing has been applied.
    fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discards every staged row.
    fn rollback(self: Box<Self>);
}
