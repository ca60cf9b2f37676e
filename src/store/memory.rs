//! In-memory transactional invocation store.
//!
//! [`InMemoryStore`] keeps four tables behind one `parking_lot::RwLock`.
//! A [`MemoryTransaction`] stages rows privately and applies them under a
//! single write lock on commit, so readers see either the whole graph or
//! none of it.
//!
//! Identifiers come from per-table sequences that advance when a row is
//! staged; a rolled-back transaction leaves gaps, as a database sequence
//! would.
//!
//! # Examples
//!
//! ```
//! use invocation_composer::domain::JobInvocation;
//! use invocation_composer::store::{InMemoryStore, InvocationStore};
//!
//! let store = InMemoryStore::new();
//! let mut tx = store.begin().unwrap();
//! let id = tx.insert_invocation(&JobInvocation::new()).unwrap();
//! assert!(store.invocation(id).is_none());
//!
//! tx.commit().unwrap();
//! assert!(store.invocation(id).is_some());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{
    InputValueRow, InvocationRow, InvocationStore, StoreError, TargetingRow,
    TemplateInvocationRow, Transaction,
};
use crate::domain::{
    InputValue, InputValueId, InvocationId, JobInvocation, Targeting, TargetingId,
    TemplateInvocation, TemplateInvocationId,
};

#[derive(Debug, Default)]
struct Tables {
    invocations: IndexMap<InvocationId, InvocationRow>,
    targetings: IndexMap<TargetingId, TargetingRow>,
    template_invocations: IndexMap<TemplateInvocationId, TemplateInvocationRow>,
    input_values: IndexMap<InputValueId, InputValueRow>,
}

#[derive(Debug)]
struct Sequence(AtomicU64);

impl Sequence {
    fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// Row counts per table, for assertions and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    /// Committed invocations.
    pub invocations: usize,
    /// Committed targetings.
    pub targetings: usize,
    /// Committed template invocations.
    pub template_invocations: usize,
    /// Committed input values.
    pub input_values: usize,
}

impl TableCounts {
    /// Returns `true` if every table is empty.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Thread-safe in-memory store.
#[derive(Debug)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    invocation_ids: Sequence,
    targeting_ids: Sequence,
    template_invocation_ids: Sequence,
    input_value_ids: Sequence,
    max_invocations: Option<usize>,
}

impl InMemoryStore {
    /// Creates an empty store without limits.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            invocation_ids: Sequence::new(),
            targeting_ids: Sequence::new(),
            template_invocation_ids: Sequence::new(),
            input_value_ids: Sequence::new(),
            max_invocations: None,
        }
    }

    /// Caps the number of committed invocations. A commit that would exceed
    /// the cap fails with [`StoreError::CapacityExceeded`].
    #[must_use]
    pub fn with_max_invocations(mut self, max: usize) -> Self {
        self.max_invocations = Some(max);
        self
    }

    /// Returns the committed invocation row.
    pub fn invocation(&self, id: InvocationId) -> Option<InvocationRow> {
        self.tables.read().invocations.get(&id).cloned()
    }

    /// Returns the committed targeting of an invocation.
    pub fn targeting_for(&self, invocation_id: InvocationId) -> Option<TargetingRow> {
        self.tables
            .read()
            .targetings
            .values()
            .find(|row| row.invocation_id == invocation_id)
            .cloned()
    }

    /// Returns the committed template invocations of an invocation.
    pub fn template_invocations_for(&self, invocation_id: InvocationId) -> Vec<TemplateInvocationRow> {
        self.tables
            .read()
            .template_invocations
            .values()
            .filter(|row| row.invocation_id == invocation_id)
            .cloned()
            .collect()
    }

    /// Returns the committed input values of a template invocation.
    pub fn input_values_for(&self, template_invocation_id: TemplateInvocationId) -> Vec<InputValueRow> {
        self.tables
            .read()
            .input_values
            .values()
            .filter(|row| row.template_invocation_id == template_invocation_id)
            .cloned()
            .collect()
    }

    /// Row counts of every table.
    pub fn counts(&self) -> TableCounts {
        let tables = self.tables.read();
        TableCounts {
            invocations: tables.invocations.len(),
            targetings: tables.targetings.len(),
            template_invocations: tables.template_invocations.len(),
            input_values: tables.input_values.len(),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InvocationStore for InMemoryStore {
    fn begin(&self) -> Result<Box<dyn Transaction + '_>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            store: self,
            staged: Tables::default(),
            finished: false,
        }))
    }
}

/// A transaction over an [`InMemoryStore`].
#[derive(Debug)]
pub struct MemoryTransaction<'a> {
    store: &'a InMemoryStore,
    staged: Tables,
    finished: bool,
}

impl MemoryTransaction<'_> {
    fn check_references(&self, tables: &Tables) -> Result<(), StoreError> {
        let invocation_known =
            |id: &InvocationId| self.staged.invocations.contains_key(id) || tables.invocations.contains_key(id);

        for row in self.staged.targetings.values() {
            if !invocation_known(&row.invocation_id) {
                return Err(StoreError::DanglingReference {
                    message: format!("targeting {} -> invocation {}", row.id, row.invocation_id),
                });
            }
        }
        for row in self.staged.template_invocations.values() {
            if !invocation_known(&row.invocation_id) {
                return Err(StoreError::DanglingReference {
                    message: format!(
                        "template invocation {} -> invocation {}",
                        row.id, row.invocation_id
                    ),
                });
            }
        }
        for row in self.staged.input_values.values() {
            let known = self
                .staged
                .template_invocations
                .contains_key(&row.template_invocation_id)
                || tables
                    .template_invocations
                    .contains_key(&row.template_invocation_id);
            if !known {
                return Err(StoreError::DanglingReference {
                    message: format!(
                        "input value {} -> template invocation {}",
                        row.id, row.template_invocation_id
                    ),
                });
            }
        }
        Ok(())
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn insert_invocation(&mut self, invocation: &JobInvocation) -> Result<InvocationId, StoreError> {
        let id = InvocationId(self.store.invocation_ids.next());
        self.staged.invocations.insert(
            id,
            InvocationRow {
                id,
                correlation_id: invocation.correlation_id,
                job_name: invocation.job_name.clone(),
                description: invocation.description.clone(),
                concurrency_control: invocation.concurrency_control,
                execution_timeout_interval: invocation.execution_timeout_interval,
                created_at: invocation.created_at,
            },
        );
        Ok(id)
    }

    fn insert_targeting(
        &mut self,
        invocation_id: InvocationId,
        targeting: &Targeting,
    ) -> Result<TargetingId, StoreError> {
        let id = TargetingId(self.store.targeting_ids.next());
        self.staged.targetings.insert(
            id,
            TargetingRow {
                id,
                invocation_id,
                targeting_type: targeting.targeting_type.clone(),
                bookmark_id: targeting.bookmark.as_ref().map(|bookmark| bookmark.id),
                search_query: targeting.search_query.clone(),
                user_id: targeting.user.id,
            },
        );
        Ok(id)
    }

    fn insert_template_invocation(
        &mut self,
        invocation_id: InvocationId,
        template_invocation: &TemplateInvocation,
    ) -> Result<TemplateInvocationId, StoreError> {
        let id = TemplateInvocationId(self.store.template_invocation_ids.next());
        self.staged.template_invocations.insert(
            id,
            TemplateInvocationRow {
                id,
                invocation_id,
                template_id: template_invocation.template.id,
            },
        );
        Ok(id)
    }

    fn insert_input_value(
        &mut self,
        template_invocation_id: TemplateInvocationId,
        input_value: &InputValue,
    ) -> Result<InputValueId, StoreError> {
        let id = InputValueId(self.store.input_value_ids.next());
        self.staged.input_values.insert(
            id,
            InputValueRow {
                id,
                template_invocation_id,
                input_name: input_value.template_input.name.clone(),
                value: input_value.value.clone(),
            },
        );
        Ok(id)
    }

    fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        let store = self.store;
        let mut tables = store.tables.write();

        if let Some(max) = store.max_invocations {
            let total = tables.invocations.len() + self.staged.invocations.len();
            if total > max {
                tracing::warn!(max, total, "rejecting commit over invocation capacity");
                return Err(StoreError::CapacityExceeded {
                    message: format!("at most {max} invocations may be stored"),
                });
            }
        }
        self.check_references(&tables)?;

        let staged = std::mem::take(&mut self.staged);
        tracing::debug!(
            invocations = staged.invocations.len(),
            targetings = staged.targetings.len(),
            template_invocations = staged.template_invocations.len(),
            input_values = staged.input_values.len(),
            "committing staged rows"
        );
        tables.invocations.extend(staged.invocations);
        tables.targetings.extend(staged.targetings);
        tables.template_invocations.extend(staged.template_invocations);
        tables.input_values.extend(staged.input_values);
        self.finished = true;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) {
        self.staged = Tables::default();
        self.finished = true;
        tracing::debug!("transaction rolled back");
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("transaction dropped without commit, discarding staged rows");
        }
    }
}
