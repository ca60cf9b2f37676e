//! The invocation graph built by the composer.
//!
//! [`JobInvocation`] owns exactly one optional [`Targeting`] and any number of
//! [`TemplateInvocation`]s, each of which owns its [`InputValue`]s. Every
//! entity carries an `id` that stays `None` until the graph is committed, so
//! `id.is_none()` means "new record".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bookmark::Bookmark;
use super::ids::{InputValueId, InvocationId, TargetingId, TemplateId, TemplateInvocationId};
use super::principal::Principal;
use super::template::{normalize_name, JobTemplate, TemplateInput};

/// A concrete value supplied for one template input.
///
/// `value` is `None` when the request named the input without giving a
/// value at all; such a binding is never acceptable. An empty string is
/// acceptable only for non-required inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputValue {
    /// Assigned on persist.
    pub id: Option<InputValueId>,
    /// The declared input this value is bound to.
    pub template_input: TemplateInput,
    /// The supplied value.
    pub value: Option<String>,
}

impl InputValue {
    /// Binds `value` to `template_input`.
    pub fn new(template_input: TemplateInput, value: Option<String>) -> Self {
        Self {
            id: None,
            template_input,
            value,
        }
    }

    /// Returns `true` if the value is missing or whitespace only.
    ///
    /// # Examples
    ///
    /// ```
    /// use invocation_composer::domain::{InputValue, TemplateInput};
    ///
    /// let input = TemplateInput::optional("note");
    /// assert!(InputValue::new(input.clone(), Some("  ".into())).is_blank());
    /// assert!(InputValue::new(input.clone(), None).is_blank());
    /// assert!(!InputValue::new(input, Some("x".into())).is_blank());
    /// ```
    pub fn is_blank(&self) -> bool {
        self.value
            .as_deref()
            .map_or(true, |value| value.trim().is_empty())
    }

    /// Returns `true` if this value breaks the input's presence rule.
    pub fn violates_presence(&self) -> bool {
        match &self.value {
            None => true,
            Some(_) => self.template_input.required && self.is_blank(),
        }
    }
}

/// Binds one job template to an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInvocation {
    /// Assigned on persist.
    pub id: Option<TemplateInvocationId>,
    /// The bound template.
    pub template: JobTemplate,
    /// At most one value per declared input.
    pub input_values: Vec<InputValue>,
}

impl TemplateInvocation {
    /// Creates a template invocation without any input values.
    pub fn new(template: JobTemplate) -> Self {
        Self {
            id: None,
            template,
            input_values: Vec::new(),
        }
    }

    /// Binds a value to the declared input called `name` (ignoring case).
    ///
    /// Returns `false` and leaves the invocation untouched if the template
    /// declares no such input. A second binding for the same input replaces
    /// the first.
    ///
    /// # Examples
    ///
    /// ```
    /// use invocation_composer::domain::{JobTemplate, TemplateId, TemplateInput, TemplateInvocation};
    ///
    /// let template = JobTemplate::new(TemplateId(1), "Ping", "Network")
    ///     .with_input(TemplateInput::required("host"));
    /// let mut ti = TemplateInvocation::new(template);
    ///
    /// assert!(ti.bind("HOST", Some("a".into())));
    /// assert!(ti.bind("host", Some("b".into())));
    /// assert!(!ti.bind("port", Some("22".into())));
    /// assert_eq!(ti.input_values.len(), 1);
    /// assert_eq!(ti.value_of("host"), Some("b"));
    /// ```
    pub fn bind(&mut self, name: &str, value: Option<String>) -> bool {
        let Some(input) = self.template.input_named(name).cloned() else {
            return false;
        };
        let key = input.normalized_name();
        match self
            .input_values
            .iter_mut()
            .find(|existing| existing.template_input.normalized_name() == key)
        {
            Some(existing) => existing.value = value,
            None => self.input_values.push(InputValue::new(input, value)),
        }
        true
    }

    /// Looks up the bound value for an input, ignoring case.
    pub fn input_value(&self, name: &str) -> Option<&InputValue> {
        let wanted = normalize_name(name);
        self.input_values
            .iter()
            .find(|value| value.template_input.normalized_name() == wanted)
    }

    /// Convenience accessor for the bound string value.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.input_value(name)
            .and_then(|value| value.value.as_deref())
    }

    /// Required inputs that received no binding at all.
    pub fn missing_required_inputs(&self) -> Vec<&TemplateInput> {
        self.template
            .required_inputs()
            .filter(|input| self.input_value(&input.name).is_none())
            .collect()
    }
}

/// Host selection for an invocation: a bookmark or an ad-hoc query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targeting {
    /// Assigned on persist.
    pub id: Option<TargetingId>,
    /// The targeting type literal the request carried.
    pub targeting_type: String,
    /// Saved search, when targeting by bookmark.
    pub bookmark: Option<Bookmark>,
    /// Ad-hoc query, when targeting by search.
    pub search_query: Option<String>,
    /// Owner of the targeting: the requesting principal.
    pub user: Principal,
}

impl Targeting {
    /// Targets the hosts matched by a saved search.
    pub fn with_bookmark(targeting_type: impl Into<String>, bookmark: Bookmark, user: Principal) -> Self {
        Self {
            id: None,
            targeting_type: targeting_type.into(),
            bookmark: Some(bookmark),
            search_query: None,
            user,
        }
    }

    /// Targets the hosts matched by an ad-hoc query, kept verbatim.
    pub fn with_search_query(
        targeting_type: impl Into<String>,
        search_query: impl Into<String>,
        user: Principal,
    ) -> Self {
        Self {
            id: None,
            targeting_type: targeting_type.into(),
            bookmark: None,
            search_query: Some(search_query.into()),
            user,
        }
    }

    /// Targeting with neither a bookmark nor a query. Never valid.
    pub fn empty(targeting_type: impl Into<String>, user: Principal) -> Self {
        Self {
            id: None,
            targeting_type: targeting_type.into(),
            bookmark: None,
            search_query: None,
            user,
        }
    }

    /// The query that selects hosts: the bookmark's query or the ad-hoc one.
    ///
    /// # Examples
    ///
    /// ```
    /// use invocation_composer::domain::{Bookmark, BookmarkId, Principal, PrincipalId, Targeting};
    ///
    /// let user = Principal::new(PrincipalId(1), "admin");
    /// let bookmark = Bookmark::new(BookmarkId(4), "db", "hostgroup = db");
    ///
    /// let t = Targeting::with_bookmark("static_query", bookmark, user.clone());
    /// assert_eq!(t.resolved_query(), Some("hostgroup = db"));
    ///
    /// let t = Targeting::with_search_query("static_query", "name ~ web*", user);
    /// assert_eq!(t.resolved_query(), Some("name ~ web*"));
    /// ```
    pub fn resolved_query(&self) -> Option<&str> {
        match &self.bookmark {
            Some(bookmark) => Some(bookmark.query.as_str()),
            None => self.search_query.as_deref(),
        }
    }

    /// Returns `true` if a bookmark or a non-blank query is present.
    pub fn has_selection(&self) -> bool {
        self.bookmark.is_some()
            || self
                .search_query
                .as_deref()
                .is_some_and(|query| !query.trim().is_empty())
    }
}

/// Limits on how many hosts run the job at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyControl {
    /// Maximum number of hosts running concurrently.
    pub level: Option<u32>,
    /// Seconds over which the run is distributed.
    pub time_span: Option<u64>,
}

/// Root of the invocation graph.
///
/// # Examples
///
/// ```
/// use invocation_composer::domain::JobInvocation;
///
/// let invocation = JobInvocation::new();
/// assert!(invocation.is_new_record());
/// assert!(invocation.targeting.is_none());
/// assert!(invocation.template_invocations.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInvocation {
    /// Assigned on persist.
    pub id: Option<InvocationId>,
    /// Correlates log lines for one composition attempt.
    pub correlation_id: Uuid,
    /// Job name the bound templates are registered under.
    pub job_name: Option<String>,
    /// Rendered human-readable description.
    pub description: Option<String>,
    /// Host selection; `None` fails validation.
    pub targeting: Option<Targeting>,
    /// One entry per bound template.
    pub template_invocations: Vec<TemplateInvocation>,
    /// Optional concurrency limits.
    pub concurrency_control: Option<ConcurrencyControl>,
    /// Seconds after which a running job is aborted.
    pub execution_timeout_interval: Option<u64>,
    /// Set when the graph is committed.
    pub created_at: Option<DateTime<Utc>>,
}

impl JobInvocation {
    /// Creates an empty, unsaved invocation.
    pub fn new() -> Self {
        Self {
            id: None,
            correlation_id: Uuid::new_v4(),
            job_name: None,
            description: None,
            targeting: None,
            template_invocations: Vec::new(),
            concurrency_control: None,
            execution_timeout_interval: None,
            created_at: None,
        }
    }

    /// Returns `true` until the invocation has been committed.
    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    /// The primary template: the first one bound.
    pub fn template(&self) -> Option<&JobTemplate> {
        self.template_invocations.first().map(|ti| &ti.template)
    }

    /// Finds the template invocation bound to `template_id`.
    pub fn template_invocation_for(&self, template_id: TemplateId) -> Option<&TemplateInvocation> {
        self.template_invocations
            .iter()
            .find(|ti| ti.template.id == template_id)
    }
}

impl Default for JobInvocation {
    fn default() -> Self {
        Self::new()
    }
}
