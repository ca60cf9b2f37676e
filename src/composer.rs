//! The invocation composer.
//!
//! Composition happens in two steps:
//!
//! 1. [`InvocationComposer::compose`] reads the parameter bag, resolves
//!    targeting and templates through the catalogs and binds input values.
//!    Mutually exclusive targeting parameters abort here with
//!    [`ComposerError::ConfigurationConflict`]; anything merely incomplete is
//!    left for validation.
//! 2. [`InvocationComposer::save`] validates the whole graph, collecting
//!    every failure, and only then writes it in one transaction.
//!
//! ```text
//! Initializing -> Assembled -> Saved
//!       |              \-----> Rejected   (ComposerError::NotSaved)
//!       \--------------------> Aborted    (ComposerError::ConfigurationConflict)
//! ```
//!
//! # Examples
//!
//! ```
//! use invocation_composer::catalog::InMemoryCatalog;
//! use invocation_composer::composer::{ComposerContext, InvocationComposer};
//! use invocation_composer::domain::*;
//! use invocation_composer::store::InMemoryStore;
//! use invocation_composer::types::{InputParam, InvocationParams};
//!
//! let catalog = InMemoryCatalog::new().with_template(
//!     JobTemplate::new(TemplateId(1), "Run Command", "Commands")
//!         .with_input(TemplateInput::required("command")),
//! );
//! let store = InMemoryStore::new();
//! let context = ComposerContext::new(&catalog, &catalog);
//!
//! let params = InvocationParams::new()
//!     .with_template_id(TemplateId(1))
//!     .with_targeting_type("static_query")
//!     .with_search_query("name ~ web*")
//!     .with_input(InputParam::new("Command", "uptime"));
//!
//! let composer = InvocationComposer::compose(
//!     &context,
//!     JobInvocation::new(),
//!     Principal::new(PrincipalId(1), "admin"),
//!     &params,
//! )
//! .unwrap();
//! let invocation = composer.save(&store).unwrap();
//!
//! assert!(!invocation.is_new_record());
//! assert_eq!(invocation.template_invocations[0].input_values.len(), 1);
//! ```

use std::fmt;

use chrono::Utc;

use crate::catalog::{BookmarkCatalog, CatalogError, TemplateCatalog};
use crate::config::ComposerConfig;
use crate::constants::{JOB_NAME_PLACEHOLDER, STATIC_QUERY_TARGETING, TEMPLATE_NAME_PLACEHOLDER};
use crate::domain::{
    ConcurrencyControl, JobInvocation, JobTemplate, Principal, Targeting, TemplateInvocation,
};
use crate::error::ComposerError;
use crate::store::{InvocationStore, Transaction};
use crate::types::InvocationParams;
use crate::validation::{self, ValidationErrors};

/// Where a composition attempt stands.
///
/// Reported in log events only. A composer is always assembled while it can
/// be observed: [`InvocationComposer::compose`] returns it assembled and
/// [`InvocationComposer::save`] consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    /// Parameters are being read.
    Initializing,
    /// The graph is built and waiting to be saved.
    Assembled,
    /// The graph was committed.
    Saved,
    /// Validation rejected the graph.
    Rejected,
    /// Composition aborted on conflicting parameters.
    Aborted,
}

impl fmt::Display for ComposerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initializing => "initializing",
            Self::Assembled => "assembled",
            Self::Saved => "saved",
            Self::Rejected => "rejected",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Collaborators and settings shared by every composition.
///
/// Cheap to build; usually one per request handler.
pub struct ComposerContext<'a> {
    templates: &'a dyn TemplateCatalog,
    bookmarks: &'a dyn BookmarkCatalog,
    config: ComposerConfig,
}

impl<'a> ComposerContext<'a> {
    /// Creates a context with the default configuration.
    pub fn new(templates: &'a dyn TemplateCatalog, bookmarks: &'a dyn BookmarkCatalog) -> Self {
        Self {
            templates,
            bookmarks,
            config: ComposerConfig::default(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ComposerConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }
}

impl fmt::Debug for ComposerContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposerContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// An assembled, not yet saved, job invocation.
#[derive(Debug)]
pub struct InvocationComposer {
    invocation: JobInvocation,
    principal: Principal,
    config: ComposerConfig,
}

impl InvocationComposer {
    /// Builds the invocation graph from `params`.
    ///
    /// # Errors
    ///
    /// - [`ComposerError::ConfigurationConflict`] if a targeting type is given
    ///   together with both a bookmark and a search query.
    /// - [`ComposerError::Catalog`] if a bookmark or template cannot be
    ///   resolved, or a requested template does not belong to the requested
    ///   job name.
    pub fn compose(
        context: &ComposerContext<'_>,
        mut invocation: JobInvocation,
        principal: Principal,
        params: &InvocationParams,
    ) -> Result<Self, ComposerError> {
        tracing::debug!(
            correlation_id = %invocation.correlation_id,
            principal = %principal.login,
            state = %ComposerState::Initializing,
            "composing job invocation"
        );

        if params.targeting_type.is_some()
            && params.bookmark_id.is_some()
            && params.search_query.is_some()
        {
            tracing::warn!(
                correlation_id = %invocation.correlation_id,
                state = %ComposerState::Aborted,
                "both bookmark and search query supplied"
            );
            return Err(ComposerError::ConfigurationConflict {
                message: "Please specify either a bookmark or a search query, not both".to_string(),
            });
        }

        invocation.targeting = resolve_targeting(context, &principal, params)?;

        let templates = resolve_templates(context, params)?;
        invocation.job_name = requested_job_name(params)
            .map(str::to_string)
            .or_else(|| templates.first().map(|template| template.job_name.clone()));
        invocation.template_invocations = templates
            .into_iter()
            .map(|template| bind_inputs(template, params))
            .collect();

        let format = params
            .description_format
            .as_deref()
            .unwrap_or(&context.config.default_description_format);
        invocation.description = Some(render_description(format, &invocation));

        invocation.concurrency_control = params.concurrency_control.map(|control| ConcurrencyControl {
            level: control.level,
            time_span: control.time_span,
        });
        invocation.execution_timeout_interval = params
            .execution_timeout_interval
            .or(context.config.default_execution_timeout_interval);

        tracing::debug!(
            correlation_id = %invocation.correlation_id,
            templates = invocation.template_invocations.len(),
            has_targeting = invocation.targeting.is_some(),
            state = %ComposerState::Assembled,
            "job invocation assembled"
        );

        Ok(Self {
            invocation,
            principal,
            config: context.config.clone(),
        })
    }

    /// The assembled invocation.
    pub fn invocation(&self) -> &JobInvocation {
        &self.invocation
    }

    /// The principal the invocation is composed for.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Runs validation without saving.
    pub fn validate(&self) -> ValidationErrors {
        validation::validate(&self.invocation, &self.config)
    }

    /// Validates the graph and writes it in a single transaction.
    ///
    /// Consumes the composer: a rejected composition is retried by composing
    /// again.
    ///
    /// # Errors
    ///
    /// - [`ComposerError::NotSaved`] with every validation failure found;
    ///   nothing is written.
    /// - [`ComposerError::Store`] if the store fails; the transaction is
    ///   rolled back.
    pub fn save(mut self, store: &dyn InvocationStore) -> Result<JobInvocation, ComposerError> {
        let errors = self.validate();
        if !errors.is_empty() {
            tracing::warn!(
                correlation_id = %self.invocation.correlation_id,
                errors = errors.len(),
                state = %ComposerState::Rejected,
                "job invocation rejected"
            );
            return Err(ComposerError::NotSaved(errors));
        }

        self.invocation.created_at = Some(Utc::now());
        let mut tx = store.begin()?;
        if let Err(err) = write_graph(tx.as_mut(), &mut self.invocation) {
            tracing::warn!(
                correlation_id = %self.invocation.correlation_id,
                error = %err,
                "rolling back job invocation"
            );
            tx.rollback();
            return Err(err);
        }
        tx.commit()?;

        tracing::info!(
            correlation_id = %self.invocation.correlation_id,
            invocation_id = ?self.invocation.id,
            principal = %self.principal.login,
            state = %ComposerState::Saved,
            "job invocation saved"
        );
        Ok(self.invocation)
    }
}

fn resolve_targeting(
    context: &ComposerContext<'_>,
    principal: &Principal,
    params: &InvocationParams,
) -> Result<Option<Targeting>, ComposerError> {
    let Some(targeting_type) = params.targeting_type.as_deref() else {
        return Ok(None);
    };
    if targeting_type != STATIC_QUERY_TARGETING {
        tracing::debug!(targeting_type, "unrecognised targeting type, leaving targeting empty");
        return Ok(None);
    }

    let targeting = if let Some(bookmark_id) = params.bookmark_id {
        let bookmark = context.bookmarks.bookmark(bookmark_id)?;
        Targeting::with_bookmark(targeting_type, bookmark, principal.clone())
    } else if let Some(query) = &params.search_query {
        Targeting::with_search_query(targeting_type, query.clone(), principal.clone())
    } else {
        Targeting::empty(targeting_type, principal.clone())
    };
    Ok(Some(targeting))
}

fn resolve_templates(
    context: &ComposerContext<'_>,
    params: &InvocationParams,
) -> Result<Vec<JobTemplate>, ComposerError> {
    let job_name = requested_job_name(params);
    let ids = params.requested_template_ids();
    if ids.is_empty() {
        return match job_name {
            Some(job_name) => Ok(vec![context.templates.template_by_job_name(job_name)?]),
            None => Ok(Vec::new()),
        };
    }

    let mut templates = Vec::with_capacity(ids.len());
    for id in ids {
        let template = context.templates.template(id)?;
        if let Some(job_name) = job_name {
            if !template.has_job_name(job_name) {
                tracing::warn!(
                    template_id = %id,
                    job_name,
                    template_job_name = %template.job_name,
                    "template does not belong to requested job name"
                );
                return Err(CatalogError::TemplateNotFoundByJobName {
                    job_name: job_name.to_string(),
                }
                .into());
            }
        }
        templates.push(template);
    }
    Ok(templates)
}

/// The requested job name, trimmed; `None` when absent or blank.
fn requested_job_name(params: &InvocationParams) -> Option<&str> {
    params
        .job_name
        .as_deref()
        .map(str::trim)
        .filter(|job_name| !job_name.is_empty())
}

fn bind_inputs(template: JobTemplate, params: &InvocationParams) -> TemplateInvocation {
    let mut template_invocation = TemplateInvocation::new(template);
    for input in &params.inputs {
        if !template_invocation.bind(&input.name, input.value.clone()) {
            tracing::debug!(
                template = %template_invocation.template.name,
                input = %input.name,
                "ignoring input not declared by template"
            );
        }
    }
    template_invocation
}

/// Expands `%{...}` placeholders in a description format.
///
/// `%{job_name}` and `%{template_name}` expand to the invocation's job name
/// and first template name; any other key expands to the first template's
/// bound value for the input of that name (ignoring case). Unknown keys are
/// kept verbatim.
pub fn render_description(format: &str, invocation: &JobInvocation) -> String {
    let mut rendered = String::with_capacity(format.len());
    let mut rest = format;

    while let Some(start) = rest.find("%{") {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            rest = &rest[start..];
            break;
        };
        let key = &after[..end];
        match placeholder_value(key, invocation) {
            Some(value) => rendered.push_str(value),
            None => rendered.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    rendered.push_str(rest);
    rendered
}

fn placeholder_value<'a>(key: &str, invocation: &'a JobInvocation) -> Option<&'a str> {
    match key {
        JOB_NAME_PLACEHOLDER => Some(invocation.job_name.as_deref().unwrap_or_default()),
        TEMPLATE_NAME_PLACEHOLDER => Some(invocation.template().map_or("", |t| t.name.as_str())),
        input => invocation
            .template_invocations
            .first()
            .and_then(|ti| ti.value_of(input)),
    }
}

fn write_graph(tx: &mut dyn Transaction, invocation: &mut JobInvocation) -> Result<(), ComposerError> {
    let invocation_id = tx.insert_invocation(invocation)?;
    invocation.id = Some(invocation_id);

    if let Some(targeting) = invocation.targeting.as_mut() {
        targeting.id = Some(tx.insert_targeting(invocation_id, targeting)?);
    }

    for template_invocation in &mut invocation.template_invocations {
        let template_invocation_id = tx.insert_template_invocation(invocation_id, template_invocation)?;
        template_invocation.id = Some(template_invocation_id);
        for input_value in &mut template_invocation.input_values {
            input_value.id = Some(tx.insert_input_value(template_invocation_id, input_value)?);
        }
    }
    Ok(())
}
