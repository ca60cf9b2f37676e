//! Graph validation with error aggregation.
//!
//! [`validate`] walks a whole [`JobInvocation`] and records every problem as
//! a structured [`ValidationError`] (scope + kind). Nothing is rendered to
//! text until [`ValidationErrors`] is displayed, at which point each record
//! becomes one line:
//!
//! ```text
//! Targeting can't be blank
//! Template Install: Input package: Value can't be blank
//! Template Install: Not all required inputs have values. Missing inputs: version
//! ```

use std::fmt;

use crate::config::ComposerConfig;
use crate::constants::BLANK;
use crate::domain::{JobInvocation, Targeting, TemplateInvocation};

/// Which part of the invocation graph a failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationScope {
    /// The invocation itself.
    Invocation,
    /// The invocation's targeting.
    Targeting,
    /// A template invocation, named by its template.
    Template(String),
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationKind {
    /// The invocation has no targeting.
    MissingTargeting,
    /// Targeting has neither a bookmark nor a non-blank search query.
    MissingSelection,
    /// The ad-hoc query exceeds the configured length.
    SearchQueryTooLong {
        /// Configured maximum, in characters.
        max: usize,
    },
    /// No template was bound to the invocation.
    MissingTemplate,
    /// The invocation has no job name.
    MissingJobName,
    /// A bound input has a blank value it is not allowed to have.
    BlankValue {
        /// Lower-cased input name.
        input: String,
    },
    /// Required inputs received no binding at all.
    MissingInputs {
        /// Declared names of the missing inputs.
        inputs: Vec<String>,
    },
    /// A numeric setting is zero.
    NotPositive {
        /// Human-readable field name.
        field: &'static str,
    },
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTargeting => write!(f, "Targeting {BLANK}"),
            Self::MissingSelection => write!(f, "Search query {BLANK}"),
            Self::SearchQueryTooLong { max } => {
                write!(f, "Search query is too long (maximum is {max} characters)")
            },
            Self::MissingTemplate => write!(f, "Job template {BLANK}"),
            Self::MissingJobName => write!(f, "Job name {BLANK}"),
            Self::BlankValue { input } => write!(f, "Input {input}: Value {BLANK}"),
            Self::MissingInputs { inputs } => write!(
                f,
                "Not all required inputs have values. Missing inputs: {}",
                inputs.join(", ")
            ),
            Self::NotPositive { field } => write!(f, "{field} must be greater than 0"),
        }
    }
}

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Where the failure was found.
    pub scope: ValidationScope,
    /// What the failure is.
    pub kind: ValidationKind,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(scope: ValidationScope, kind: ValidationKind) -> Self {
        Self { scope, kind }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            ValidationScope::Invocation => write!(f, "{}", self.kind),
            ValidationScope::Targeting => write!(f, "Targeting: {}", self.kind),
            ValidationScope::Template(name) => write!(f, "Template {name}: {}", self.kind),
        }
    }
}

/// Every validation failure found in one pass, in discovery order.
///
/// # Examples
///
/// ```
/// use invocation_composer::validation::{
///     ValidationError, ValidationErrors, ValidationKind, ValidationScope,
/// };
///
/// let mut errors = ValidationErrors::new();
/// assert!(errors.is_empty());
///
/// errors.push(ValidationError::new(
///     ValidationScope::Template("Install".into()),
///     ValidationKind::MissingInputs { inputs: vec!["package".into()] },
/// ));
/// assert_eq!(
///     errors.to_string(),
///     "Template Install: Not all required inputs have values. Missing inputs: package"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates over the recorded failures.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// One rendered line per failure.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("\n"))
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Validates the whole invocation graph without stopping at the first
/// failure.
pub fn validate(invocation: &JobInvocation, config: &ComposerConfig) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if invocation
        .job_name
        .as_deref()
        .map_or(true, |name| name.trim().is_empty())
    {
        errors.push(ValidationError::new(
            ValidationScope::Invocation,
            ValidationKind::MissingJobName,
        ));
    }
    if invocation.template_invocations.is_empty() {
        errors.push(ValidationError::new(
            ValidationScope::Invocation,
            ValidationKind::MissingTemplate,
        ));
    }

    match &invocation.targeting {
        None => errors.push(ValidationError::new(
            ValidationScope::Invocation,
            ValidationKind::MissingTargeting,
        )),
        Some(targeting) => validate_targeting(targeting, config, &mut errors),
    }

    for template_invocation in &invocation.template_invocations {
        validate_template_invocation(template_invocation, &mut errors);
    }

    if let Some(control) = &invocation.concurrency_control {
        if control.level == Some(0) {
            errors.push(ValidationError::new(
                ValidationScope::Invocation,
                ValidationKind::NotPositive {
                    field: "Concurrency level",
                },
            ));
        }
        if control.time_span == Some(0) {
            errors.push(ValidationError::new(
                ValidationScope::Invocation,
                ValidationKind::NotPositive { field: "Time span" },
            ));
        }
    }
    if invocation.execution_timeout_interval == Some(0) {
        errors.push(ValidationError::new(
            ValidationScope::Invocation,
            ValidationKind::NotPositive {
                field: "Execution timeout interval",
            },
        ));
    }

    errors
}

fn validate_targeting(targeting: &Targeting, config: &ComposerConfig, errors: &mut ValidationErrors) {
    if !targeting.has_selection() {
        errors.push(ValidationError::new(
            ValidationScope::Targeting,
            ValidationKind::MissingSelection,
        ));
        return;
    }
    if let Some(query) = targeting.search_query.as_deref() {
        if query.chars().count() > config.max_search_query_length {
            errors.push(ValidationError::new(
                ValidationScope::Targeting,
                ValidationKind::SearchQueryTooLong {
                    max: config.max_search_query_length,
                },
            ));
        }
    }
}

fn validate_template_invocation(template_invocation: &TemplateInvocation, errors: &mut ValidationErrors) {
    let scope = ValidationScope::Template(template_invocation.template.name.clone());

    for value in &template_invocation.input_values {
        if value.violates_presence() {
            errors.push(ValidationError::new(
                scope.clone(),
                ValidationKind::BlankValue {
                    input: value.template_input.normalized_name(),
                },
            ));
        }
    }

    let missing: Vec<String> = template_invocation
        .missing_required_inputs()
        .into_iter()
        .map(|input| input.name.clone())
        .collect();
    if !missing.is_empty() {
        errors.push(ValidationError::new(
            scope,
            ValidationKind::MissingInputs { inputs: missing },
        ));
    }
}
