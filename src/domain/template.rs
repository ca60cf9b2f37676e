//! Job templates and their declared inputs.
//!
//! Templates are owned by the template catalog; the composer only reads
//! them. Input lookup is case-insensitive: names are compared after
//! [`normalize_name`].

use serde::{Deserialize, Serialize};

use super::ids::TemplateId;

/// Normalizes an input name for matching and for error messages.
///
/// # Examples
///
/// ```
/// use invocation_composer::domain::normalize_name;
///
/// assert_eq!(normalize_name("Package Name"), "package name");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase()
}

/// A named parameter declared by a job template.
///
/// # Examples
///
/// ```
/// use invocation_composer::domain::TemplateInput;
///
/// let input = TemplateInput::required("Package");
/// assert!(input.required);
/// assert!(input.matches("package"));
/// assert!(!TemplateInput::optional("force").required);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInput {
    /// Input name as declared on the template.
    pub name: String,
    /// Whether every invocation must supply a non-blank value.
    #[serde(default)]
    pub required: bool,
    /// Free-form description shown to users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TemplateInput {
    /// Declares a required input.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            description: None,
        }
    }

    /// Declares an optional input.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            description: None,
        }
    }

    /// Attaches a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The lower-cased input name.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Returns `true` if `name` refers to this input, ignoring case.
    pub fn matches(&self, name: &str) -> bool {
        self.normalized_name() == normalize_name(name)
    }
}

/// A job template: a named, reusable job definition with declared inputs.
///
/// # Examples
///
/// ```
/// use invocation_composer::domain::{JobTemplate, TemplateId, TemplateInput};
///
/// let template = JobTemplate::new(TemplateId(1), "Install package", "Packages")
///     .with_input(TemplateInput::required("package"))
///     .with_input(TemplateInput::optional("version"));
///
/// assert!(template.input_named("PACKAGE").is_some());
/// assert_eq!(template.required_inputs().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTemplate {
    /// Identifier of the template.
    pub id: TemplateId,
    /// Template name, used to qualify validation messages.
    pub name: String,
    /// Job name (category) the template is registered under.
    pub job_name: String,
    /// Declared inputs, in declaration order.
    #[serde(default)]
    pub inputs: Vec<TemplateInput>,
}

impl JobTemplate {
    /// Creates a template without inputs.
    pub fn new(id: TemplateId, name: impl Into<String>, job_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            job_name: job_name.into(),
            inputs: Vec::new(),
        }
    }

    /// Declares an input (chainable).
    #[must_use]
    pub fn with_input(mut self, input: TemplateInput) -> Self {
        self.inputs.push(input);
        self
    }

    /// Looks up a declared input by name, ignoring case.
    pub fn input_named(&self, name: &str) -> Option<&TemplateInput> {
        let wanted = normalize_name(name);
        self.inputs
            .iter()
            .find(|input| input.normalized_name() == wanted)
    }

    /// Returns `true` if this template belongs to `job_name`, ignoring case.
    ///
    /// Uses the same normalization as input names.
    pub fn has_job_name(&self, job_name: &str) -> bool {
        normalize_name(&self.job_name) == normalize_name(job_name)
    }

    /// Iterates over the inputs flagged as required.
    pub fn required_inputs(&self) -> impl Iterator<Item = &TemplateInput> {
        self.inputs.iter().filter(|input| input.required)
    }
}
