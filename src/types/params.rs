//! The request parameter bag.
//!
//! [`InvocationParams`] is the untyped request shape the composer accepts,
//! usually decoded from JSON. Every field is optional; the composer decides
//! what a missing field means.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{BookmarkId, TemplateId};
use crate::error::ComposerError;

/// One `{name, value}` input binding.
///
/// `value` may be absent entirely, which is distinct from an empty string.
///
/// # Examples
///
/// ```
/// use invocation_composer::types::InputParam;
///
/// let input: InputParam = serde_json::from_str(r#"{"name": "package"}"#).unwrap();
/// assert_eq!(input.name, "package");
/// assert!(input.value.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputParam {
    /// Input name; matched case-insensitively.
    pub name: String,
    /// Supplied value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl InputParam {
    /// A binding with a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// A binding that names the input but carries no value.
    pub fn without_value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Requested concurrency limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrencyControlParams {
    /// Maximum number of hosts running at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Seconds over which the run is spread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_span: Option<u64>,
}

/// Parameters describing one job invocation request.
///
/// `inputs` accepts either a list of `{name, value}` objects or a plain
/// `{name: value}` map.
///
/// # Examples
///
/// ```
/// use invocation_composer::types::InvocationParams;
/// use serde_json::json;
///
/// let params = InvocationParams::from_value(json!({
///     "job_name": "Commands",
///     "template_id": 4,
///     "targeting_type": "static_query",
///     "search_query": "name ~ web*",
///     "inputs": [{"name": "command", "value": "uptime"}]
/// }))
/// .unwrap();
/// assert_eq!(params.inputs.len(), 1);
///
/// let same = InvocationParams::from_value(json!({
///     "inputs": {"command": "uptime"}
/// }))
/// .unwrap();
/// assert_eq!(same.inputs, params.inputs);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationParams {
    /// Job name (category) used to find a template when no id is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_name: Option<String>,

    /// The template to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<TemplateId>,

    /// Further templates to bind to the same invocation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_ids: Vec<TemplateId>,

    /// Must be `"static_query"` for targeting to be built.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targeting_type: Option<String>,

    /// Saved search to target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark_id: Option<BookmarkId>,

    /// Ad-hoc query to target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,

    /// Input bindings, applied to every bound template.
    #[serde(
        default,
        deserialize_with = "deserialize_inputs",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub inputs: Vec<InputParam>,

    /// Description format, overriding the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_format: Option<String>,

    /// Concurrency limits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency_control: Option<ConcurrencyControlParams>,

    /// Execution timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_timeout_interval: Option<u64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InputsRepr {
    List(Vec<InputParam>),
    Map(IndexMap<String, Option<String>>),
}

fn deserialize_inputs<'de, D>(deserializer: D) -> Result<Vec<InputParam>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<InputsRepr>::deserialize(deserializer)?;
    Ok(match repr {
        None => Vec::new(),
        Some(InputsRepr::List(list)) => list,
        Some(InputsRepr::Map(map)) => map
            .into_iter()
            .map(|(name, value)| InputParam { name, value })
            .collect(),
    })
}

impl InvocationParams {
    /// Creates an empty parameter bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a parameter bag from JSON.
    ///
    /// # Errors
    ///
    /// [`ComposerError::InvalidParams`] if a field has the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, ComposerError> {
        serde_json::from_value(value).map_err(Into::into)
    }

    /// Every requested template id, `template_id` first, without duplicates.
    pub fn requested_template_ids(&self) -> Vec<TemplateId> {
        let mut ids: Vec<TemplateId> = Vec::with_capacity(1 + self.template_ids.len());
        for id in self.template_id.iter().chain(self.template_ids.iter()) {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }

    /// Set the job name.
    #[must_use]
    pub fn with_job_name(mut self, job_name: impl Into<String>) -> Self {
        self.job_name = Some(job_name.into());
        self
    }

    /// Set the template id.
    #[must_use]
    pub fn with_template_id(mut self, id: TemplateId) -> Self {
        self.template_id = Some(id);
        self
    }

    /// Add a further template id.
    #[must_use]
    pub fn with_additional_template(mut self, id: TemplateId) -> Self {
        self.template_ids.push(id);
        self
    }

    /// Set the targeting type literal.
    #[must_use]
    pub fn with_targeting_type(mut self, targeting_type: impl Into<String>) -> Self {
        self.targeting_type = Some(targeting_type.into());
        self
    }

    /// Target a saved search.
    #[must_use]
    pub fn with_bookmark_id(mut self, id: BookmarkId) -> Self {
        self.bookmark_id = Some(id);
        self
    }

    /// Target an ad-hoc query.
    #[must_use]
    pub fn with_search_query(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    /// Add an input binding.
    #[must_use]
    pub fn with_input(mut self, input: InputParam) -> Self {
        self.inputs.push(input);
        self
    }

    /// Set the description format.
    #[must_use]
    pub fn with_description_format(mut self, format: impl Into<String>) -> Self {
        self.description_format = Some(format.into());
        self
    }

    /// Set the concurrency limits.
    #[must_use]
    pub fn with_concurrency_control(mut self, control: ConcurrencyControlParams) -> Self {
        self.concurrency_control = Some(control);
        self
    }

    /// Set the execution timeout in seconds.
    #[must_use]
    pub fn with_execution_timeout_interval(mut self, secs: u64) -> Self {
        self.execution_timeout_interval = Some(secs);
        self
    }
}
