//! Integration tests for composing and saving job invocations.
//!
//! Every test drives the public API end to end: an [`InMemoryCatalog`]
//! supplies templates and bookmarks, an [`InMemoryStore`] receives the
//! graph. Organized into module blocks per concern.

use invocation_composer::catalog::{CatalogError, InMemoryCatalog};
use invocation_composer::composer::{ComposerContext, InvocationComposer};
use invocation_composer::config::ComposerConfig;
use invocation_composer::domain::{
    Bookmark, BookmarkId, JobInvocation, JobTemplate, Principal, PrincipalId, TemplateId,
    TemplateInput,
};
use invocation_composer::store::{InMemoryStore, StoreError};
use invocation_composer::types::{ConcurrencyControlParams, InputParam, InvocationParams};
use invocation_composer::ComposerError;

const TESTING1: TemplateId = TemplateId(1);
const TESTING2: TemplateId = TemplateId(2);
const BOOKMARK: BookmarkId = BookmarkId(10);

/// Two templates sharing a job name and one saved search.
fn test_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_template(
            JobTemplate::new(TESTING1, "testing1", "Testing")
                .with_input(TemplateInput::required("Package"))
                .with_input(TemplateInput::optional("Version")),
        )
        .with_template(
            JobTemplate::new(TESTING2, "testing2", "Testing")
                .with_input(TemplateInput::required("A"))
                .with_input(TemplateInput::required("B")),
        )
        .with_bookmark(Bookmark::new(BOOKMARK, "web servers", "name ~ web*").with_public(true))
}

fn admin() -> Principal {
    Principal::new(PrincipalId(1), "admin")
}

fn compose(catalog: &InMemoryCatalog, params: &InvocationParams) -> Result<InvocationComposer, ComposerError> {
    let context = ComposerContext::new(catalog, catalog);
    InvocationComposer::compose(&context, JobInvocation::new(), admin(), params)
}

fn query_params() -> InvocationParams {
    InvocationParams::new()
        .with_template_id(TESTING1)
        .with_targeting_type("static_query")
        .with_search_query("name = example.com")
        .with_input(InputParam::new("package", "nginx"))
}

// ─── Targeting ──────────────────────────────────────────────────────────────

mod targeting_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bookmark_targeting_records_bookmark_and_user() {
        let catalog = test_catalog();
        let params = InvocationParams::new()
            .with_template_id(TESTING1)
            .with_targeting_type("static_query")
            .with_bookmark_id(BOOKMARK)
            .with_input(InputParam::new("package", "nginx"));

        let composer = compose(&catalog, &params).unwrap();
        let targeting = composer.invocation().targeting.as_ref().unwrap();
        assert_eq!(targeting.bookmark.as_ref().map(|b| b.id), Some(BOOKMARK));
        assert_eq!(targeting.user, admin());
        assert_eq!(targeting.resolved_query(), Some("name ~ web*"));

        let store = InMemoryStore::new();
        let saved = composer.save(&store).unwrap();
        let row = store.targeting_for(saved.id.unwrap()).unwrap();
        assert_eq!(row.bookmark_id, Some(BOOKMARK));
        assert_eq!(row.user_id, PrincipalId(1));
    }

    #[test]
    fn test_search_query_is_kept_verbatim() {
        let catalog = test_catalog();
        let params = query_params().with_search_query("  name ~ DB*  ");

        let composer = compose(&catalog, &params).unwrap();
        let targeting = composer.invocation().targeting.as_ref().unwrap();
        assert_eq!(targeting.search_query.as_deref(), Some("  name ~ DB*  "));
        assert!(targeting.bookmark.is_none());
        assert_eq!(targeting.user, admin());
    }

    #[test]
    fn test_missing_targeting_type_is_rejected_at_save() {
        let catalog = test_catalog();
        let mut params = query_params();
        params.targeting_type = None;

        let composer = compose(&catalog, &params).unwrap();
        assert!(composer.invocation().targeting.is_none());

        let store = InMemoryStore::new();
        let err = composer.save(&store).unwrap_err();
        assert!(err.is_not_saved());
        assert_eq!(err.to_string(), "Targeting can't be blank");
        assert!(store.counts().is_empty());
    }

    #[test]
    fn test_unknown_targeting_type_leaves_targeting_empty() {
        let catalog = test_catalog();
        let params = query_params().with_targeting_type("dynamic_query");

        let composer = compose(&catalog, &params).unwrap();
        assert!(composer.invocation().targeting.is_none());
    }

    #[test]
    fn test_bookmark_and_query_together_abort_composition() {
        let catalog = test_catalog();
        let params = query_params().with_bookmark_id(BOOKMARK);

        let err = compose(&catalog, &params).unwrap_err();
        assert!(err.is_configuration_conflict());
        assert_eq!(
            err.to_string(),
            "Configuration conflict: Please specify either a bookmark or a search query, not both"
        );
    }

    #[test]
    fn test_bookmark_and_query_without_targeting_type_is_not_a_conflict() {
        let catalog = test_catalog();
        let mut params = query_params().with_bookmark_id(BOOKMARK);
        params.targeting_type = None;

        assert!(compose(&catalog, &params).is_ok());
    }

    #[test]
    fn test_static_query_without_selection_is_rejected() {
        let catalog = test_catalog();
        let mut params = query_params();
        params.search_query = None;

        let composer = compose(&catalog, &params).unwrap();
        let err = composer.save(&InMemoryStore::new()).unwrap_err();
        assert_eq!(err.to_string(), "Targeting: Search query can't be blank");
    }

    #[test]
    fn test_overlong_query_is_rejected() {
        let catalog = test_catalog();
        let context = ComposerContext::new(&catalog, &catalog)
            .with_config(ComposerConfig::default().with_max_search_query_length(5));
        let composer =
            InvocationComposer::compose(&context, JobInvocation::new(), admin(), &query_params())
                .unwrap();

        let err = composer.save(&InMemoryStore::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Targeting: Search query is too long (maximum is 5 characters)"
        );
    }

    #[test]
    fn test_unknown_bookmark_propagates_catalog_error() {
        let catalog = test_catalog();
        let mut params = query_params().with_bookmark_id(BookmarkId(99));
        params.search_query = None;

        let err = compose(&catalog, &params).unwrap_err();
        assert!(matches!(
            err,
            ComposerError::Catalog(CatalogError::BookmarkNotFound { bookmark_id }) if bookmark_id == BookmarkId(99)
        ));
    }
}

// ─── Inputs ─────────────────────────────────────────────────────────────────

mod input_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_declared_inputs_are_persisted() {
        let catalog = test_catalog();
        let params = query_params()
            .with_input(InputParam::new("VERSION", "1.2"))
            .with_input(InputParam::new("undeclared", "ignored"));

        let store = InMemoryStore::new();
        let saved = compose(&catalog, &params).unwrap().save(&store).unwrap();

        let ti = &saved.template_invocations[0];
        assert_eq!(ti.input_values.len(), 2);
        assert_eq!(ti.value_of("package"), Some("nginx"));
        assert_eq!(ti.value_of("version"), Some("1.2"));
        assert_eq!(store.counts().input_values, 2);

        let rows = store.input_values_for(ti.id.unwrap());
        let names: Vec<&str> = rows.iter().map(|row| row.input_name.as_str()).collect();
        assert_eq!(names, vec!["Package", "Version"]);
    }

    #[test]
    fn test_input_without_value_is_blank_even_when_optional() {
        let catalog = test_catalog();
        let params = query_params().with_input(InputParam::without_value("Version"));

        let err = compose(&catalog, &params)
            .unwrap()
            .save(&InMemoryStore::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Template testing1: Input version: Value can't be blank"
        );
    }

    #[test]
    fn test_empty_value_is_accepted_for_optional_input() {
        let catalog = test_catalog();
        let params = query_params().with_input(InputParam::new("version", ""));

        let saved = compose(&catalog, &params)
            .unwrap()
            .save(&InMemoryStore::new())
            .unwrap();
        assert_eq!(saved.template_invocations[0].value_of("version"), Some(""));
    }

    #[test]
    fn test_empty_value_is_blank_for_required_input() {
        let catalog = test_catalog();
        let mut params = query_params();
        params.inputs = vec![InputParam::new("package", "   ")];

        let err = compose(&catalog, &params)
            .unwrap()
            .save(&InMemoryStore::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Template testing1: Input package: Value can't be blank"
        );
    }

    #[test]
    fn test_missing_required_input_is_listed() {
        let catalog = test_catalog();
        let mut params = query_params();
        params.inputs.clear();

        let err = compose(&catalog, &params)
            .unwrap()
            .save(&InMemoryStore::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Template testing1: Not all required inputs have values. Missing inputs: Package"
        );
    }

    #[test]
    fn test_all_missing_required_inputs_are_listed() {
        let catalog = test_catalog();
        let mut params = query_params();
        params.template_id = Some(TESTING2);
        params.inputs.clear();

        let err = compose(&catalog, &params)
            .unwrap()
            .save(&InMemoryStore::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Template testing2: Not all required inputs have values. Missing inputs: A, B"
        );
    }

    #[test]
    fn test_later_binding_replaces_earlier() {
        let catalog = test_catalog();
        let params = query_params().with_input(InputParam::new("PACKAGE", "httpd"));

        let composer = compose(&catalog, &params).unwrap();
        let ti = &composer.invocation().template_invocations[0];
        assert_eq!(ti.input_values.len(), 1);
        assert_eq!(ti.value_of("package"), Some("httpd"));
    }
}

// ─── Templates ──────────────────────────────────────────────────────────────

mod template_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_job_name_defaults_to_template_job_name() {
        let catalog = test_catalog();
        let composer = compose(&catalog, &query_params()).unwrap();
        assert_eq!(composer.invocation().job_name.as_deref(), Some("Testing"));
    }

    #[test]
    fn test_blank_job_name_falls_back_to_template_job_name() {
        let catalog = test_catalog();
        let params = query_params().with_job_name("   ");

        let saved = compose(&catalog, &params)
            .unwrap()
            .save(&InMemoryStore::new())
            .unwrap();
        assert_eq!(saved.job_name.as_deref(), Some("Testing"));
    }

    #[test]
    fn test_job_name_matching_template_is_kept() {
        let catalog = test_catalog();
        let params = query_params().with_job_name("TESTING");

        let composer = compose(&catalog, &params).unwrap();
        assert_eq!(composer.invocation().job_name.as_deref(), Some("TESTING"));
    }

    #[test]
    fn test_job_name_unknown_to_template_is_not_found() {
        let catalog = test_catalog();
        let params = query_params().with_job_name("no such job");

        let err = compose(&catalog, &params).unwrap_err();
        assert!(matches!(
            &err,
            ComposerError::Catalog(CatalogError::TemplateNotFoundByJobName { job_name }) if job_name == "no such job"
        ));
        assert_eq!(
            err.to_string(),
            "no job template found for job name 'no such job'"
        );
    }

    #[test]
    fn test_template_is_found_by_job_name() {
        let catalog = test_catalog();
        let mut params = query_params().with_job_name("testing");
        params.template_id = None;

        let composer = compose(&catalog, &params).unwrap();
        assert_eq!(composer.invocation().template().map(|t| t.id), Some(TESTING1));
        assert_eq!(composer.invocation().job_name.as_deref(), Some("testing"));
    }

    #[test]
    fn test_no_template_is_rejected() {
        let catalog = test_catalog();
        let mut params = query_params();
        params.template_id = None;

        let err = compose(&catalog, &params)
            .unwrap()
            .save(&InMemoryStore::new())
            .unwrap_err();
        assert_eq!(
            err.validation_errors().unwrap().messages(),
            vec!["Job name can't be blank", "Job template can't be blank"]
        );
    }

    #[test]
    fn test_unknown_template_propagates_catalog_error() {
        let catalog = test_catalog();
        let params = query_params().with_template_id(TemplateId(42));

        let err = compose(&catalog, &params).unwrap_err();
        assert_eq!(err.to_string(), "job template not found: 42");
    }

    #[test]
    fn test_errors_across_templates_are_combined() {
        let catalog = test_catalog();
        let mut params = query_params().with_additional_template(TESTING2);
        params.targeting_type = None;
        params.inputs = vec![InputParam::without_value("package"), InputParam::new("a", "1")];

        let err = compose(&catalog, &params)
            .unwrap()
            .save(&InMemoryStore::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            [
                "Targeting can't be blank",
                "Template testing1: Input package: Value can't be blank",
                "Template testing2: Not all required inputs have values. Missing inputs: B",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_multiple_templates_are_persisted() {
        let catalog = test_catalog();
        let params = query_params()
            .with_additional_template(TESTING2)
            .with_input(InputParam::new("a", "1"))
            .with_input(InputParam::new("b", "2"));

        let store = InMemoryStore::new();
        let saved = compose(&catalog, &params).unwrap().save(&store).unwrap();
        assert_eq!(saved.template_invocations.len(), 2);
        assert_eq!(store.template_invocations_for(saved.id.unwrap()).len(), 2);
        assert_eq!(store.counts().input_values, 3);
        assert!(saved.template_invocation_for(TESTING2).is_some());
    }
}

// ─── Persistence ────────────────────────────────────────────────────────────

mod save_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_save_assigns_ids_and_timestamp() {
        let catalog = test_catalog();
        let store = InMemoryStore::new();
        let saved = compose(&catalog, &query_params()).unwrap().save(&store).unwrap();

        assert!(!saved.is_new_record());
        assert!(saved.created_at.is_some());
        assert!(saved.targeting.as_ref().unwrap().id.is_some());
        let ti = &saved.template_invocations[0];
        assert!(ti.id.is_some());
        assert!(ti.input_values.iter().all(|value| value.id.is_some()));

        let row = store.invocation(saved.id.unwrap()).unwrap();
        assert_eq!(row.correlation_id, saved.correlation_id);
        assert_eq!(row.job_name.as_deref(), Some("Testing"));
    }

    #[test]
    fn test_store_failure_rolls_back_everything() {
        let catalog = test_catalog();
        let store = InMemoryStore::new().with_max_invocations(0);

        let err = compose(&catalog, &query_params()).unwrap().save(&store).unwrap_err();
        assert!(matches!(
            err,
            ComposerError::Store(StoreError::CapacityExceeded { .. })
        ));
        assert!(store.counts().is_empty());
    }

    #[test]
    fn test_rejected_save_writes_nothing() {
        let catalog = test_catalog();
        let store = InMemoryStore::new();
        let mut params = query_params();
        params.inputs.clear();

        assert!(compose(&catalog, &params).unwrap().save(&store).is_err());
        assert!(store.counts().is_empty());
    }

    #[test]
    fn test_validate_does_not_save() {
        let catalog = test_catalog();
        let composer = compose(&catalog, &query_params()).unwrap();
        assert!(composer.validate().is_empty());
        assert!(composer.invocation().is_new_record());
    }
}

// ─── Settings ───────────────────────────────────────────────────────────────

mod settings_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(None, "testing1")]
    #[case(Some("%{job_name} - %{package}"), "Testing - nginx")]
    #[case(Some("Install %{Package} (%{unknown})"), "Install nginx (%{unknown})")]
    fn test_description_rendering(#[case] format: Option<&str>, #[case] expected: &str) {
        let catalog = test_catalog();
        let mut params = query_params();
        params.description_format = format.map(str::to_string);

        let composer = compose(&catalog, &params).unwrap();
        assert_eq!(composer.invocation().description.as_deref(), Some(expected));
    }

    #[test]
    fn test_configured_description_format_is_default() {
        let catalog = test_catalog();
        let context = ComposerContext::new(&catalog, &catalog)
            .with_config(ComposerConfig::default().with_description_format("Run %{template_name}"));
        let composer =
            InvocationComposer::compose(&context, JobInvocation::new(), admin(), &query_params())
                .unwrap();
        assert_eq!(composer.invocation().description.as_deref(), Some("Run testing1"));
    }

    #[rstest]
    #[case(Some(0), None, None, "Concurrency level must be greater than 0")]
    #[case(None, Some(0), None, "Time span must be greater than 0")]
    #[case(None, None, Some(0), "Execution timeout interval must be greater than 0")]
    fn test_zero_settings_are_rejected(
        #[case] level: Option<u32>,
        #[case] time_span: Option<u64>,
        #[case] timeout: Option<u64>,
        #[case] message: &str,
    ) {
        let catalog = test_catalog();
        let mut params =
            query_params().with_concurrency_control(ConcurrencyControlParams { level, time_span });
        params.execution_timeout_interval = timeout;

        let err = compose(&catalog, &params)
            .unwrap()
            .save(&InMemoryStore::new())
            .unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_settings_are_persisted() {
        let catalog = test_catalog();
        let params = query_params()
            .with_concurrency_control(ConcurrencyControlParams {
                level: Some(5),
                time_span: Some(60),
            })
            .with_execution_timeout_interval(300);

        let store = InMemoryStore::new();
        let saved = compose(&catalog, &params).unwrap().save(&store).unwrap();
        let row = store.invocation(saved.id.unwrap()).unwrap();
        assert_eq!(row.concurrency_control.unwrap().level, Some(5));
        assert_eq!(row.execution_timeout_interval, Some(300));
    }

    #[test]
    fn test_configured_timeout_is_default() {
        let catalog = test_catalog();
        let context = ComposerContext::new(&catalog, &catalog)
            .with_config(ComposerConfig::default().with_execution_timeout_interval(120));
        let composer =
            InvocationComposer::compose(&context, JobInvocation::new(), admin(), &query_params())
                .unwrap();
        assert_eq!(composer.invocation().execution_timeout_interval, Some(120));
    }
}

// ─── JSON Parameters ────────────────────────────────────────────────────────

mod json_params_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_compose_from_json_params() {
        let catalog = test_catalog();
        let params = InvocationParams::from_value(json!({
            "template_id": 1,
            "targeting_type": "static_query",
            "bookmark_id": 10,
            "inputs": {"package": "vim", "version": ""}
        }))
        .unwrap();

        let store = InMemoryStore::new();
        let saved = compose(&catalog, &params).unwrap().save(&store).unwrap();
        assert_eq!(saved.template_invocations[0].value_of("package"), Some("vim"));
        assert_eq!(store.counts().input_values, 2);
    }

    #[test]
    fn test_malformed_json_params() {
        let err = InvocationParams::from_value(json!({"inputs": 7})).unwrap_err();
        assert!(err.to_string().starts_with("Invalid parameters:"));
    }
}
