//! Tests for workflow definitions and execution records.

use super::*;

#[test]
fn test_step_new_defaults() {
    let step = WorkflowStep::new("fetch", "http_get");
    assert_eq!(step.name, "fetch");
    assert_eq!(step.capability, "http_get");
    assert!(step.parameters.is_empty());
    assert!(step.depends_on.is_empty());
    assert!(step.condition.is_none());
    assert!(step.validation.is_none());
    assert_eq!(step.max_retries, 0);
    assert!(step.timeout_secs.is_none());
}

#[test]
fn test_step_builders() {
    let step = WorkflowStep::new("send", "sendmail")
        .with_description("Send the report")
        .with_parameter("to", serde_json::json!("ops@example.com"))
        .with_depends_on(["render"])
        .with_condition("results.render.status == \"success\"")
        .with_timeout(10)
        .with_max_retries(2)
        .with_validation(ValidationRules::new().expect_status("success"));

    assert_eq!(step.description, "Send the report");
    assert_eq!(step.parameters["to"], "ops@example.com");
    assert_eq!(step.depends_on, vec!["render".to_string()]);
    assert!(step.condition.is_some());
    assert_eq!(step.timeout_secs, Some(10));
    assert_eq!(step.max_retries, 2);
    assert_eq!(
        step.validation.unwrap().expected_status.as_deref(),
        Some("success")
    );
}

#[test]
fn test_validation_rules_builders() {
    let rules = ValidationRules::new()
        .require_fields(["status", "data"])
        .expect_status("success");
    assert_eq!(rules.required_fields, vec!["status", "data"]);
    assert_eq!(rules.expected_status.as_deref(), Some("success"));
}

#[test]
fn test_definition_step_lookup() {
    let definition = WorkflowDefinition::new(
        "pipeline",
        vec![
            WorkflowStep::new("a", "noop"),
            WorkflowStep::new("b", "noop"),
        ],
    );
    assert!(definition.step("a").is_some());
    assert!(definition.step("missing").is_none());
}

#[test]
fn test_execution_new_is_pending() {
    let execution = WorkflowExecution::new("pipeline-1", "pipeline", serde_json::json!({}));
    assert_eq!(execution.status, ExecutionStatus::Pending);
    assert!(execution.results.is_empty());
    assert!(execution.errors.is_empty());
    assert!(execution.started_at.is_none());
    assert!(execution.ended_at.is_none());
}

#[test]
fn test_status_terminal() {
    assert!(!ExecutionStatus::Pending.is_terminal());
    assert!(!ExecutionStatus::Running.is_terminal());
    assert!(ExecutionStatus::Completed.is_terminal());
    assert!(ExecutionStatus::Failed.is_terminal());
    assert!(ExecutionStatus::Cancelled.is_terminal());
}

#[test]
fn test_status_serializes_lowercase() {
    let json = serde_json::to_value(ExecutionStatus::Running).unwrap();
    assert_eq!(json, serde_json::json!("running"));
    let json = serde_json::to_value(ExecutionStatus::Cancelled).unwrap();
    assert_eq!(json, serde_json::json!("cancelled"));
}

#[test]
fn test_step_round_trips_through_json() {
    let step = WorkflowStep::new("count", "count_r")
        .with_parameter("word", serde_json::json!("{{ fetch.word }}"))
        .with_depends_on(["fetch"]);

    let json = serde_json::to_string(&step).unwrap();
    let back: WorkflowStep = serde_json::from_str(&json).unwrap();
    assert_eq!(back.name, "count");
    assert_eq!(back.parameters["word"], "{{ fetch.word }}");
    assert_eq!(back.depends_on, vec!["fetch".to_string()]);
}
