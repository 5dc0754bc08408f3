//! Step result validation.

use serde_json::Value;

use crate::definition::ValidationRules;

/// Check a result record against a step's declared rules.
///
/// Rules are checked independently; the first violation is returned as the
/// failure reason. Absent rules always validate.
pub(crate) fn validate_result(result: &Value, rules: &ValidationRules) -> Result<(), String> {
    for field in &rules.required_fields {
        if result.get(field).is_none() {
            return Err(format!("missing required field '{field}'"));
        }
    }

    if let Some(expected) = &rules.expected_status {
        let actual = result.get("status").and_then(Value::as_str);
        if actual != Some(expected.as_str()) {
            return Err(format!(
                "expected status '{expected}', got '{}'",
                actual.unwrap_or("<none>")
            ));
        }
    }

    Ok(())
}
