use serde_json::Value;

use crate::error::{GuardError, Result};

/// Strips a surrounding markdown code fence (```` ```json ```` or
/// ```` ``` ````) from model output.
pub fn strip_code_fence(content: &str) -> &str {
    let content = content.trim();
    if !content.ends_with("```") {
        return content;
    }
    for opener in ["```json", "```JSON", "```"] {
        if let Some(inner) = content.strip_prefix(opener) {
            return inner.strip_suffix("```").unwrap_or(inner).trim();
        }
    }
    content
}

/// Parses a raw plan response (possibly fenced) into a JSON value.
///
/// The shape is not checked here; the plan walker tolerates anything.
pub fn parse_plan_text(content: &str) -> Result<Value> {
    let content = strip_code_fence(content);
    if content.is_empty() {
        return Err(GuardError::EmptyResponse);
    }
    serde_json::from_str(content).map_err(|e| {
        tracing::debug!(error = %e, content, "failed to deserialize plan response");
        GuardError::PlanJson(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_json() {
        let value = parse_plan_text(r#" {"Day 1": {"Lunch": ["Rice: 60g"]}} "#).unwrap();
        assert_eq!(value, json!({"Day 1": {"Lunch": ["Rice: 60g"]}}));
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"Day 1\": {\"Snacks\": [\"Guava: 1 pc\"]}}\n```";
        let value = parse_plan_text(raw).unwrap();
        assert_eq!(value["Day 1"]["Snacks"][0], "Guava: 1 pc");

        let raw = "```\n[1, 2]\n```\n";
        assert_eq!(parse_plan_text(raw).unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_empty_after_stripping() {
        assert!(matches!(parse_plan_text("```json\n```"), Err(GuardError::EmptyResponse)));
        assert!(matches!(parse_plan_text("   "), Err(GuardError::EmptyResponse)));
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_plan_text("Here is your plan: {").unwrap_err();
        assert!(matches!(err, GuardError::PlanJson(_)));
    }

    #[test]
    fn test_unfenced_text_kept() {
        assert_eq!(strip_code_fence("  {\"a\": 1}\n"), "{\"a\": 1}");
    }
}
