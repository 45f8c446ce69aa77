//! Salvaging structured results from model output.
//!
//! Evaluation models are asked for strict JSON but routinely wrap it in
//! Markdown fences or commentary. These helpers dig the first JSON object
//! out of a response and derive the grade string recorded on the essay.

use std::sync::OnceLock;

use regex::Regex;

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fence pattern is valid")
    })
}

fn trailing_comma_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r",\s*([\]}])").expect("comma pattern is valid"))
}

/// Extracts and parses the first JSON object found in a string.
///
/// Tries a fenced ```json block first, then falls back to the outermost
/// brace pair. A final pass strips trailing commas, a common model slip.
pub fn extract_json_from_text(text: &str) -> Option<serde_json::Value> {
    if text.is_empty() {
        return None;
    }

    let candidate: &str = if let Some(captures) = fence_pattern().captures(text) {
        captures.get(1).map(|m| m.as_str())?
    } else {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end <= start {
            return None;
        }
        text[start..=end].trim()
    };

    match serde_json::from_str(candidate) {
        Ok(value) => Some(value),
        Err(_) => {
            let repaired = trailing_comma_pattern().replace_all(candidate, "$1");
            serde_json::from_str(&repaired).ok()
        }
    }
}

/// The grade string recorded on an essay: `score`, else `overall_score`,
/// rendered as text. Absent or null fields yield `None`.
pub fn derive_grade(evaluation: &serde_json::Value) -> Option<String> {
    let value = evaluation
        .get("score")
        .filter(|v| !v.is_null())
        .or_else(|| evaluation.get("overall_score").filter(|v| !v.is_null()))?;

    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_from_json_fence() {
        let text = "Here is the evaluation:\n```json\n{\"score\": \"A\", \"feedback\": \"Good\"}\n```\nDone.";
        let value = extract_json_from_text(text).unwrap();
        assert_eq!(value["score"], "A");
    }

    #[test]
    fn test_extract_from_plain_fence() {
        let text = "```\n{\"score\": 4}\n```";
        let value = extract_json_from_text(text).unwrap();
        assert_eq!(value["score"], 4);
    }

    #[test]
    fn test_extract_from_bare_braces_with_noise() {
        let text = "The result is {\"score\": 3, \"feedback\": \"ok\"} as requested.";
        let value = extract_json_from_text(text).unwrap();
        assert_eq!(value["feedback"], "ok");
    }

    #[test]
    fn test_extract_repairs_trailing_comma() {
        let text = r#"{"score": "B", "notes": ["solid", "brief",],}"#;
        let value = extract_json_from_text(text).unwrap();
        assert_eq!(value["score"], "B");
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert!(extract_json_from_text("").is_none());
        assert!(extract_json_from_text("no json here").is_none());
        assert!(extract_json_from_text("} backwards {").is_none());
    }

    #[test]
    fn test_derive_grade_prefers_score() {
        let value = json!({"score": "A-", "overall_score": 91});
        assert_eq!(derive_grade(&value).as_deref(), Some("A-"));
    }

    #[test]
    fn test_derive_grade_falls_back_to_overall_score() {
        let value = json!({"overall_score": 87.5});
        assert_eq!(derive_grade(&value).as_deref(), Some("87.5"));
    }

    #[test]
    fn test_derive_grade_renders_numbers_as_text() {
        let value = json!({"score": 5});
        assert_eq!(derive_grade(&value).as_deref(), Some("5"));
    }

    #[test]
    fn test_derive_grade_missing_or_null() {
        assert_eq!(derive_grade(&json!({"feedback": "fine"})), None);
        assert_eq!(derive_grade(&json!({"score": null})), None);
    }
}
