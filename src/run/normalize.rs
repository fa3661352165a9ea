use serde_json::Value;

use super::types::{TestResult, TokenUsage};

/// Map a raw result payload into the canonical [`TestResult`].
///
/// Two source shapes exist: the live-test shape (canonical field names,
/// nested `token_usage`) and the persisted-storage shape (`is_correct`,
/// `answer_found`, flattened `prompt_tokens`/`completion_tokens`). Both
/// map here, and only here; downstream code never default-fills again.
///
/// Total: missing optional fields are substituted, never errors.
pub fn normalize(value: &Value) -> TestResult {
    let token_usage = match value.get("token_usage") {
        Some(usage) => TokenUsage {
            prompt: usage.get("prompt").and_then(Value::as_u64).unwrap_or(0),
            completion: usage.get("completion").and_then(Value::as_u64).unwrap_or(0),
        },
        None => TokenUsage {
            prompt: value.get("prompt_tokens").and_then(Value::as_u64).unwrap_or(0),
            completion: value
                .get("completion_tokens")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        },
    };

    TestResult {
        model_name: value
            .get("model_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        correct: value
            .get("correct")
            .or_else(|| value.get("is_correct"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        response_time: value
            .get("response_time")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        token_usage,
        answer: value
            .get("answer")
            .or_else(|| value.get("answer_found"))
            .and_then(Value::as_str)
            .map(String::from),
        score: value.get("score").and_then(Value::as_i64).unwrap_or(0) as i32,
        response_text: value
            .get("response_text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        timestamp: value
            .get("timestamp")
            .and_then(Value::as_str)
            .map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::score::ScoreTier;
    use serde_json::json;

    #[test]
    fn test_live_shape_passes_through() {
        let payload = json!({
            "model_name": "Model One",
            "correct": true,
            "response_time": 1.234,
            "token_usage": {"prompt": 100, "completion": 50},
            "answer": "42",
            "score": 87,
            "response_text": "ok"
        });
        let result = normalize(&payload);
        assert_eq!(result.model_name, "Model One");
        assert!(result.correct);
        assert_eq!(result.response_time, 1.234);
        assert_eq!(result.token_usage.total(), 150);
        assert_eq!(result.answer.as_deref(), Some("42"));
        assert_eq!(result.score, 87);
        assert_eq!(result.response_text, "ok");
    }

    #[test]
    fn test_storage_shape_renames_fields() {
        let payload = json!({
            "model_name": "Stored Model",
            "is_correct": true,
            "prompt_tokens": 10,
            "completion_tokens": 5,
            "score": 92,
            "answer_found": "42"
        });
        let result = normalize(&payload);
        assert!(result.correct);
        assert_eq!(result.token_usage.prompt, 10);
        assert_eq!(result.token_usage.completion, 5);
        assert_eq!(result.score, 92);
        assert_eq!(result.answer.as_deref(), Some("42"));
        assert_eq!(ScoreTier::of(result.score), ScoreTier::High);
    }

    #[test]
    fn test_empty_payload_defaults() {
        let result = normalize(&json!({}));
        assert_eq!(result.model_name, "");
        assert!(!result.correct);
        assert_eq!(result.response_time, 0.0);
        assert_eq!(result.token_usage.total(), 0);
        assert_eq!(result.answer, None);
        assert_eq!(result.score, 0);
        assert_eq!(result.response_text, "");
        assert_eq!(result.timestamp, None);
    }

    #[test]
    fn test_partial_token_usage_defaults() {
        let payload = json!({"token_usage": {"prompt": 7}});
        let result = normalize(&payload);
        assert_eq!(result.token_usage.prompt, 7);
        assert_eq!(result.token_usage.completion, 0);
    }

    #[test]
    fn test_null_answer_is_none() {
        let payload = json!({"answer": null, "correct": true});
        assert_eq!(normalize(&payload).answer, None);
    }

    #[test]
    fn test_timestamp_passes_through() {
        let payload = json!({
            "model_name": "M",
            "is_correct": false,
            "timestamp": "2026-08-01 10:15:00"
        });
        let result = normalize(&payload);
        assert_eq!(result.timestamp.as_deref(), Some("2026-08-01 10:15:00"));
    }

    #[test]
    fn test_non_object_payload_defaults() {
        let result = normalize(&json!("garbage"));
        assert_eq!(result.model_name, "");
        assert_eq!(result.score, 0);
    }
}
