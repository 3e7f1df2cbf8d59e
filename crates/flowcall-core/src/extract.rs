//! Reply text extraction from backend JSON envelopes.
//!
//! The backend's response envelope depends on how the flow is wired, so the
//! payload is never deserialized into a fixed type. Instead a priority chain
//! of known field names is tried and the first usable string wins.

use serde_json::{Map, Value};

/// Top-level fields that may hold the reply directly, highest priority first.
const TOP_LEVEL_FIELDS: [&str; 3] = ["output", "message", "text"];

/// Fields of the nested `outputs[0].outputs` object, highest priority first.
/// When none of them is truthy the object's first entry is used as is.
const NESTED_OUTPUT_FIELDS: [&str; 3] = ["chat_output", "text_output", "result"];

/// Returns the best reply string found in one backend JSON object, or `None`
/// when the object carries no usable reply.
///
/// Lookup order:
///
/// 1. top-level `output`, `message`, `text`, the first that is a string;
/// 2. `outputs[0].outputs`, taking the first truthy value among
///    `chat_output`, `text_output`, `result`, or else the object's first
///    entry whatever its value, provided the chosen value is a string.
pub fn extract_reply(reply: &Map<String, Value>) -> Option<&str> {
    if let Some(text) = TOP_LEVEL_FIELDS
        .iter()
        .find_map(|field| reply.get(*field).and_then(Value::as_str))
    {
        return Some(text);
    }

    let inner = reply
        .get("outputs")?
        .as_array()?
        .first()?
        .as_object()?
        .get("outputs")?
        .as_object()?;

    NESTED_OUTPUT_FIELDS
        .iter()
        .filter_map(|field| inner.get(*field))
        .find(|value| is_truthy(value))
        .or_else(|| inner.values().next())?
        .as_str()
}

/// JSON truthiness: `null`, `false`, zero, and empty strings, arrays and
/// objects are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected a JSON object, got {}", other),
        }
    }

    #[test]
    fn output_wins_over_every_other_field() {
        let reply = object(json!({
            "message": "from message",
            "text": "from text",
            "outputs": [{"outputs": {"chat_output": "nested"}}],
            "output": "from output",
        }));
        assert_eq!(extract_reply(&reply), Some("from output"));
    }

    #[test]
    fn top_level_fields_fall_through_when_not_strings() {
        let reply = object(json!({"output": 42, "message": null, "text": "plain"}));
        assert_eq!(extract_reply(&reply), Some("plain"));

        let reply = object(json!({"output": {"nested": true}, "message": "msg"}));
        assert_eq!(extract_reply(&reply), Some("msg"));
    }

    #[test]
    fn empty_top_level_string_is_still_returned() {
        let reply = object(json!({"output": "", "message": "ignored"}));
        assert_eq!(extract_reply(&reply), Some(""));
    }

    #[test]
    fn unknown_fields_yield_nothing() {
        let reply = object(json!({"session_id": "abc", "status": "done", "data": [1, 2]}));
        assert_eq!(extract_reply(&reply), None);
        assert_eq!(extract_reply(&Map::new()), None);
    }

    #[test]
    fn nested_chat_output() {
        let reply = object(json!({"outputs": [{"outputs": {"chat_output": "hi"}}]}));
        assert_eq!(extract_reply(&reply), Some("hi"));
    }

    #[test]
    fn nested_priority_order() {
        let reply = object(json!({"outputs": [{"outputs": {
            "result": "r",
            "text_output": "t",
            "chat_output": "c",
        }}]}));
        assert_eq!(extract_reply(&reply), Some("c"));

        let reply = object(json!({"outputs": [{"outputs": {"result": "r", "text_output": "t"}}]}));
        assert_eq!(extract_reply(&reply), Some("t"));
    }

    #[test]
    fn result_beats_first_key_fallback() {
        let reply = object(json!({"outputs": [{"outputs": {"result": "bye", "other": 1}}]}));
        assert_eq!(extract_reply(&reply), Some("bye"));

        let reply = object(json!({"outputs": [{"outputs": {"other": 1, "result": "bye"}}]}));
        assert_eq!(extract_reply(&reply), Some("bye"));
    }

    #[test]
    fn first_key_in_insertion_order_is_the_last_resort() {
        let reply = object(json!({"outputs": [{"outputs": {"zeta": "first", "alpha": "second"}}]}));
        assert_eq!(extract_reply(&reply), Some("first"));
    }

    #[test]
    fn falsy_named_candidates_are_skipped() {
        let reply = object(json!({"outputs": [{"outputs": {
            "chat_output": "",
            "text_output": null,
            "result": "fallback",
        }}]}));
        assert_eq!(extract_reply(&reply), Some("fallback"));
    }

    #[test]
    fn falsy_first_entry_is_still_returned() {
        let reply = object(json!({"outputs": [{"outputs": {"only": ""}}]}));
        assert_eq!(extract_reply(&reply), Some(""));

        let reply = object(json!({"outputs": [{"outputs": {"chat_output": "", "extra": "x"}}]}));
        assert_eq!(extract_reply(&reply), Some(""));
    }

    #[test]
    fn truthy_non_string_candidate_ends_the_search() {
        let reply = object(json!({"outputs": [{"outputs": {
            "chat_output": {"message": {"text": "deep"}},
            "text_output": "never reached",
        }}]}));
        assert_eq!(extract_reply(&reply), None);
    }

    #[test]
    fn only_the_first_outputs_entry_is_inspected() {
        let reply = object(json!({"outputs": [
            {"outputs": {"chat_output": 7}},
            {"outputs": {"chat_output": "second"}},
        ]}));
        assert_eq!(extract_reply(&reply), None);
    }

    #[test]
    fn malformed_outputs_shapes_yield_nothing() {
        for value in [
            json!({"outputs": []}),
            json!({"outputs": "not a list"}),
            json!({"outputs": ["not an object"]}),
            json!({"outputs": [{"results": {}}]}),
            json!({"outputs": [{"outputs": ["list", "not", "object"]}]}),
            json!({"outputs": [{"outputs": {}}]}),
        ] {
            assert_eq!(extract_reply(&object(value.clone())), None, "{}", value);
        }
    }

    #[test]
    fn truthiness_matches_json_semantics() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!([])));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!(" ")));
        assert!(is_truthy(&json!([0])));
    }
}
