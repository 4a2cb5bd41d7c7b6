//! Function-result payloads fed back to the model.

use serde_json::json;

/// Wraps a tool's text output as `{"name": .., "arguments": {"result": ..}}`.
///
/// The payload is built as a JSON value, so quotes or control characters in
/// either the tool name or the output cannot break the outer object.
pub fn function_result_payload(tool_name: &str, output: &str) -> String {
    json!({
        "name": tool_name,
        "arguments": {
            "result": output,
        },
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn payload_round_trips_hostile_text() {
        let output = "line one\nquote \" backslash \\ tab\t{\"nested\": true}";
        let payload = function_result_payload("say \"hi\"", output);

        let parsed: Value = serde_json::from_str(&payload).expect("payload is valid json");
        assert_eq!(parsed["name"], "say \"hi\"");
        assert_eq!(parsed["arguments"]["result"], output);
    }

    #[test]
    fn payload_has_expected_shape() {
        let payload = function_result_payload("get_crypto_price", "price: 65000");
        let parsed: Value = serde_json::from_str(&payload).expect("payload is valid json");

        assert_eq!(
            parsed,
            serde_json::json!({"name": "get_crypto_price", "arguments": {"result": "price: 65000"}})
        );
    }
}
