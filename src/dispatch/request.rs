//! Request decoding.

use crate::codec::Message;
use crate::core::{DispatchError, ScanRequest, DEFAULT_ACTION};

use serde_json::Value;

/// Reads a [`ScanRequest`] out of a decoded message.
///
/// `target` must be a string. An empty string is not a URL, so it is routed
/// to the sandbox like any other path. `action` is optional and defaults to
/// `"scan"`. Other keys are ignored.
///
/// # Errors
///
/// Returns `InvalidRequest` if `target` is missing or not a string, or if
/// `action` is present but not a string.
pub fn parse_request(message: &Message) -> Result<ScanRequest, DispatchError> {
    let target = match message.get("target") {
        Some(Value::String(target)) => target.clone(),
        Some(_) => return Err(DispatchError::invalid_request("target must be a string")),
        None => return Err(DispatchError::invalid_request("missing target")),
    };

    let action = match message.get("action") {
        Some(Value::String(action)) => action.clone(),
        Some(Value::Null) | None => DEFAULT_ACTION.to_string(),
        Some(_) => return Err(DispatchError::invalid_request("action must be a string")),
    };

    Ok(ScanRequest::new(target).with_action(action))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TargetKind;
    use serde_json::json;

    fn message(value: Value) -> Message {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_parse_defaults_action() {
        let request = parse_request(&message(json!({"target": "https://a.example"}))).unwrap();
        assert_eq!(request.target, "https://a.example");
        assert_eq!(request.action, "scan");
    }

    #[test]
    fn test_parse_ignores_extra_keys() {
        let request = parse_request(&message(json!({
            "target": "/tmp/a.bin",
            "action": "scan",
            "tab_id": 17
        })))
        .unwrap();
        assert_eq!(request.action, "scan");
    }

    #[test]
    fn test_parse_rejects_bad_target() {
        for value in [json!({}), json!({"target": 5}), json!({"target": null})] {
            let err = parse_request(&message(value)).unwrap_err();
            assert!(err.to_string().starts_with("Invalid request: "));
        }
    }

    #[test]
    fn test_parse_empty_target_is_a_file() {
        let request = parse_request(&message(json!({"target": ""}))).unwrap();
        assert_eq!(request.target, "");
        assert_eq!(request.kind(), TargetKind::File);
    }

    #[test]
    fn test_parse_keeps_other_actions() {
        let request =
            parse_request(&message(json!({"target": "/tmp/a", "action": "quarantine"}))).unwrap();
        assert_eq!(request.action, "quarantine");
    }
}
