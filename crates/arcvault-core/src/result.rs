//! Outcome of `POST /api/run/:id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Success,
    Warning,
    #[serde(other)]
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResult {
    pub status: ResultStatus,

    #[serde(default)]
    pub message: String,

    /// Strategy-specific payload; interpreted by the handler.
    #[serde(default)]
    pub data: Value,
}

impl ActionResult {
    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }

    /// `data.<key>` as a string, if present.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Identifier returned by a successful save, rendered for display.
    pub fn saved_id(&self) -> Option<String> {
        match self.data.get("id")? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_message_and_data_default() {
        let r: ActionResult =
            serde_json::from_value(json!({"status": "success", "data": "Refresh complete"})).unwrap();
        assert!(r.is_success());
        assert_eq!(r.message, "");

        let r: ActionResult = serde_json::from_value(json!({"status": "warning"})).unwrap();
        assert_eq!(r.status, ResultStatus::Warning);
        assert!(r.data.is_null());
    }

    #[test]
    fn unknown_status_is_error() {
        let r: ActionResult = serde_json::from_value(json!({"status": "pending"})).unwrap();
        assert_eq!(r.status, ResultStatus::Error);
        assert!(!r.is_success());
    }

    #[test]
    fn saved_id_accepts_numbers_and_strings() {
        let r: ActionResult =
            serde_json::from_value(json!({"status": "success", "data": {"id": 42}})).unwrap();
        assert_eq!(r.saved_id().as_deref(), Some("42"));
        let r: ActionResult =
            serde_json::from_value(json!({"status": "success", "data": {"id": "abc"}})).unwrap();
        assert_eq!(r.saved_id().as_deref(), Some("abc"));
        let r: ActionResult =
            serde_json::from_value(json!({"status": "success", "data": {}})).unwrap();
        assert_eq!(r.saved_id(), None);
    }
}
