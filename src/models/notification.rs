use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a vendor notification relayed to `/api/notify`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationMessage {
    pub user_id: String,
    pub event_id: i32,
    #[serde(default)]
    pub data: Value,
    pub message_id: Option<String>,
}

/// Body of an action re-render request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRenderRequest {
    #[serde(default)]
    pub data: Value,
    pub message_id: String,
    pub conversation_id: String,
}

/// Raw vendor body handed to the card builder. A string payload is taken
/// as already-serialized JSON.
pub fn response_body(data: &Value) -> String {
    match data {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_payload_is_passed_through() {
        assert_eq!(response_body(&json!("{\"id\": 1}")), "{\"id\": 1}");
        assert_eq!(response_body(&json!({"id": 1})), "{\"id\":1}");
    }

    #[test]
    fn notification_uses_camel_case_fields() {
        let msg: NotificationMessage = serde_json::from_value(json!({
            "userId": "user-1",
            "eventId": 7,
            "data": {"ticket_id": 42}
        }))
        .unwrap();
        assert_eq!(msg.user_id, "user-1");
        assert_eq!(msg.event_id, 7);
        assert!(msg.message_id.is_none());
    }
}
