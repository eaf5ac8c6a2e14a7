use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Everything needed to address a card to one user's chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReference {
    pub user_id: String,
    pub conversation_id: String,
    pub service_url: Option<String>,
}

impl ConversationReference {
    /// Reads the reference out of an incoming chat activity. The user is
    /// keyed by `from.aadObjectId`; activities without it or without a
    /// conversation id yield `None`.
    pub fn from_activity(activity: &Value) -> Option<Self> {
        let user_id = activity
            .pointer("/from/aadObjectId")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())?;
        let conversation_id = activity
            .pointer("/conversation/id")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())?;
        let service_url = activity
            .get("serviceUrl")
            .and_then(|v| v.as_str())
            .map(|s| s.trim_end_matches('/').to_string());

        Some(ConversationReference {
            user_id: user_id.to_string(),
            conversation_id: conversation_id.to_string(),
            service_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_reference_from_activity() {
        let activity = json!({
            "type": "message",
            "from": { "id": "29:abc", "aadObjectId": "user-1" },
            "conversation": { "id": "a:conv" },
            "serviceUrl": "https://smba.example.com/amer/"
        });

        assert_eq!(
            ConversationReference::from_activity(&activity),
            Some(ConversationReference {
                user_id: "user-1".into(),
                conversation_id: "a:conv".into(),
                service_url: Some("https://smba.example.com/amer".into()),
            })
        );
    }

    #[test]
    fn activity_without_user_object_id_is_ignored() {
        let activity = json!({
            "from": { "id": "29:abc" },
            "conversation": { "id": "a:conv" }
        });
        assert!(ConversationReference::from_activity(&activity).is_none());
    }
}
