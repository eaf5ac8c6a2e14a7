use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;
use urlencoding::encode;

use crate::models::conversation::ConversationReference;

pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

/// A built card waiting to be delivered to one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDispatch {
    pub event_id: i32,
    pub reference: ConversationReference,
    pub summary: String,
    pub card: Value,
}

#[derive(Debug, Error)]
pub enum CardDeliveryError {
    #[error("failed to deliver card: {0}")]
    Http(#[from] reqwest::Error),
    #[error("card endpoint responded with status {status}: {message}")]
    UnexpectedStatus { status: StatusCode, message: String },
    #[error("conversation {conversation_id} has no service url and no card webhook is configured")]
    NoDeliveryTarget { conversation_id: String },
}

#[async_trait]
pub trait CardSender: Send + Sync {
    async fn send_card(&self, dispatch: &CardDispatch) -> Result<(), CardDeliveryError>;
}

/// Wraps an Adaptive Card in a chat message activity.
pub fn build_card_activity(summary: &str, card: &Value) -> Value {
    json!({
        "type": "message",
        "summary": summary,
        "attachments": [{
            "contentType": ADAPTIVE_CARD_CONTENT_TYPE,
            "contentUrl": Value::Null,
            "content": card,
        }]
    })
}

/// Posts cards over HTTP, either to a fixed incoming webhook or to the
/// conversation's own service URL.
pub struct WebhookCardSender {
    pub client: Client,
    pub webhook_url: Option<String>,
}

impl WebhookCardSender {
    pub fn new(client: Client, webhook_url: Option<String>) -> Self {
        Self { client, webhook_url }
    }

    fn target_url(&self, reference: &ConversationReference) -> Result<String, CardDeliveryError> {
        if let Some(url) = &self.webhook_url {
            return Ok(url.clone());
        }
        match &reference.service_url {
            Some(service_url) => Ok(format!(
                "{}/v3/conversations/{}/activities",
                service_url.trim_end_matches('/'),
                encode(&reference.conversation_id)
            )),
            None => Err(CardDeliveryError::NoDeliveryTarget {
                conversation_id: reference.conversation_id.clone(),
            }),
        }
    }
}

#[async_trait]
impl CardSender for WebhookCardSender {
    async fn send_card(&self, dispatch: &CardDispatch) -> Result<(), CardDeliveryError> {
        let url = self.target_url(&dispatch.reference)?;
        let activity = build_card_activity(&dispatch.summary, &dispatch.card);

        let response = self.client.post(&url).json(&activity).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CardDeliveryError::UnexpectedStatus { status, message });
        }

        debug!(
            event_id = dispatch.event_id,
            conversation_id = %dispatch.reference.conversation_id,
            "card delivered"
        );
        Ok(())
    }
}
