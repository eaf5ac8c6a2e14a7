use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use crate::models::conversation::ConversationReference;
use crate::responses::JsonResponse;
use crate::state::AppState;

const SEND_MESSAGE_ACTION: &str = "sendMessage";

/// Receives chat activities. Every activity refreshes the sender's
/// conversation reference; `sendMessage` card submissions are forwarded to
/// the vendor URL they carry.
pub async fn handle_activity(
    State(app_state): State<AppState>,
    Json(activity): Json<Value>,
) -> Response {
    match ConversationReference::from_activity(&activity) {
        Some(reference) => {
            let user_id = reference.user_id.clone();
            if app_state.conversations.record(reference) {
                info!(%user_id, "conversation reference stored");
            }
        }
        None => debug!("activity carries no conversation reference"),
    }

    let is_message = activity.get("type").and_then(|v| v.as_str()) == Some("message");
    let value = activity.get("value");
    let action = value.and_then(|v| v.get("action")).and_then(|v| v.as_str());
    if !is_message || action != Some(SEND_MESSAGE_ACTION) {
        return JsonResponse::success("Activity received").into_response();
    }

    let Some(url) = value
        .and_then(|v| v.get("url"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
    else {
        return JsonResponse::bad_request("sendMessage action is missing a url").into_response();
    };
    let message = value
        .and_then(|v| v.get("message"))
        .cloned()
        .unwrap_or(Value::Null);

    let result = app_state
        .http_client
        .post(url)
        .header("Accept", "application/json")
        .json(&json!({ "message": message }))
        .send()
        .await
        .and_then(|resp| resp.error_for_status());

    match result {
        Ok(_) => JsonResponse::success("Message forwarded").into_response(),
        Err(err) => {
            error!(%url, error = %err, "failed to forward sendMessage action");
            JsonResponse::bad_gateway("Failed to forward message").into_response()
        }
    }
}
