use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{error, info, warn};

use crate::engine::CardBuilder;
use crate::models::notification::{response_body, NotificationMessage};
use crate::responses::JsonResponse;
use crate::services::card_delivery::CardDispatch;
use crate::state::AppState;

/// Builds the card for a vendor notification and queues it for the user's
/// conversation.
pub async fn handle_notify(
    State(app_state): State<AppState>,
    Json(payload): Json<NotificationMessage>,
) -> Response {
    let Some(reference) = app_state.conversations.get(&payload.user_id) else {
        info!(user_id = %payload.user_id, "no conversation reference for user");
        return JsonResponse::not_found_with_code(
            "No conversation reference for user",
            "NO_CONVERSATION",
        )
        .into_response();
    };

    let mut builder =
        match CardBuilder::init(app_state.event_config_repo.as_ref(), payload.event_id).await {
            Ok(Some(builder)) => builder,
            Ok(None) => {
                return JsonResponse::not_found_with_code("No rule set for event", "NO_RULE_SET")
                    .into_response()
            }
            Err(err) => {
                error!(event_id = payload.event_id, error = %err, "failed to load rule set");
                return JsonResponse::server_error("Failed to load rule set").into_response();
            }
        };

    let body = response_body(&payload.data);
    let built = match payload.message_id.as_deref() {
        Some(message_id) => builder.build(&body).and_then(|_| {
            builder.build_actions(&body, message_id, &reference.conversation_id)
        }),
        None => builder.build(&body),
    };
    let card = match built {
        Ok(card) => card,
        Err(err) => {
            error!(event_id = payload.event_id, error = %err, "failed to build card");
            return JsonResponse::server_error("Failed to build card").into_response();
        }
    };

    let dispatch = CardDispatch {
        event_id: payload.event_id,
        summary: builder.summary().to_string(),
        reference,
        card,
    };
    match app_state.card_queue.try_send(dispatch) {
        Ok(()) => JsonResponse::accepted("Card queued for delivery").into_response(),
        Err(TrySendError::Full(_)) => {
            warn!(event_id = payload.event_id, "card queue is full");
            JsonResponse::service_unavailable("Card queue is full").into_response()
        }
        Err(TrySendError::Closed(_)) => {
            error!(event_id = payload.event_id, "card queue is closed");
            JsonResponse::service_unavailable("Card delivery is unavailable").into_response()
        }
    }
}
