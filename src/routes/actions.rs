use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::engine::CardBuilder;
use crate::models::notification::{response_body, ActionRenderRequest};
use crate::responses::JsonResponse;
use crate::state::AppState;

/// Re-renders an event's card with follow-up URLs for an already posted
/// message.
pub async fn handle_render_actions(
    State(app_state): State<AppState>,
    Path(event_id): Path<i32>,
    Json(payload): Json<ActionRenderRequest>,
) -> Response {
    let mut builder = match CardBuilder::init(app_state.event_config_repo.as_ref(), event_id).await
    {
        Ok(Some(builder)) => builder,
        Ok(None) => return JsonResponse::not_found("No rule set for event").into_response(),
        Err(err) => {
            error!(event_id, error = %err, "failed to load rule set");
            return JsonResponse::server_error("Failed to load rule set").into_response();
        }
    };

    let body = response_body(&payload.data);
    let rendered = builder.build(&body).and_then(|_| {
        builder.build_actions(&body, &payload.message_id, &payload.conversation_id)
    });

    match rendered {
        Ok(card) => (StatusCode::OK, Json(json!({"success": true, "card": card}))).into_response(),
        Err(err) => {
            error!(event_id, error = %err, "failed to render card actions");
            JsonResponse::server_error("Failed to render card actions").into_response()
        }
    }
}
