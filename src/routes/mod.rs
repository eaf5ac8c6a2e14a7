pub mod actions;
pub mod messages;
pub mod notify;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use crate::responses::JsonResponse;
use crate::state::AppState;

pub async fn root() -> impl IntoResponse {
    JsonResponse::success("card relay is running")
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/notify", post(notify::handle_notify))
        .route(
            "/api/events/{event_id}/actions",
            post(actions::handle_render_actions),
        )
        .route("/api/messages", post(messages::handle_activity))
        .with_state(state)
}
