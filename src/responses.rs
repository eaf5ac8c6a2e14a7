use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct JsonResponse {
    pub status: String,
    pub success: bool,
    pub message: String,
    pub code: Option<String>,
}

impl JsonResponse {
    fn with_status(status: StatusCode, msg: &str, code: Option<&str>) -> impl IntoResponse {
        let ok = status.is_success();
        (
            status,
            Json(JsonResponse {
                status: if ok { "success" } else { "error" }.to_string(),
                success: ok,
                message: msg.to_string(),
                code: code.map(str::to_string),
            }),
        )
    }

    pub fn success(msg: &str) -> impl IntoResponse {
        Self::with_status(StatusCode::OK, msg, None)
    }

    pub fn accepted(msg: &str) -> impl IntoResponse {
        Self::with_status(StatusCode::ACCEPTED, msg, None)
    }

    pub fn not_found(msg: &str) -> impl IntoResponse {
        Self::with_status(StatusCode::NOT_FOUND, msg, None)
    }

    pub fn not_found_with_code(msg: &str, code: &str) -> impl IntoResponse {
        Self::with_status(StatusCode::NOT_FOUND, msg, Some(code))
    }

    pub fn bad_request(msg: &str) -> impl IntoResponse {
        Self::with_status(StatusCode::BAD_REQUEST, msg, None)
    }

    pub fn server_error(msg: &str) -> impl IntoResponse {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, msg, None)
    }

    pub fn bad_gateway(msg: &str) -> impl IntoResponse {
        Self::with_status(StatusCode::BAD_GATEWAY, msg, None)
    }

    pub fn service_unavailable(msg: &str) -> impl IntoResponse {
        Self::with_status(StatusCode::SERVICE_UNAVAILABLE, msg, None)
    }
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;
    use serde_json::from_slice;

    use crate::responses::JsonResponse;

    #[tokio::test]
    async fn test_success_response() {
        let resp = JsonResponse::success("ok").into_response();
        assert_eq!(resp.status(), axum::http::StatusCode::OK);

        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        let json: JsonResponse = from_slice(&body).unwrap();
        assert_eq!(json.status, "success");
        assert!(json.success);
        assert_eq!(json.message, "ok");
    }

    #[tokio::test]
    async fn test_accepted_response() {
        let resp = JsonResponse::accepted("queued").into_response();
        assert_eq!(resp.status(), axum::http::StatusCode::ACCEPTED);

        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        let json: JsonResponse = from_slice(&body).unwrap();
        assert!(json.success);
        assert_eq!(json.message, "queued");
    }

    #[tokio::test]
    async fn test_not_found_with_code() {
        let resp = JsonResponse::not_found_with_code("nope", "NO_CONVERSATION").into_response();
        assert_eq!(resp.status(), axum::http::StatusCode::NOT_FOUND);

        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        let json: JsonResponse = from_slice(&body).unwrap();
        assert_eq!(json.status, "error");
        assert!(!json.success);
        assert_eq!(json.code.as_deref(), Some("NO_CONVERSATION"));
    }
}
