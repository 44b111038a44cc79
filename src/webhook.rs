//! Webhook delivery mode: Telegram POSTs updates to us

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::dispatch::{dispatch_message, DispatchOptions, IncomingMessage};
use crate::state::AppState;
use crate::transport::telegram::Update;
use crate::transport::Transport;

pub const WEBHOOK_PATH: &str = "/telegram/webhook";
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct WebhookState {
    pub app: Arc<AppState>,
    pub transport: Arc<dyn Transport>,
    pub options: DispatchOptions,
}

/// Constant-time byte comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Reject webhook calls that do not carry the configured secret token
async fn secret_token_middleware(
    State(secret): State<Arc<Option<String>>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = secret.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(SECRET_HEADER)
        .map(|value| value.as_bytes())
        .unwrap_or_default();

    if constant_time_eq(expected.as_bytes(), provided) {
        next.run(request).await
    } else {
        tracing::warn!(uri = %request.uri(), "Rejected webhook call with bad secret token");
        (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
    }
}

async fn webhook_handler(
    State(state): State<WebhookState>,
    Json(update): Json<Update>,
) -> StatusCode {
    tracing::debug!(update_id = update.update_id, "Webhook update received");

    if let Some(message) = IncomingMessage::from_update(update) {
        dispatch_message(message, &state.app, state.transport.as_ref(), &state.options).await;
    }
    StatusCode::OK
}

async fn health() -> &'static str {
    "ok"
}

/// Build the webhook router
pub fn router(state: WebhookState, secret: Option<String>) -> Router {
    let webhook_routes = Router::new()
        .route(WEBHOOK_PATH, post(webhook_handler))
        .layer(middleware::from_fn_with_state(
            Arc::new(secret),
            secret_token_middleware,
        ));

    Router::new()
        .merge(webhook_routes)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
