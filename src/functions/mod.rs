//! Function endpoints
//!
//! The serverless-function surface, served under `/functions`. Every
//! endpoint takes JSON (or query parameters), validates a small required
//! set, calls exactly one third-party API or the managed database, and
//! answers JSON with CORS open to any origin. Errors share one shape:
//! `{ "error": "<message>" }` with a 4xx/5xx status.

pub mod routes;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::analytics::Beacon;
use crate::config::Config;
use crate::db::Database;
use crate::error::SiteError;

/// Shared state for the function handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub db: Database,
    pub beacon: Beacon,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let db = Database::new(&config.supabase_url, &config.supabase_publishable_key);
        let beacon = Beacon::new(&config.analytics_endpoint);
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
            db,
            beacon,
        }
    }
}

/// Error answered by the function endpoints
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    /// Generic 500; the real cause goes to the log, not the caller
    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<SiteError> for ApiError {
    fn from(err: SiteError) -> Self {
        match err {
            SiteError::BadRequest(message) => ApiError::bad_request(&message),
            other => {
                // Third-party and database failures surface as generic 500s
                error!("❌ Function call failed: {}", other);
                ApiError::internal()
            }
        }
    }
}

/// Build the `/functions` router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/functions/verify-captcha", post(routes::verify_captcha))
        .route("/functions/send-push", post(routes::send_push))
        .route("/functions/reviews", get(routes::reviews))
        .route("/functions/voice-token", post(routes::voice_token))
        .route("/functions/send-email", post(routes::send_email))
        .route(
            "/functions/validate-discount",
            post(routes::validate_discount),
        )
        .route("/functions/lead", post(routes::submit_lead))
        .route("/functions/subscribe-push", post(routes::subscribe_push))
        .route("/functions/track", post(routes::track))
        .route("/functions/client-config", get(routes::client_config))
        .layer(cors)
        .with_state(state)
}
