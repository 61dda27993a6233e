//! Simulated LMS-facing integration API. Every endpoint is fake:
//! documents and progress live in an in-memory map that is never
//! persisted, and answers are canned text plus random numbers.

pub mod models;
mod routes;

use crate::error::ApiError;
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use models::{LmsDocument, StudentProgress};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
pub struct ApiKeyInfo {
    pub key: &'static str,
    pub tier: &'static str,
    /// Negative means unlimited.
    pub limit: i64,
    pub used: i64,
}

/// Static demo key table; there is no real account system behind it.
pub const API_KEYS: [ApiKeyInfo; 3] = [
    ApiKeyInfo {
        key: "cd_test_starter_abc123",
        tier: "starter",
        limit: 1_000,
        used: 245,
    },
    ApiKeyInfo {
        key: "cd_test_pro_def456",
        tier: "professional",
        limit: 10_000,
        used: 3_420,
    },
    ApiKeyInfo {
        key: "cd_test_ent_ghi789",
        tier: "enterprise",
        limit: -1,
        used: 15_600,
    },
];

pub fn lookup_api_key(token: &str) -> Option<ApiKeyInfo> {
    API_KEYS.iter().copied().find(|info| info.key == token)
}

#[derive(Clone, Default)]
pub struct IntegrationState {
    inner: Arc<Mutex<IntegrationData>>,
}

#[derive(Default)]
pub struct IntegrationData {
    pub documents: HashMap<String, LmsDocument>,
    pub progress: HashMap<String, StudentProgress>,
}

impl IntegrationState {
    pub async fn lock(&self) -> tokio::sync::MutexGuard<'_, IntegrationData> {
        self.inner.lock().await
    }
}

async fn verify_api_key(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("Invalid API key".to_string()))?;
    let info = lookup_api_key(&token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid API key".to_string()))?;

    request.extensions_mut().insert(info);
    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Routes nested under `/v1`. The info and health endpoints are public;
/// everything else sits behind the bearer-key check.
pub fn integration_routes() -> Router {
    let state = IntegrationState::default();

    let protected = Router::new()
        .route("/documents/upload", post(routes::upload_document))
        .route("/documents/{document_id}", get(routes::get_document))
        .route(
            "/courses/{course_id}/documents",
            get(routes::list_course_documents),
        )
        .route("/ask", post(routes::ask_question))
        .route(
            "/students/{student_id}/progress",
            get(routes::get_student_progress),
        )
        .route(
            "/courses/{course_id}/analytics",
            get(routes::get_course_analytics),
        )
        .route("/usage", get(routes::get_api_usage))
        .route("/webhooks/lms", post(routes::lms_webhook))
        .route_layer(middleware::from_fn(verify_api_key))
        .with_state(state);

    Router::new()
        .route("/", get(routes::api_info))
        .route("/health", get(routes::health_check))
        .merge(protected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keys_resolve_with_their_tier() {
        let info = lookup_api_key("cd_test_pro_def456").unwrap();
        assert_eq!(info.tier, "professional");
        assert_eq!(info.limit, 10_000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(lookup_api_key("cd_test_bogus").is_none());
        assert!(lookup_api_key("").is_none());
    }
}
