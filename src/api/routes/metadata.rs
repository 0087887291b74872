//! Platform metadata lookup.
//!
//! Fetching the actual title/thumbnail/channel metadata for a URL is an
//! external-platform concern this service only gatekeeps, not implements;
//! the handler validates the URL the same way every other job-submitting
//! endpoint does and returns the sanitized form for the caller to use
//! when it talks to its own metadata provider.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::MetadataRequest;
use crate::api::server::AppState;
use crate::error::Error;
use crate::utils::url;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(metadata))
}

async fn metadata(
    State(_state): State<AppState>,
    Json(request): Json<MetadataRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let sanitized = url::sanitize(&request.url).ok_or_else(|| ApiError::from(Error::invalid_url(request.url.clone())))?;
    Ok(Json(serde_json::json!({ "url": sanitized })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::JobOrchestrator;
    use crate::progress::JobRegistry;
    use std::sync::Arc;

    fn state(dir: &std::path::Path) -> AppState {
        let registry = Arc::new(JobRegistry::new());
        let driver = Arc::new(crate::extractor::ExtractorDriver::new("true"));
        let orchestrator = Arc::new(JobOrchestrator::new(registry.clone(), driver, dir.to_path_buf()));
        AppState::new(
            registry,
            orchestrator,
            Arc::new(crate::size_estimator::SizeEstimator::new("true")),
            Arc::new(crate::settings::SettingsStore::new(dir)),
            dir.to_path_buf(),
        )
    }

    #[tokio::test]
    async fn rejects_disallowed_host() {
        let dir = tempfile::tempdir().unwrap();
        let request = MetadataRequest { url: "https://evil.example/watch?v=abc".to_string() };
        let result = metadata(State(state(dir.path())), Json(request)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn accepts_allowed_host() {
        let dir = tempfile::tempdir().unwrap();
        let request = MetadataRequest { url: "https://youtu.be/abc123".to_string() };
        let result = metadata(State(state(dir.path())), Json(request)).await;
        assert!(result.is_ok());
    }
}
