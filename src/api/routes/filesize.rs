//! Pre-flight file size estimation.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{FilesizeRequest, FilesizeResponse};
use crate::api::server::AppState;
use crate::error::Error;
use crate::size_estimator::EstimatorError;
use crate::utils::url;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(filesize))
}

async fn filesize(
    State(state): State<AppState>,
    Json(request): Json<FilesizeRequest>,
) -> ApiResult<Json<FilesizeResponse>> {
    url::sanitize(&request.url).ok_or_else(|| ApiError::from(Error::invalid_url(request.url.clone())))?;

    let file_size = state
        .size_estimator
        .estimate_projected_bytes(
            &request.url,
            request.mode,
            request.quality.as_deref(),
            request.format,
            request.playlist_items.as_deref(),
            &state.working_dir,
        )
        .await
        .map_err(estimator_error_to_api_error)?;

    Ok(Json(FilesizeResponse { file_size }))
}

fn estimator_error_to_api_error(err: EstimatorError) -> ApiError {
    match err {
        EstimatorError::InvalidPlaylistItems(spec) => {
            ApiError::bad_request(format!("invalid playlist-items spec: {spec}"))
        }
        EstimatorError::SpawnFailed(msg) => ApiError::internal(msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::Mode;
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
    async fn rejects_disallowed_host_before_spawning_the_extractor() {
        let dir = tempfile::tempdir().unwrap();
        let request = FilesizeRequest {
            url: "https://evil.example/watch?v=abc".to_string(),
            mode: Mode::Video,
            quality: None,
            format: None,
            playlist_items: None,
        };
        let result = filesize(State(state(dir.path())), Json(request)).await;
        assert!(result.is_err());
    }
}
