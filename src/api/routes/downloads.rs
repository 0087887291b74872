//! Active-downloads listing, per-job progress, and pause/resume/cancel
//! control routes.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{ActiveDownloadsResponse, SuccessResponse};
use crate::api::server::AppState;
use crate::domain::progress::JobProgress;
use crate::error::Error;

pub fn active_router() -> Router<AppState> {
    Router::new().route("/", get(active_downloads))
}

pub fn progress_router() -> Router<AppState> {
    Router::new().route("/{job_id}", get(progress))
}

pub fn pause_router() -> Router<AppState> {
    Router::new().route("/{job_id}", post(pause))
}

pub fn resume_router() -> Router<AppState> {
    Router::new().route("/{job_id}", post(resume))
}

pub fn cancel_router() -> Router<AppState> {
    Router::new().route("/{job_id}", post(cancel))
}

async fn active_downloads(State(state): State<AppState>) -> Json<ActiveDownloadsResponse> {
    Json(ActiveDownloadsResponse {
        downloads: state.registry.active_snapshot(),
    })
}

async fn progress(State(state): State<AppState>, Path(job_id): Path<String>) -> ApiResult<Json<JobProgress>> {
    state
        .registry
        .get_progress(&job_id)
        .map(Json)
        .ok_or_else(|| ApiError::from(Error::not_found(job_id)))
}

async fn pause(State(state): State<AppState>, Path(job_id): Path<String>) -> ApiResult<Json<SuccessResponse>> {
    if state.orchestrator.pause(&job_id).await {
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(ApiError::from(Error::not_found(job_id)))
    }
}

async fn resume(State(state): State<AppState>, Path(job_id): Path<String>) -> ApiResult<Json<SuccessResponse>> {
    if state.orchestrator.resume(&job_id).await {
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(ApiError::from(Error::not_found(job_id)))
    }
}

async fn cancel(State(state): State<AppState>, Path(job_id): Path<String>) -> ApiResult<Json<SuccessResponse>> {
    if state.orchestrator.cancel(&job_id).await {
        Ok(Json(SuccessResponse::ok()))
    } else {
        Err(ApiError::from(Error::not_found(job_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{JobOptions, Mode, SubtitleOptions};
    use crate::extractor::ExtractorDriver;
    use crate::orchestrator::JobOrchestrator;
    use crate::progress::JobRegistry;
    use std::sync::Arc;

    fn state(dir: &std::path::Path) -> AppState {
        let registry = Arc::new(JobRegistry::new());
        let driver = Arc::new(ExtractorDriver::new("true"));
        let orchestrator = Arc::new(JobOrchestrator::new(registry.clone(), driver, dir.to_path_buf()));
        AppState::new(
            registry,
            orchestrator,
            Arc::new(crate::size_estimator::SizeEstimator::new("true")),
            Arc::new(crate::settings::SettingsStore::new(dir)),
            dir.to_path_buf(),
        )
    }

    fn options(dir: &std::path::Path) -> JobOptions {
        JobOptions {
            url: "https://youtube.com/watch?v=abc".to_string(),
            video_id: "abc".to_string(),
            job_id: "job-1".to_string(),
            output_folder: dir.to_string_lossy().to_string(),
            mode: Mode::Video,
            quality: None,
            format: None,
            estimated_bytes: 0,
            resolved_filename: Some("Hello".to_string()),
            subtitles: SubtitleOptions::default(),
            create_per_channel_folder: false,
            channel: None,
            playlist_index: None,
        }
    }

    #[tokio::test]
    async fn progress_404s_for_unknown_job() {
        let dir = tempfile::tempdir().unwrap();
        let app_state = state(dir.path());
        let result = progress(State(app_state), Path("missing".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn active_downloads_reflects_registered_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let app_state = state(dir.path());
        app_state.registry.register("job-1", Arc::new(options(dir.path())));

        let response = active_downloads(State(app_state)).await;
        assert!(response.downloads.contains_key("job-1"));
    }

    #[tokio::test]
    async fn pause_404s_when_job_is_not_registered() {
        let dir = tempfile::tempdir().unwrap();
        let app_state = state(dir.path());
        let result = pause(State(app_state), Path("missing".to_string())).await;
        assert!(result.is_err());
    }
}
