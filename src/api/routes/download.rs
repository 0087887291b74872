//! Job submission: validates the request, resolves the final filename
//! against the stored naming template, and kicks off the Job
//! Orchestrator's download routine.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::{DownloadRequest, DownloadResponse};
use crate::api::server::AppState;
use crate::domain::job::{ContentType, JobOptions};
use crate::error::Error;
use crate::template::{self, ResolveContext};
use crate::utils::url;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(download))
}

async fn download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> ApiResult<Json<DownloadResponse>> {
    url::sanitize(&request.url).ok_or_else(|| ApiError::from(Error::invalid_url(request.url.clone())))?;

    let content_type = if request.index.is_some() {
        ContentType::Playlist
    } else {
        ContentType::Single
    };

    let templates = state.settings_store.load_naming_templates().await?;
    let mode_templates = match content_type {
        ContentType::Single => &templates.single,
        ContentType::Playlist => &templates.playlist,
    };
    let template = match request.mode {
        crate::domain::job::Mode::Video => &mode_templates.video,
        crate::domain::job::Mode::Audio => &mode_templates.audio,
    };
    template::validate(template, content_type, request.mode).map_err(Error::from)?;

    let resolved_filename = template::resolve(
        template,
        &ResolveContext {
            title: request.title.clone().unwrap_or_else(|| request.video_id.clone()),
            channel: request.channel.clone(),
            quality: request.quality.clone(),
            format: request.format.map(|f| f.as_extractor_arg().to_string()),
            index: request.index,
        },
    );

    let estimated_bytes = state
        .size_estimator
        .estimate_raw_bytes(&request.url, request.mode, request.quality.as_deref(), None, &state.working_dir)
        .await
        .unwrap_or(0);

    let output_folder = state
        .output_root_override
        .clone()
        .unwrap_or(request.output_folder);

    let options = JobOptions {
        url: request.url,
        video_id: request.video_id,
        job_id: request.job_id.clone(),
        output_folder,
        mode: request.mode,
        quality: request.quality,
        format: request.format,
        estimated_bytes,
        resolved_filename: Some(resolved_filename),
        subtitles: crate::domain::job::SubtitleOptions {
            download_subtitles: request.download_subtitles,
            language: request.subtitle_language.unwrap_or_default(),
        },
        create_per_channel_folder: request.create_per_channel_folder,
        channel: request.channel,
        playlist_index: request.index,
    };

    state.orchestrator.submit(options).await.map_err(Error::from)?;

    Ok(Json(DownloadResponse {
        success: true,
        job_id: request.job_id,
        status: "queued".to_string(),
    }))
}
