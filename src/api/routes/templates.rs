//! Naming-templates routes, backed by the Settings Store.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::error::ApiResult;
use crate::api::models::{NamingTemplatesResponse, UpdateNamingTemplatesRequest, UpdateNamingTemplatesResponse};
use crate::api::server::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_naming_templates).put(put_naming_templates))
}

async fn get_naming_templates(State(state): State<AppState>) -> ApiResult<Json<NamingTemplatesResponse>> {
    let naming_templates = state.settings_store.load_naming_templates().await?;
    Ok(Json(NamingTemplatesResponse { naming_templates }))
}

async fn put_naming_templates(
    State(state): State<AppState>,
    Json(request): Json<UpdateNamingTemplatesRequest>,
) -> ApiResult<Json<UpdateNamingTemplatesResponse>> {
    state
        .settings_store
        .save_naming_templates(&request.naming_templates)
        .await?;
    Ok(Json(UpdateNamingTemplatesResponse {
        success: true,
        naming_templates: request.naming_templates,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_through_the_settings_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(crate::settings::SettingsStore::new(dir.path()));

        let mut templates = store.load_naming_templates().await.unwrap();
        assert_eq!(templates, crate::domain::templates::NamingTemplates::default());

        templates.single.video = "<title>".to_string();
        store.save_naming_templates(&templates).await.unwrap();

        let reloaded = store.load_naming_templates().await.unwrap();
        assert_eq!(reloaded.single.video, "<title>");
    }
}
