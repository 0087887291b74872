//! API route modules.
//!
//! Organizes routes by resource and wires them onto the router the
//! server serves, plus a catch-all that hands unmatched GETs to the
//! static SPA bundle.

pub mod download;
pub mod downloads;
pub mod filesize;
pub mod health;
pub mod metadata;
pub mod templates;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::api::server::AppState;

/// Directory the SPA's static assets are served from; overridable via
/// `STATIC_DIR` (see `ApiServerConfig::from_env_or_default`'s sibling env
/// vars in `server.rs`).
const DEFAULT_STATIC_DIR: &str = "public";

/// Create the main API router with all routes.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/api/health", health::router())
        .nest("/api/naming-templates", templates::router())
        .nest("/api/metadata", metadata::router())
        .nest("/api/filesize", filesize::router())
        .nest("/api/download", download::router())
        .nest("/api/downloads/active", downloads::active_router())
        .nest("/api/download/progress", downloads::progress_router())
        .nest("/api/download/pause", downloads::pause_router())
        .nest("/api/download/resume", downloads::resume_router())
        .nest("/api/download/cancel", downloads::cancel_router());

    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| DEFAULT_STATIC_DIR.to_string());
    let index = std::path::Path::new(&static_dir).join("index.html");
    let spa_fallback = ServeDir::new(&static_dir).fallback(ServeFile::new(index));

    api_routes.fallback_service(spa_fallback).with_state(state)
}
