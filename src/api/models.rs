//! API request and response models (DTOs).
//!
//! Defines the data transfer objects for every endpoint in the HTTP
//! surface. Field names are `camelCase` on the wire to match the
//! browser client; the Rust-side types stay `snake_case`.

use serde::{Deserialize, Serialize};

use crate::domain::job::{AudioFormat, Mode, SubtitleLanguage};
use crate::domain::templates::NamingTemplates;

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub uptime_secs: u64,
}

// ============================================================================
// Naming templates
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingTemplatesResponse {
    pub naming_templates: NamingTemplates,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNamingTemplatesRequest {
    pub naming_templates: NamingTemplates,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNamingTemplatesResponse {
    pub success: bool,
    pub naming_templates: NamingTemplates,
}

// ============================================================================
// Metadata
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataRequest {
    pub url: String,
}

// ============================================================================
// Filesize
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesizeRequest {
    pub url: String,
    pub mode: Mode,
    pub quality: Option<String>,
    pub format: Option<AudioFormat>,
    pub playlist_items: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesizeResponse {
    pub file_size: u64,
}

// ============================================================================
// Download
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub url: String,
    pub video_id: String,
    pub job_id: String,
    pub output_folder: String,
    pub mode: Mode,
    pub quality: Option<String>,
    pub format: Option<AudioFormat>,
    pub title: Option<String>,
    pub channel: Option<String>,
    pub index: Option<u32>,
    #[serde(default)]
    pub create_per_channel_folder: bool,
    #[serde(default)]
    pub download_subtitles: bool,
    pub subtitle_language: Option<SubtitleLanguage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub success: bool,
    pub job_id: String,
    pub status: String,
}

// ============================================================================
// Downloads / progress
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ActiveDownloadsResponse {
    pub downloads: std::collections::HashMap<String, crate::domain::progress::JobProgress>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub const fn ok() -> Self {
        Self { success: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_request_deserializes_minimal_body() {
        let json = r#"{
            "url": "https://youtube.com/watch?v=abc",
            "videoId": "abc",
            "jobId": "job-1",
            "outputFolder": "/tmp/out",
            "mode": "video"
        }"#;
        let request: DownloadRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.video_id, "abc");
        assert_eq!(request.mode, Mode::Video);
        assert!(!request.create_per_channel_folder);
    }

    #[test]
    fn filesize_request_deserializes_optional_fields() {
        let json = r#"{"url": "https://youtu.be/abc", "mode": "audio", "format": "wav"}"#;
        let request: FilesizeRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.format, Some(AudioFormat::Wav));
        assert!(request.playlist_items.is_none());
    }

    #[test]
    fn success_response_serializes_true() {
        let json = serde_json::to_string(&SuccessResponse::ok()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }
}
