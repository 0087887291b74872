//! Mutable per-job bookkeeping (`JobProgress`) and the statuses/stages it
//! cycles through.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Downloading,
    Paused,
    Converting,
    Completed,
    Failed,
    Canceled,
}

impl JobStatus {
    /// Terminal statuses are absorbing: once reached, further `setStatus`
    /// calls are ignored.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Canceled
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Video,
    Audio,
    Merging,
    Complete,
}

/// Final artifact location, present once `status == Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResult {
    pub file_path: String,
    pub file_name: String,
    /// Human-readable size, e.g. `"12.34 MB"`.
    pub file_size: String,
}

/// Mutable per-job progress, owned by the Progress Accountant and only ever
/// mutated through its setters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    pub total_bytes: u64,
    pub downloaded_bytes: u64,
    pub percentage: f64,
    pub speed: f64,
    pub eta: Option<f64>,
    pub status: JobStatus,
    pub stage: Stage,

    pub video_total_bytes: u64,
    pub audio_total_bytes: u64,
    pub video_downloaded_bytes: u64,
    pub audio_downloaded_bytes: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<DownloadResult>,
}

impl JobProgress {
    pub fn new(mode: crate::domain::job::Mode, estimated_bytes: u64) -> Self {
        let stage = match mode {
            crate::domain::job::Mode::Video => Stage::Video,
            crate::domain::job::Mode::Audio => Stage::Audio,
        };
        Self {
            total_bytes: estimated_bytes,
            downloaded_bytes: 0,
            percentage: 0.0,
            speed: 0.0,
            eta: None,
            status: JobStatus::Downloading,
            stage,
            video_total_bytes: 0,
            audio_total_bytes: 0,
            video_downloaded_bytes: 0,
            audio_downloaded_bytes: 0,
            error: None,
            result: None,
        }
    }
}
