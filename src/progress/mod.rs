//! The Progress Accountant: per-job bookkeeping for stage totals,
//! downloaded bytes, derived speed/ETA, status and final result.
//!
//! [`JobRegistry`] is the process-wide store of [`ActiveDownload`]
//! entries; it is the single source of mutable job state referenced by
//! both the HTTP surface and the orchestrator. It holds no reference back
//! to the orchestrator — callers pass in what they need and read back
//! plain data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::process::Child;
use tokio::sync::Mutex as AsyncMutex;

use crate::domain::job::{AudioFormat, JobOptions, Mode};
use crate::domain::progress::{DownloadResult, JobProgress, JobStatus, Stage};

/// A running (or paused) job's mutable runtime state, beyond what is
/// exposed as [`JobProgress`].
pub struct ActiveDownload {
    pub options: Arc<JobOptions>,
    /// Handle to the extractor subprocess; `None` between pause and
    /// resume, or before the first spawn completes.
    pub handle: Arc<AsyncMutex<Option<Child>>>,
    pub is_paused: bool,
    /// Set by `register` when it is called against an existing entry,
    /// guarding against re-initializing counters on resume.
    pub is_resuming: bool,
    pub start_time: Instant,
    last_sample_time: Instant,
    downloaded_bytes_at_last_sample: AtomicU64,
    pub progress: JobProgress,
}

/// Minimum interval between speed/ETA recomputation on read.
const SAMPLE_INTERVAL: std::time::Duration = std::time::Duration::from_millis(500);

/// Process-wide mapping from job id to [`ActiveDownload`]. A coarse lock
/// per shard is sufficient: operations here never perform subprocess or
/// filesystem I/O while holding an entry.
#[derive(Default)]
pub struct JobRegistry {
    entries: DashMap<String, ActiveDownload>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh entry, or (if one already exists for `job_id`) flip
    /// its status back to `downloading` without touching its counters.
    pub fn register(&self, job_id: &str, options: Arc<JobOptions>) {
        if let Some(mut entry) = self.entries.get_mut(job_id) {
            entry.is_resuming = true;
            entry.is_paused = false;
            if !entry.progress.status.is_terminal() {
                entry.progress.status = JobStatus::Downloading;
            }
            return;
        }

        let progress = JobProgress::new(options.mode, options.estimated_bytes);
        self.entries.insert(
            job_id.to_string(),
            ActiveDownload {
                options,
                handle: Arc::new(AsyncMutex::new(None)),
                is_paused: false,
                is_resuming: false,
                start_time: Instant::now(),
                last_sample_time: Instant::now(),
                downloaded_bytes_at_last_sample: AtomicU64::new(0),
                progress,
            },
        );
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.entries.contains_key(job_id)
    }

    pub fn options(&self, job_id: &str) -> Option<Arc<JobOptions>> {
        self.entries.get(job_id).map(|e| e.options.clone())
    }

    pub fn handle(&self, job_id: &str) -> Option<Arc<AsyncMutex<Option<Child>>>> {
        self.entries.get(job_id).map(|e| e.handle.clone())
    }

    pub fn set_stage_total_bytes(&self, job_id: &str, bytes: u64) {
        let Some(mut entry) = self.entries.get_mut(job_id) else {
            return;
        };
        match entry.progress.stage {
            Stage::Video => entry.progress.video_total_bytes = bytes,
            Stage::Audio | Stage::Merging | Stage::Complete => {
                entry.progress.audio_total_bytes = bytes
            }
        }
    }

    /// Transition to a new stage. Finalizes video's downloaded counter on
    /// the video→audio transition, and snaps `percentage` to 99 on
    /// entering `merging`.
    pub fn set_stage(&self, job_id: &str, stage: Stage) {
        let Some(mut entry) = self.entries.get_mut(job_id) else {
            return;
        };
        let previous = entry.progress.stage;
        if previous == Stage::Video && stage == Stage::Audio {
            entry.progress.video_downloaded_bytes = entry.progress.video_total_bytes;
        }
        entry.progress.stage = stage;
        if stage == Stage::Merging {
            entry.progress.percentage = 99.0;
            entry.progress.status = JobStatus::Converting;
        }
    }

    /// Record a new downloaded-bytes reading for the current stage and
    /// recompute the derived totals.
    pub fn update_progress(&self, job_id: &str, stage_downloaded: u64) {
        let Some(mut entry) = self.entries.get_mut(job_id) else {
            return;
        };
        match entry.progress.stage {
            Stage::Video => entry.progress.video_downloaded_bytes = stage_downloaded,
            Stage::Audio | Stage::Merging | Stage::Complete => {
                entry.progress.audio_downloaded_bytes = stage_downloaded
            }
        }

        entry.progress.downloaded_bytes =
            entry.progress.video_downloaded_bytes + entry.progress.audio_downloaded_bytes;

        if entry.progress.video_total_bytes > 0 && entry.progress.audio_total_bytes > 0 {
            entry.progress.total_bytes =
                entry.progress.video_total_bytes + entry.progress.audio_total_bytes;
        }

        if entry.progress.total_bytes > 0 {
            entry.progress.percentage = 100.0 * entry.progress.downloaded_bytes as f64
                / entry.progress.total_bytes as f64;
        }
    }

    /// Absorbing status update: ignored once the job is in a terminal
    /// status.
    pub fn set_status(&self, job_id: &str, status: JobStatus) {
        if let Some(mut entry) = self.entries.get_mut(job_id) {
            if !entry.progress.status.is_terminal() {
                entry.progress.status = status;
            }
        }
    }

    pub fn complete_download(&self, job_id: &str, final_bytes: u64, result: DownloadResult) {
        let Some(mut entry) = self.entries.get_mut(job_id) else {
            return;
        };
        if entry.progress.status.is_terminal() {
            return;
        }
        entry.progress.status = JobStatus::Completed;
        entry.progress.percentage = 100.0;
        if final_bytes > 0 {
            entry.progress.total_bytes = final_bytes;
            entry.progress.downloaded_bytes = final_bytes;
        }
        entry.progress.result = Some(result);
    }

    pub fn fail_download(&self, job_id: &str, message: impl Into<String>) {
        let Some(mut entry) = self.entries.get_mut(job_id) else {
            return;
        };
        if entry.progress.status.is_terminal() {
            return;
        }
        entry.progress.status = JobStatus::Failed;
        entry.progress.error = Some(message.into());
    }

    /// Mark the job paused. Returns the subprocess handle so the caller
    /// can terminate it without holding the registry entry locked.
    pub fn pause_download(&self, job_id: &str) -> Option<Arc<AsyncMutex<Option<Child>>>> {
        let mut entry = self.entries.get_mut(job_id)?;
        if entry.progress.status.is_terminal() {
            return None;
        }
        entry.is_paused = true;
        entry.progress.status = JobStatus::Paused;
        Some(entry.handle.clone())
    }

    /// Remove the job from the registry, returning its subprocess handle
    /// for termination. Idempotent: a second cancel on an already-removed
    /// job returns `None`.
    pub fn cancel_download(&self, job_id: &str) -> Option<Arc<AsyncMutex<Option<Child>>>> {
        let (_, entry) = self.entries.remove(job_id)?;
        Some(entry.handle)
    }

    /// Snapshot of a single job's progress, with lazy speed/ETA sampling
    /// and (for audio jobs) size projection applied to the outgoing view
    /// only.
    pub fn get_progress(&self, job_id: &str) -> Option<JobProgress> {
        let mut entry = self.entries.get_mut(job_id)?;
        sample_speed_and_eta(&mut entry);
        let options = entry.options.clone();
        let mut snapshot = entry.progress.clone();
        drop(entry);
        apply_audio_projection(&mut snapshot, options.mode, options.format);
        Some(snapshot)
    }

    /// Snapshot of every active job, keyed by job id. Used by the
    /// `downloads/active` endpoint.
    pub fn active_snapshot(&self) -> std::collections::HashMap<String, JobProgress> {
        self.entries
            .iter()
            .map(|e| e.key().clone())
            .collect::<Vec<_>>()
            .into_iter()
            .filter_map(|job_id| {
                let progress = self.get_progress(&job_id)?;
                Some((job_id, progress))
            })
            .collect()
    }
}

fn sample_speed_and_eta(entry: &mut ActiveDownload) {
    let now = Instant::now();
    if now.duration_since(entry.last_sample_time) < SAMPLE_INTERVAL {
        return;
    }

    let elapsed = now.duration_since(entry.last_sample_time).as_secs_f64();
    let downloaded = entry.progress.downloaded_bytes;
    let at_last_sample = entry.downloaded_bytes_at_last_sample.load(Ordering::Relaxed);

    if elapsed > 0.0 {
        let speed = (downloaded.saturating_sub(at_last_sample)) as f64 / elapsed;
        entry.progress.speed = speed.max(0.0);
        entry.progress.eta = if entry.progress.speed > 0.0 && entry.progress.total_bytes > 0 {
            let remaining = entry
                .progress
                .total_bytes
                .saturating_sub(entry.progress.downloaded_bytes);
            Some(remaining as f64 / entry.progress.speed)
        } else {
            None
        };
    }

    entry.last_sample_time = now;
    entry
        .downloaded_bytes_at_last_sample
        .store(downloaded, Ordering::Relaxed);
}

/// Factors correcting the extractor's source-container byte count into
/// an estimate of the post-transcode size.
fn apply_audio_projection(progress: &mut JobProgress, mode: Mode, format: Option<AudioFormat>) {
    if mode != Mode::Audio || progress.status == JobStatus::Completed {
        return;
    }
    let Some(format) = format else {
        return;
    };
    let factor = format.projection_factor();

    progress.total_bytes = (progress.total_bytes as f64 * factor).round() as u64;
    progress.audio_total_bytes = (progress.audio_total_bytes as f64 * factor).round() as u64;

    if progress.total_bytes > 0 {
        progress.percentage =
            (100.0 * progress.downloaded_bytes as f64 / progress.total_bytes as f64).min(100.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::SubtitleOptions;

    fn options(mode: Mode, format: Option<AudioFormat>) -> Arc<JobOptions> {
        Arc::new(JobOptions {
            url: "https://youtube.com/watch?v=abc".to_string(),
            video_id: "abc".to_string(),
            job_id: "job-1".to_string(),
            output_folder: "/tmp/out".to_string(),
            mode,
            quality: None,
            format,
            estimated_bytes: 0,
            resolved_filename: Some("Hello".to_string()),
            subtitles: SubtitleOptions::default(),
            create_per_channel_folder: false,
            channel: None,
            playlist_index: None,
        })
    }

    #[test]
    fn register_then_read_back_zeroed_progress() {
        let registry = JobRegistry::new();
        registry.register("job-1", options(Mode::Video, None));
        let progress = registry.get_progress("job-1").unwrap();
        assert_eq!(progress.status, JobStatus::Downloading);
        assert_eq!(progress.stage, Stage::Video);
        assert_eq!(progress.downloaded_bytes, 0);
    }

    #[test]
    fn video_to_audio_transition_finalizes_video_bytes() {
        let registry = JobRegistry::new();
        registry.register("job-1", options(Mode::Video, None));
        registry.set_stage_total_bytes("job-1", 10_000_000);
        registry.update_progress("job-1", 10_000_000);
        registry.set_stage("job-1", Stage::Audio);

        let progress = registry.get_progress("job-1").unwrap();
        assert_eq!(progress.video_downloaded_bytes, 10_000_000);
    }

    #[test]
    fn merging_snaps_percentage_to_99() {
        let registry = JobRegistry::new();
        registry.register("job-1", options(Mode::Video, None));
        registry.set_stage("job-1", Stage::Merging);
        let progress = registry.get_progress("job-1").unwrap();
        assert_eq!(progress.percentage, 99.0);
        assert_eq!(progress.status, JobStatus::Converting);
    }

    #[test]
    fn terminal_status_is_absorbing() {
        let registry = JobRegistry::new();
        registry.register("job-1", options(Mode::Video, None));
        registry.fail_download("job-1", "boom");
        registry.set_status("job-1", JobStatus::Downloading);
        let progress = registry.get_progress("job-1").unwrap();
        assert_eq!(progress.status, JobStatus::Failed);
    }

    #[test]
    fn cancel_is_idempotent() {
        let registry = JobRegistry::new();
        registry.register("job-1", options(Mode::Video, None));
        assert!(registry.cancel_download("job-1").is_some());
        assert!(registry.cancel_download("job-1").is_none());
        assert!(registry.get_progress("job-1").is_none());
    }

    #[test]
    fn pause_then_register_preserves_counters() {
        let registry = JobRegistry::new();
        registry.register("job-1", options(Mode::Video, None));
        registry.set_stage_total_bytes("job-1", 1_000);
        registry.update_progress("job-1", 400);
        registry.pause_download("job-1");

        registry.register("job-1", options(Mode::Video, None));
        let progress = registry.get_progress("job-1").unwrap();
        assert_eq!(progress.video_downloaded_bytes, 400);
        assert_eq!(progress.status, JobStatus::Downloading);
    }

    #[test]
    fn audio_projection_applies_only_to_outgoing_view() {
        let registry = JobRegistry::new();
        registry.register("job-1", options(Mode::Audio, Some(AudioFormat::Wav)));
        registry.set_stage_total_bytes("job-1", 6 * 1024 * 1024);
        registry.update_progress("job-1", 0);

        let projected = registry.get_progress("job-1").unwrap();
        assert_eq!(projected.total_bytes, (6.0 * 1024.0 * 1024.0 * 12.85).round() as u64);
    }

    #[test]
    fn percentage_never_exceeds_100() {
        let registry = JobRegistry::new();
        registry.register("job-1", options(Mode::Video, None));
        registry.set_stage_total_bytes("job-1", 100);
        registry.update_progress("job-1", 100);
        let progress = registry.get_progress("job-1").unwrap();
        assert!(progress.percentage <= 100.0);
    }
}
