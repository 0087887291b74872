//! The Job Orchestrator: owns a job's lifecycle from submission through
//! completion, failure, or cancellation, and the quarantine-then-rename
//! protocol that turns a temp artifact into its final name.
//!
//! Deliberately does not import back from [`crate::progress`] beyond the
//! [`JobRegistry`] handle it is given — the registry is a passive data
//! service the orchestrator calls, not a collaborator it is coupled to.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::job::JobOptions;
use crate::domain::progress::{DownloadResult, JobStatus};
use crate::extractor::{DriverError, DriverExit, ExtractorDriver};
use crate::progress::JobRegistry;
use crate::utils::filename::unique_path;

#[derive(Clone)]
pub struct JobOrchestrator {
    registry: Arc<JobRegistry>,
    driver: Arc<ExtractorDriver>,
    working_dir: PathBuf,
}

impl JobOrchestrator {
    pub fn new(registry: Arc<JobRegistry>, driver: Arc<ExtractorDriver>, working_dir: PathBuf) -> Self {
        Self { registry, driver, working_dir }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Steps 1-2 of the download routine, run synchronously by the HTTP
    /// handler; step 3 onward run in a background task.
    pub async fn submit(&self, options: JobOptions) -> std::io::Result<()> {
        let effective_dir = options.effective_output_folder();
        tokio::fs::create_dir_all(&effective_dir).await?;

        let job_id = options.job_id.clone();
        let options = Arc::new(options);
        self.registry.register(&job_id, options.clone());

        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.run_job(job_id, options).await });
        Ok(())
    }

    /// Re-invoke the run path for a paused job using its original
    /// options. Rejected (returns `false`) if the entry was removed by a
    /// cancel.
    pub async fn resume(&self, job_id: &str) -> bool {
        let Some(options) = self.registry.options(job_id) else {
            return false;
        };
        self.registry.register(job_id, options.clone());

        let orchestrator = self.clone();
        let job_id = job_id.to_string();
        tokio::spawn(async move { orchestrator.run_job(job_id, options).await });
        true
    }

    /// Kill the running subprocess and mark the job paused. Returns
    /// `false` if the job is not present or already terminal.
    pub async fn pause(&self, job_id: &str) -> bool {
        let Some(handle) = self.registry.pause_download(job_id) else {
            return false;
        };
        let mut guard = handle.lock().await;
        if let Some(mut child) = guard.take() {
            let _ = child.kill().await;
        }
        true
    }

    /// Kill the running subprocess (if any) and remove the job from the
    /// registry. Idempotent: a second cancel returns `false`.
    pub async fn cancel(&self, job_id: &str) -> bool {
        let Some(handle) = self.registry.cancel_download(job_id) else {
            return false;
        };
        let mut guard = handle.lock().await;
        if let Some(mut child) = guard.take() {
            let _ = child.kill().await;
        }
        true
    }

    async fn run_job(&self, job_id: String, options: Arc<JobOptions>) {
        match self.driver.run(&job_id, &options, &self.working_dir, &self.registry).await {
            Ok(DriverExit::Exited(status)) => self.handle_exit(&job_id, &options, status).await,
            Ok(DriverExit::HandleTaken) => {
                info!(job_id = %job_id, "subprocess handle taken by a concurrent pause/cancel");
            }
            Err(DriverError::SpawnFailed(msg)) => {
                warn!(job_id = %job_id, error = %msg, "extractor failed to spawn");
                self.registry.fail_download(&job_id, msg);
            }
        }
    }

    async fn handle_exit(&self, job_id: &str, options: &JobOptions, status: ExitStatus) {
        // Re-read status first: a terminate signal can produce a zero
        // exit code on some platforms, so a paused/canceled job must
        // never be mistaken for a successful completion.
        let Some(progress) = self.registry.get_progress(job_id) else {
            return; // canceled: entry already removed.
        };
        if progress.status == JobStatus::Paused {
            return;
        }

        if status.success() {
            if let Err(message) = self.complete(job_id, options).await {
                self.registry.fail_download(job_id, message);
            }
        } else {
            let code = status.code().unwrap_or(-1);
            self.registry
                .fail_download(job_id, format!("Download interrupted (code {code})"));
        }
    }

    async fn complete(&self, job_id: &str, options: &JobOptions) -> Result<(), String> {
        let effective_dir = PathBuf::from(options.effective_output_folder());
        let temp_basename = options.temp_basename();

        let src = find_artifact(&effective_dir, &temp_basename)
            .await
            .ok_or_else(|| "No complete file found".to_string())?;

        let target = resolve_target_path(&effective_dir, &src, options.resolved_filename.as_deref());
        tokio::fs::rename(&src, &target)
            .await
            .map_err(|e| e.to_string())?;

        let metadata = tokio::fs::metadata(&target).await.map_err(|e| e.to_string())?;
        let size_bytes = metadata.len();

        let result = DownloadResult {
            file_path: target.to_string_lossy().to_string(),
            file_name: target
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            file_size: format!("{:.2} MB", size_bytes as f64 / (1024.0 * 1024.0)),
        };

        self.registry.complete_download(job_id, size_bytes, result);
        Ok(())
    }
}

/// Locate the artifact a just-exited extractor produced: prefer a
/// non-`.part` file whose name starts with `temp_basename`, falling back
/// to the most recently modified non-`.part` file in the directory.
async fn find_artifact(dir: &Path, temp_basename: &str) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    let mut matching = None;
    let mut fallback: Option<(PathBuf, std::time::SystemTime)> = None;

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".part") {
            continue;
        }
        if !path.is_file() {
            continue;
        }

        if name.starts_with(temp_basename) {
            matching = Some(path.clone());
        }

        if let Ok(meta) = entry.metadata().await {
            if let Ok(modified) = meta.modified() {
                if fallback.as_ref().map(|(_, t)| modified > *t).unwrap_or(true) {
                    fallback = Some((path, modified));
                }
            }
        }
    }

    matching.or_else(|| fallback.map(|(p, _)| p))
}

/// Compute the (collision-resolved) final path for a completed artifact.
fn resolve_target_path(effective_dir: &Path, src: &Path, resolved_filename: Option<&str>) -> PathBuf {
    let ext = src.extension().map(|e| e.to_string_lossy().to_string());
    let stem = match resolved_filename {
        Some(name) => name.to_string(),
        None => {
            let raw = src.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
            crate::utils::filename::sanitize(&raw)
        }
    };

    let candidate = match &ext {
        Some(ext) => effective_dir.join(format!("{stem}.{ext}")),
        None => effective_dir.join(stem),
    };
    unique_path(&candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn finds_file_matching_temp_basename_over_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("other.mp4"), b"x").unwrap();
        fs::write(dir.path().join("J.temp.mp4"), b"x").unwrap();
        fs::write(dir.path().join("J.temp.mp4.part"), b"x").unwrap();

        let found = find_artifact(dir.path(), "J.temp").await.unwrap();
        assert_eq!(found.file_name().unwrap(), "J.temp.mp4");
    }

    #[tokio::test]
    async fn falls_back_to_most_recently_modified_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("older.mp4"), b"x").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        fs::write(dir.path().join("newer.mp4"), b"x").unwrap();

        let found = find_artifact(dir.path(), "nonexistent-prefix").await.unwrap();
        assert_eq!(found.file_name().unwrap(), "newer.mp4");
    }

    #[test]
    fn resolve_target_uses_resolved_filename_and_src_extension() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("J.temp.mp3");
        let target = resolve_target_path(dir.path(), &src, Some("Hello"));
        assert_eq!(target, dir.path().join("Hello.mp3"));
    }

    #[test]
    fn resolve_target_resolves_collisions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Hello.mp3"), b"x").unwrap();
        let src = dir.path().join("J.temp.mp3");
        let target = resolve_target_path(dir.path(), &src, Some("Hello"));
        assert_eq!(target, dir.path().join("Hello (2).mp3"));
    }

    #[test]
    fn resolve_target_falls_back_to_sanitized_source_name() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Some Title?.mp3");
        let target = resolve_target_path(dir.path(), &src, None);
        assert_eq!(target, dir.path().join("Some Title.mp3"));
    }
}
