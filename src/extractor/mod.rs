//! The Extractor Driver: builds the extractor command line, supervises
//! the subprocess, and turns its stdout into progress events on the
//! [`JobRegistry`].

pub mod args;
pub mod parser;

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::ChildStdout;

use crate::domain::job::{JobOptions, Mode};
use crate::domain::progress::JobStatus;
use crate::progress::JobRegistry;
use parser::LineEvent;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("failed to spawn extractor: {0}")]
    SpawnFailed(String),
}

/// Outcome of one supervised subprocess run.
#[derive(Debug)]
pub enum DriverExit {
    Exited(ExitStatus),
    /// The subprocess handle was taken (and killed) by a concurrent
    /// pause or cancel before this run observed its natural exit.
    HandleTaken,
}

/// Invokes a configured extractor binary and streams its stdout into job
/// progress events.
pub struct ExtractorDriver {
    program: String,
}

impl ExtractorDriver {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Spawn the extractor for `job_id`, register the subprocess handle
    /// on the registry, and drive its stdout until exit or until the
    /// handle is taken by a concurrent pause/cancel.
    pub async fn run(
        &self,
        job_id: &str,
        options: &JobOptions,
        working_dir: &Path,
        registry: &Arc<JobRegistry>,
    ) -> Result<DriverExit, DriverError> {
        let args = args::build_args(options, working_dir);

        let mut command = process_utils::tokio_command(&self.program);
        command
            .args(&args)
            .current_dir(working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| DriverError::SpawnFailed(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DriverError::SpawnFailed("extractor stdout was not piped".to_string()))?;
        let stderr = child.stderr.take();

        let handle_slot = registry
            .handle(job_id)
            .ok_or_else(|| DriverError::SpawnFailed("job not registered".to_string()))?;
        {
            let mut guard = handle_slot.lock().await;
            *guard = Some(child);
        }

        if let Some(stderr) = stderr {
            tokio::spawn(log_stderr(stderr));
        }

        read_events(stdout, options.mode, job_id.to_string(), registry.clone()).await;

        let mut guard = handle_slot.lock().await;
        match guard.take() {
            Some(mut child) => {
                drop(guard);
                let status = child
                    .wait()
                    .await
                    .map_err(|e| DriverError::SpawnFailed(e.to_string()))?;
                Ok(DriverExit::Exited(status))
            }
            None => Ok(DriverExit::HandleTaken),
        }
    }
}

/// Read `stdout`, normalizing `\r` to `\n` so in-place progress rewrites
/// are treated as completed lines, and apply each line's events.
async fn read_events(stdout: ChildStdout, mode: Mode, job_id: String, registry: Arc<JobRegistry>) {
    let mut reader = BufReader::new(stdout);
    let mut pending = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        for &byte in &chunk[..n] {
            pending.push(if byte == b'\r' { b'\n' } else { byte });
        }

        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes[..line_bytes.len() - 1]).into_owned();
            if !line.is_empty() {
                apply_line(&line, mode, &job_id, &registry);
            }
        }
    }
}

fn apply_line(line: &str, mode: Mode, job_id: &str, registry: &JobRegistry) {
    for event in parser::parse_line(line, mode) {
        match event {
            LineEvent::StageChanged(stage) => registry.set_stage(job_id, stage),
            LineEvent::Progress { total_bytes, downloaded_bytes } => {
                registry.set_stage_total_bytes(job_id, total_bytes);
                registry.update_progress(job_id, downloaded_bytes);
            }
            LineEvent::Converting => registry.set_status(job_id, JobStatus::Converting),
        }
    }
}

async fn log_stderr(stderr: tokio::process::ChildStderr) {
    use tokio::io::AsyncBufReadExt;
    let mut lines = tokio::io::BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!(target: "extractor", "{line}");
    }
}
