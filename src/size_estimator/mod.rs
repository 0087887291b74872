//! The Size Estimator: a pre-flight `--skip-download` query against the
//! extractor, used both to size a job before it starts and to answer the
//! standalone `/api/filesize` request.
//!
//! The audio-format size projection is applied in exactly one place per
//! consumer path: [`estimate_projected_bytes`] (the `/api/filesize`
//! response) applies it once at query time, while a job's
//! `JobOptions.estimated_bytes` is seeded from the *raw*
//! [`estimate_raw_bytes`] total — the Progress Accountant re-applies the
//! same factor on every progress read, so seeding a pre-projected number
//! there would double it.

use std::path::Path;
use std::process::Stdio;

use serde_json::Value;
use tokio::process::Command;

use crate::domain::job::{AudioFormat, Mode};

#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    #[error("failed to spawn extractor: {0}")]
    SpawnFailed(String),
    #[error("invalid playlist-items spec: {0}")]
    InvalidPlaylistItems(String),
}

/// Validate the extractor's `--playlist-items` grammar: a comma-separated
/// list where each element is either an integer or an `A-B` range.
pub fn validate_playlist_items(spec: &str) -> Result<(), EstimatorError> {
    for element in spec.split(',') {
        let element = element.trim();
        if element.is_empty() {
            return Err(EstimatorError::InvalidPlaylistItems(spec.to_string()));
        }
        let valid = match element.split_once('-') {
            Some((a, b)) => !a.is_empty() && !b.is_empty() && a.parse::<u32>().is_ok() && b.parse::<u32>().is_ok(),
            None => element.parse::<u32>().is_ok(),
        };
        if !valid {
            return Err(EstimatorError::InvalidPlaylistItems(spec.to_string()));
        }
    }
    Ok(())
}

pub struct SizeEstimator {
    program: String,
}

impl SizeEstimator {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Sum of `filesize`/`filesize_approx` across every NDJSON record the
    /// extractor reports for `url`, with no audio projection applied.
    pub async fn estimate_raw_bytes(
        &self,
        url: &str,
        mode: Mode,
        quality: Option<&str>,
        playlist_items: Option<&str>,
        working_dir: &Path,
    ) -> Result<u64, EstimatorError> {
        if let Some(spec) = playlist_items {
            validate_playlist_items(spec)?;
        }

        let mut command = process_utils::tokio_command(&self.program);
        command
            .current_dir(working_dir)
            .arg("--skip-download")
            .arg("-j")
            .arg("--ignore-errors")
            .arg("--no-warnings");

        if mode == Mode::Video {
            let selector = quality.unwrap_or("highest");
            command.arg("-f").arg(crate::extractor::args::quality_selector(selector));
        }

        if let Some(spec) = playlist_items {
            command.arg("--playlist-items").arg(spec);
        }

        command.arg(url);
        command.stdout(Stdio::piped()).stderr(Stdio::null());

        let output = command
            .output()
            .await
            .map_err(|e| EstimatorError::SpawnFailed(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(sum_ndjson_filesizes(&stdout))
    }

    /// The raw estimate, with the audio-format projection factor applied
    /// when `mode == Audio` and a format is given. This is what
    /// `/api/filesize` returns.
    pub async fn estimate_projected_bytes(
        &self,
        url: &str,
        mode: Mode,
        quality: Option<&str>,
        format: Option<AudioFormat>,
        playlist_items: Option<&str>,
        working_dir: &Path,
    ) -> Result<u64, EstimatorError> {
        let raw = self
            .estimate_raw_bytes(url, mode, quality, playlist_items, working_dir)
            .await?;

        Ok(match (mode, format) {
            (Mode::Audio, Some(format)) => (raw as f64 * format.projection_factor()).round() as u64,
            _ => raw,
        })
    }
}

/// Sum `filesize` (preferred) or `filesize_approx` across one NDJSON
/// record per line, ignoring lines that fail to parse.
fn sum_ndjson_filesizes(ndjson: &str) -> u64 {
    ndjson
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .map(|record| {
            record
                .get("filesize")
                .and_then(Value::as_u64)
                .or_else(|| record.get("filesize_approx").and_then(Value::as_u64))
                .unwrap_or(0)
        })
        .sum()
}
