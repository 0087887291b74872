//! Immutable per-job input (`JobOptions`) and the small closed vocabularies
//! it is built from.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Acquisition mode for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Video,
    Audio,
}

/// Post-processed audio container, only meaningful when `Mode::Audio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    M4a,
    Wav,
    Opus,
}

impl AudioFormat {
    /// Multiplier correcting the extractor's source-container byte count
    /// into an estimate of the post-transcode size.
    pub fn projection_factor(self) -> f64 {
        match self {
            AudioFormat::Mp3 => 1.67,
            AudioFormat::M4a => 2.67,
            AudioFormat::Wav => 12.85,
            AudioFormat::Opus => 1.0,
        }
    }

    pub fn as_extractor_arg(self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Opus => "opus",
        }
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "m4a" => Ok(AudioFormat::M4a),
            "wav" => Ok(AudioFormat::Wav),
            "opus" => Ok(AudioFormat::Opus),
            other => Err(format!("unknown audio format: {other}")),
        }
    }
}

/// Subtitle language selection; only `auto` and `en` are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleLanguage {
    Auto,
    En,
}

impl Default for SubtitleLanguage {
    fn default() -> Self {
        SubtitleLanguage::Auto
    }
}

/// Subtitle download preferences carried on a job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubtitleOptions {
    #[serde(default)]
    pub download_subtitles: bool,
    #[serde(default)]
    pub language: SubtitleLanguage,
}

/// Whether a job targets one video or an entry within a playlist.
///
/// Not part of the wire payload; derived from whether the caller supplied a
/// playlist index, and consulted only by the Template Engine's validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Single,
    Playlist,
}

/// Immutable input for a single acquisition job. Constructed once at
/// submission time and never mutated afterwards; all mutable bookkeeping
/// lives in [`crate::domain::progress::JobProgress`].
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub url: String,
    pub video_id: String,
    pub job_id: String,
    pub output_folder: String,
    pub mode: Mode,
    pub quality: Option<String>,
    pub format: Option<AudioFormat>,
    /// Pre-computed total size estimate in bytes, from the Size Estimator.
    pub estimated_bytes: u64,
    /// Resolved final filename (no extension), from the Template Engine.
    pub resolved_filename: Option<String>,
    pub subtitles: SubtitleOptions,
    pub create_per_channel_folder: bool,
    pub channel: Option<String>,
    pub playlist_index: Option<u32>,
}

impl JobOptions {
    pub fn content_type(&self) -> ContentType {
        if self.playlist_index.is_some() {
            ContentType::Playlist
        } else {
            ContentType::Single
        }
    }

    /// The directory a job's artifacts actually land in: the user's output
    /// folder, plus a per-channel subfolder when requested.
    pub fn effective_output_folder(&self) -> String {
        if self.create_per_channel_folder {
            if let Some(channel) = &self.channel {
                let safe = crate::utils::filename::sanitize(channel);
                if !safe.is_empty() {
                    return format!("{}/{}", self.output_folder.trim_end_matches('/'), safe);
                }
            }
        }
        self.output_folder.clone()
    }

    /// Basename the extractor is told to write to, before the final rename:
    /// `<jobId>.temp`.
    pub fn temp_basename(&self) -> String {
        format!("{}.temp", self.job_id)
    }
}
