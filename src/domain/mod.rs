//! Core data model: job inputs, mutable progress, and the naming templates
//! persisted by the Settings Store.

pub mod job;
pub mod progress;
pub mod templates;

pub use job::{AudioFormat, ContentType, JobOptions, Mode, SubtitleLanguage, SubtitleOptions};
pub use progress::{DownloadResult, JobProgress, JobStatus, Stage};
pub use templates::NamingTemplates;
