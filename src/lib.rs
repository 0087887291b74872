//! ytfetchd library crate: the media-acquisition service's core logic,
//! exposed for the binary entrypoint and for integration tests.

pub mod api;
pub mod domain;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod orchestrator;
pub mod progress;
pub mod settings;
pub mod size_estimator;
pub mod template;
pub mod utils;

pub use error::{Error, Result};
