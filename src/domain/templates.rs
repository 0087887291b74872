//! The persisted naming-template bundle (`NamingTemplates`) and its
//! defaults.

use serde::{Deserialize, Serialize};

/// Per-mode filename templates, grouped by whether the job is a standalone
/// video or one entry of a playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeTemplates {
    pub video: String,
    pub audio: String,
}

/// The four user-editable filename templates, persisted by the Settings
/// Store and resolved by the Template Engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingTemplates {
    pub single: ModeTemplates,
    pub playlist: ModeTemplates,
}

impl Default for NamingTemplates {
    fn default() -> Self {
        Self {
            single: ModeTemplates {
                video: "<title> - <quality>".to_string(),
                audio: "<title>".to_string(),
            },
            playlist: ModeTemplates {
                video: "<index> - <title> - <quality>".to_string(),
                audio: "<index> - <title>".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let defaults = NamingTemplates::default();
        assert_eq!(defaults.single.video, "<title> - <quality>");
        assert_eq!(defaults.single.audio, "<title>");
        assert_eq!(defaults.playlist.video, "<index> - <title> - <quality>");
        assert_eq!(defaults.playlist.audio, "<index> - <title>");
    }
}
