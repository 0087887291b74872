//! Stdout event grammar: turns one completed line of extractor output
//! into zero or more progress/stage events.
//!
//! Stateless by design — each line carries enough information (the
//! destination extension, the presence of `%`, which marker strings
//! appear) to classify itself without remembering prior lines. The one
//! piece of derived state (forcing `converting` near 100% in audio mode)
//! is expressed as a function of the parsed percentage, not of history.

use crate::domain::job::Mode;
use crate::domain::progress::Stage;

/// One unit of information extracted from a single stdout line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    StageChanged(Stage),
    /// A `[download] NN.N%% of ~SIZE` line, converted to bytes.
    Progress { total_bytes: u64, downloaded_bytes: u64 },
    Converting,
}

const CONVERTING_MARKERS: &[&str] = &[
    "[ExtractAudio]",
    "[FixupM4a]",
    "[ffmpeg]",
    "[Metadata]",
    "[EmbedSubtitle]",
    "[Thumbnails]",
    "Deleting original file",
];

/// Parse one completed, `\r`-normalized line of extractor stdout.
pub fn parse_line(line: &str, mode: Mode) -> Vec<LineEvent> {
    let mut events = Vec::new();

    if line.contains("[download]") && line.contains("Destination:") {
        if let Some(stage) = stage_from_destination(line) {
            events.push(LineEvent::StageChanged(stage));
        }
        return events;
    }

    if line.contains("[Merger]") {
        events.push(LineEvent::StageChanged(Stage::Merging));
        events.push(LineEvent::Converting);
        return events;
    }

    if CONVERTING_MARKERS.iter().any(|marker| line.contains(marker)) {
        events.push(LineEvent::Converting);
        return events;
    }

    if line.contains("[download]") && line.contains('%') {
        if let Some(pct) = parse_percentage(line) {
            let total = parse_size_after_of(line).unwrap_or(0);
            let downloaded = (total as f64 * pct / 100.0).round() as u64;
            events.push(LineEvent::Progress {
                total_bytes: total,
                downloaded_bytes: downloaded,
            });
            if mode == Mode::Audio && pct >= 99.0 {
                events.push(LineEvent::Converting);
            }
        }
    }

    events
}

fn stage_from_destination(line: &str) -> Option<Stage> {
    let path = line.split("Destination:").nth(1)?.trim();
    if path.ends_with(".m4a") || path.ends_with(".mp3") || path.ends_with(".opus") {
        Some(Stage::Audio)
    } else if path.ends_with(".mp4") {
        Some(Stage::Video)
    } else {
        None
    }
}

/// Parse the first `NN.N%` occurrence in a line.
fn parse_percentage(line: &str) -> Option<f64> {
    let pct_pos = line.find('%')?;
    let before = &line[..pct_pos];
    let start = before
        .rfind(|c: char| !(c.is_ascii_digit() || c == '.'))
        .map(|idx| idx + 1)
        .unwrap_or(0);
    before[start..].parse::<f64>().ok()
}

/// Parse `of ~12.34MiB` (or the SI-counterpart units) into bytes.
fn parse_size_after_of(line: &str) -> Option<u64> {
    let of_pos = line.find(" of ")?;
    let rest = line[of_pos + 4..].trim_start().trim_start_matches('~');
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c.is_ascii_alphabetic()))
        .unwrap_or(rest.len());
    let token = &rest[..end];

    let unit_start = token.find(|c: char| c.is_ascii_alphabetic())?;
    let (num_str, unit) = token.split_at(unit_start);
    let num: f64 = num_str.parse().ok()?;

    let multiplier: f64 = match unit {
        "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0f64.powi(2),
        "GiB" => 1024.0f64.powi(3),
        "K" => 1000.0,
        "M" => 1000.0f64.powi(2),
        "G" => 1000.0f64.powi(3),
        _ => return None,
    };

    Some((num * multiplier).round() as u64)
}
