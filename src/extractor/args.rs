//! Command-line argument construction for the extractor subprocess.

use std::path::Path;

use crate::domain::job::{JobOptions, Mode};

/// Name of the credentials file the driver looks for in the process's
/// working directory; passed via `--cookies` when present.
const COOKIES_FILE_NAME: &str = "cookies.txt";

/// Map a user-facing quality tag to the extractor's format selector.
///
/// Shared with the Size Estimator, which must use the same selector the
/// real download would so its byte estimate matches.
pub fn quality_selector(quality: &str) -> String {
    if quality.eq_ignore_ascii_case("highest") {
        return "best[ext=mp4]".to_string();
    }
    if let Some(height) = quality.strip_suffix('p').and_then(|h| h.parse::<u32>().ok()) {
        return format!(
            "bestvideo[height<={height}][ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]"
        );
    }
    // Unrecognized tags fall through to the extractor's own "best" default
    // rather than failing the job outright.
    "best[ext=mp4]".to_string()
}

/// Build the argument vector for one job, in the exact order the
/// extractor expects them.
pub fn build_args(options: &JobOptions, working_dir: &Path) -> Vec<String> {
    let mut args = Vec::new();

    match options.mode {
        Mode::Video => {
            let quality = options.quality.as_deref().unwrap_or("highest");
            args.push("-f".to_string());
            args.push(quality_selector(quality));
            args.push("--remux-video=mp4".to_string());
        }
        Mode::Audio => {
            args.push("-x".to_string());
            let format = options.format.map(|f| f.as_extractor_arg()).unwrap_or("mp3");
            args.push(format!("--audio-format={format}"));
            args.push("--audio-quality=0".to_string());
        }
    }

    let output_folder = options.effective_output_folder();
    args.push("-o".to_string());
    args.push(format!(
        "{}/{}.%(ext)s",
        output_folder.trim_end_matches('/'),
        options.temp_basename()
    ));

    args.push("--no-warnings".to_string());
    args.push("--newline".to_string());

    if options.mode == Mode::Video && options.subtitles.download_subtitles {
        args.push("--embed-subs".to_string());
        if options.subtitles.language == crate::domain::job::SubtitleLanguage::En {
            args.push("--sub-langs".to_string());
            args.push("en.*".to_string());
        }
    }

    let cookies_path = working_dir.join(COOKIES_FILE_NAME);
    if cookies_path.exists() {
        args.push("--cookies".to_string());
        args.push(cookies_path.to_string_lossy().to_string());
    }

    args.push(options.url.clone());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{AudioFormat, SubtitleLanguage, SubtitleOptions};

    fn base_options(mode: Mode) -> JobOptions {
        JobOptions {
            url: "https://youtube.com/watch?v=abc".to_string(),
            video_id: "abc".to_string(),
            job_id: "J".to_string(),
            output_folder: "/tmp/out".to_string(),
            mode,
            quality: Some("1080p".to_string()),
            format: Some(AudioFormat::Mp3),
            estimated_bytes: 0,
            resolved_filename: None,
            subtitles: SubtitleOptions::default(),
            create_per_channel_folder: false,
            channel: None,
            playlist_index: None,
        }
    }

    #[test]
    fn video_mode_includes_quality_selector_and_remux() {
        let options = base_options(Mode::Video);
        let args = build_args(&options, Path::new("/nonexistent"));
        assert_eq!(args[0], "-f");
        assert!(args[1].contains("height<=1080"));
        assert!(args.contains(&"--remux-video=mp4".to_string()));
    }

    #[test]
    fn highest_quality_maps_to_best_mp4() {
        let mut options = base_options(Mode::Video);
        options.quality = Some("highest".to_string());
        let args = build_args(&options, Path::new("/nonexistent"));
        assert_eq!(args[1], "best[ext=mp4]");
    }

    #[test]
    fn audio_mode_includes_extract_and_format_flags() {
        let options = base_options(Mode::Audio);
        let args = build_args(&options, Path::new("/nonexistent"));
        assert_eq!(args[0], "-x");
        assert!(args.contains(&"--audio-format=mp3".to_string()));
        assert!(args.contains(&"--audio-quality=0".to_string()));
    }

    #[test]
    fn output_template_uses_temp_basename() {
        let options = base_options(Mode::Audio);
        let args = build_args(&options, Path::new("/nonexistent"));
        let o_index = args.iter().position(|a| a == "-o").unwrap();
        assert_eq!(args[o_index + 1], "/tmp/out/J.temp.%(ext)s");
    }

    #[test]
    fn subtitles_add_embed_flag_only_in_video_mode() {
        let mut options = base_options(Mode::Video);
        options.subtitles = SubtitleOptions {
            download_subtitles: true,
            language: SubtitleLanguage::En,
        };
        let args = build_args(&options, Path::new("/nonexistent"));
        assert!(args.contains(&"--embed-subs".to_string()));
        assert!(args.contains(&"en.*".to_string()));
    }

    #[test]
    fn url_is_the_final_argument() {
        let options = base_options(Mode::Video);
        let args = build_args(&options, Path::new("/nonexistent"));
        assert_eq!(args.last().unwrap(), &options.url);
    }
}
