//! Filename template validation and resolution.
//!
//! Templates are short user-authored strings like `<title> - <quality>`
//! that describe how a job's metadata maps onto the final filename. This
//! module validates a template against the job's content type and mode,
//! then resolves it against concrete metadata.

use chrono::Local;

use crate::domain::job::{ContentType, Mode};

/// Recognized template tags.
const KNOWN_TAGS: &[&str] = &["title", "index", "quality", "channel", "date", "format"];

/// Literal characters that may never appear outside tag syntax.
const INVALID_LITERAL_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '|', '<', '>'];

/// Distinguishable validation failure kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateErrorKind {
    Empty,
    InvalidCharacter,
    MissingMandatory(Vec<&'static str>),
    InvalidTag(String),
    InvalidIndex,
    InvalidQuality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    pub kind: TemplateErrorKind,
}

impl TemplateError {
    fn new(kind: TemplateErrorKind) -> Self {
        Self { kind }
    }
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TemplateErrorKind::Empty => write!(f, "template is empty"),
            TemplateErrorKind::InvalidCharacter => {
                write!(f, "template contains an invalid literal character")
            }
            TemplateErrorKind::MissingMandatory(tags) => {
                write!(f, "template is missing mandatory tag(s): {}", tags.join(", "))
            }
            TemplateErrorKind::InvalidTag(tag) => write!(f, "tag <{tag}> is not allowed here"),
            TemplateErrorKind::InvalidIndex => {
                write!(f, "<index> is only allowed for playlist templates")
            }
            TemplateErrorKind::InvalidQuality => {
                write!(f, "<quality> is only allowed for video templates")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// One `<tag>` occurrence found while scanning a template, or a run of
/// literal characters.
enum Token<'a> {
    Tag(&'a str),
    Literal(&'a str),
}

/// Scan `template`, yielding literal runs and `<tag>` occurrences in
/// order. A bare `<` or `>` that is not part of a well-formed `<name>`
/// pair is treated as an illegal literal character by the caller.
fn tokenize(template: &str) -> Result<Vec<Token<'_>>, TemplateError> {
    let mut tokens = Vec::new();
    let mut rest = template;

    while !rest.is_empty() {
        match rest.find('<') {
            None => {
                tokens.push(Token::Literal(rest));
                break;
            }
            Some(0) => {
                let close = rest
                    .find('>')
                    .ok_or_else(|| TemplateError::new(TemplateErrorKind::InvalidCharacter))?;
                let name = &rest[1..close];
                if name.contains('<') || name.is_empty() {
                    return Err(TemplateError::new(TemplateErrorKind::InvalidCharacter));
                }
                tokens.push(Token::Tag(name));
                rest = &rest[close + 1..];
            }
            Some(pos) => {
                tokens.push(Token::Literal(&rest[..pos]));
                rest = &rest[pos..];
            }
        }
    }

    Ok(tokens)
}

/// Validate `template` against the content type and mode the job will run
/// under. Returns the distinguishable error kind on failure.
pub fn validate(template: &str, content_type: ContentType, mode: Mode) -> Result<(), TemplateError> {
    if template.trim().is_empty() {
        return Err(TemplateError::new(TemplateErrorKind::Empty));
    }

    let tokens = tokenize(template)?;

    let mut seen_tags = Vec::new();
    for token in &tokens {
        match token {
            Token::Literal(lit) => {
                if lit.contains(INVALID_LITERAL_CHARS) {
                    return Err(TemplateError::new(TemplateErrorKind::InvalidCharacter));
                }
            }
            Token::Tag(name) => {
                if !KNOWN_TAGS.contains(name) {
                    return Err(TemplateError::new(TemplateErrorKind::InvalidTag(name.to_string())));
                }
                if *name == "index" && content_type != ContentType::Playlist {
                    return Err(TemplateError::new(TemplateErrorKind::InvalidIndex));
                }
                if *name == "quality" && mode != Mode::Video {
                    return Err(TemplateError::new(TemplateErrorKind::InvalidQuality));
                }
                seen_tags.push(*name);
            }
        }
    }

    let mut missing = Vec::new();
    if !seen_tags.contains(&"title") {
        missing.push("title");
    }
    if content_type == ContentType::Playlist && !seen_tags.contains(&"index") {
        missing.push("index");
    }
    if mode == Mode::Video && !seen_tags.contains(&"quality") {
        missing.push("quality");
    }
    if !missing.is_empty() {
        return Err(TemplateError::new(TemplateErrorKind::MissingMandatory(missing)));
    }

    Ok(())
}

/// Concrete metadata a validated template is resolved against.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    pub title: String,
    pub channel: Option<String>,
    pub quality: Option<String>,
    pub format: Option<String>,
    pub index: Option<u32>,
}

/// Resolve a validated template into a final filename (without
/// extension). Does not itself validate; callers must call
/// [`validate`] first.
pub fn resolve(template: &str, ctx: &ResolveContext) -> String {
    let today = Local::now().format("%d-%m-%Y").to_string();

    let mut out = template.to_string();
    out = out.replace("<title>", &crate::utils::filename::sanitize(&ctx.title));
    if let Some(channel) = &ctx.channel {
        out = out.replace("<channel>", &crate::utils::filename::sanitize(channel));
    }
    out = out.replace("<date>", &today);
    if let Some(format) = &ctx.format {
        out = out.replace("<format>", &format.to_uppercase());
    }
    if let Some(quality) = &ctx.quality {
        out = out.replace("<quality>", &quality.to_uppercase());
    }
    if let Some(index) = ctx.index {
        out = out.replace("<index>", &format!("{index:02}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_minimal_single_video_template() {
        assert!(validate("<title> - <quality>", ContentType::Single, Mode::Video).is_ok());
    }

    #[test]
    fn rejects_empty_template() {
        assert_eq!(
            validate("   ", ContentType::Single, Mode::Audio).unwrap_err().kind,
            TemplateErrorKind::Empty
        );
    }

    #[test]
    fn playlist_video_missing_mandatory_lists_index_and_quality() {
        let err = validate("<title>", ContentType::Playlist, Mode::Video).unwrap_err();
        match err.kind {
            TemplateErrorKind::MissingMandatory(tags) => {
                assert!(tags.contains(&"index"));
                assert!(tags.contains(&"quality"));
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn single_audio_invalid_character() {
        let err = validate("<title>?", ContentType::Single, Mode::Audio).unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::InvalidCharacter);
    }

    #[test]
    fn rejects_stray_closing_angle_bracket_before_a_tag() {
        let err = validate("a>b<title>", ContentType::Single, Mode::Audio).unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::InvalidCharacter);
    }

    #[test]
    fn rejects_stray_closing_angle_bracket_with_no_tag_at_all() {
        let err = validate("<title> extra>stuff", ContentType::Single, Mode::Audio).unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::InvalidCharacter);
    }

    #[test]
    fn single_video_rejects_index_tag() {
        let err = validate(
            "<index> - <title> - <quality>",
            ContentType::Single,
            Mode::Video,
        )
        .unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::InvalidIndex);
    }

    #[test]
    fn audio_mode_rejects_quality_tag() {
        let err = validate("<title> - <quality>", ContentType::Single, Mode::Audio).unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::InvalidQuality);
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = validate("<title> <bogus>", ContentType::Single, Mode::Audio).unwrap_err();
        assert_eq!(err.kind, TemplateErrorKind::InvalidTag("bogus".to_string()));
    }

    #[test]
    fn resolves_title_and_quality() {
        let ctx = ResolveContext {
            title: "Some: Title".to_string(),
            quality: Some("1080p".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve("<title> - <quality>", &ctx), "Some -  Title - 1080P");
    }

    #[test]
    fn resolves_index_zero_padded() {
        let ctx = ResolveContext {
            title: "Track".to_string(),
            index: Some(1),
            ..Default::default()
        };
        assert_eq!(resolve("<index> - <title>", &ctx), "01 - Track");
    }

    #[test]
    fn validation_is_a_pure_function_of_its_inputs() {
        let a = validate("<title> - <quality>", ContentType::Single, Mode::Video);
        let b = validate("<title> - <quality>", ContentType::Single, Mode::Video);
        assert_eq!(a, b);
    }

    use proptest::prelude::*;

    fn arb_content_type() -> impl Strategy<Value = ContentType> {
        prop_oneof![Just(ContentType::Single), Just(ContentType::Playlist)]
    }

    fn arb_mode() -> impl Strategy<Value = Mode> {
        prop_oneof![Just(Mode::Video), Just(Mode::Audio)]
    }

    proptest! {
        #[test]
        fn prop_validation_is_pure(
            template in "(<title>|<index>|<quality>|<channel>|<date>|<format>|[a-zA-Z0-9 -]){0,6}",
            content_type in arb_content_type(),
            mode in arb_mode(),
        ) {
            let a = validate(&template, content_type, mode);
            let b = validate(&template, content_type, mode);
            prop_assert_eq!(a, b);
        }
    }
}
