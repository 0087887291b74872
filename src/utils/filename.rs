//! Filename sanitization and on-disk collision resolution.
//!
//! Unlike a blanket "replace with underscore" sanitizer, each reserved
//! character here maps to a specific stand-in chosen to stay readable in
//! the resolved filename (`:` becomes ` - `, `"` becomes `'`, and so on).
//! Windows reserved device names are still guarded against, the same way
//! as any other cross-platform filename sanitizer would.

/// Reserved character substitutions, applied in sequence.
const SUBSTITUTIONS: &[(char, &str)] = &[
    (':', " - "),
    ('/', "_"),
    ('\\', "_"),
    ('?', ""),
    ('"', "'"),
    ('<', "["),
    ('>', "]"),
    ('|', "-"),
    ('*', "_"),
];

/// Windows reserved device names (case-insensitive).
const WINDOWS_RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Sanitize a metadata value (title, channel name, ...) for use as part of
/// a filename.
///
/// Applies the reserved-character substitution table, trims trailing
/// whitespace and dots, then guards against Windows reserved device names
/// by prefixing an underscore. Idempotent: sanitizing twice yields the
/// same result as sanitizing once.
///
/// ```
/// use ytfetchd::utils::filename::sanitize;
///
/// assert_eq!(sanitize("Artist: Live"), "Artist -  Live");
/// assert_eq!(sanitize("a/b\\c"), "a_b_c");
/// assert_eq!(sanitize("what?"), "what");
/// assert_eq!(sanitize("trailing...   "), "trailing");
/// assert_eq!(sanitize("CON"), "_CON");
/// ```
pub fn sanitize(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match SUBSTITUTIONS.iter().find(|(ch, _)| *ch == c) {
            Some((_, replacement)) => result.push_str(replacement),
            None => result.push(c),
        }
    }

    let trimmed = result.trim_end_matches(|c: char| c == ' ' || c == '.');

    let upper = trimmed.to_uppercase();
    for reserved in WINDOWS_RESERVED_NAMES {
        if upper == *reserved || upper.starts_with(&format!("{reserved}.")) {
            return format!("_{trimmed}");
        }
    }

    trimmed.to_string()
}

/// Resolve a collision-free path for `target`. If `target` does not
/// exist, it is returned unchanged. Otherwise the base name is suffixed
/// with `" (N)"` for increasing `N` starting at 2, stopping at the first
/// candidate that does not exist.
///
/// There is a TOCTOU window between this check and a caller's eventual
/// create/rename; under heavy concurrency a caller should retry on an
/// `AlreadyExists`-class error rather than trust this check alone.
pub fn unique_path(target: &std::path::Path) -> std::path::PathBuf {
    if !target.exists() {
        return target.to_path_buf();
    }

    let parent = target.parent().unwrap_or_else(|| std::path::Path::new(""));
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = target.extension().map(|e| e.to_string_lossy().to_string());

    let mut n = 2u32;
    loop {
        let candidate_name = match &ext {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        let candidate = parent.join(candidate_name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
