//! URL sanitization: the boundary function between caller-supplied request
//! URLs and everything downstream that trusts them (template resolution,
//! the extractor driver, the size estimator).
//!
//! Only a fixed set of media-platform hosts is accepted, and only a fixed
//! set of query parameters survives — `v` (video id), `list` (playlist
//! id), `t` (start offset). Everything else about the URL (scheme casing,
//! extra parameters, fragment) is discarded rather than passed through.

const ALLOWED_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

const ALLOWED_QUERY_PARAMS: &[&str] = &["v", "list", "t"];

/// Sanitize a request URL: reject anything not `http(s)` with an
/// allow-listed host, and rebuild the query string keeping only
/// [`ALLOWED_QUERY_PARAMS`] in their original relative order.
///
/// Returns `None` for non-absolute URLs, disallowed protocols, or hosts
/// outside the whitelist.
pub fn sanitize(url: &str) -> Option<String> {
    let (scheme, rest) = if let Some(rest) = url.strip_prefix("https://") {
        ("https", rest)
    } else if let Some(rest) = url.strip_prefix("http://") {
        ("http", rest)
    } else {
        return None;
    };

    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let host = &rest[..authority_end];
    if host.is_empty() || !ALLOWED_HOSTS.iter().any(|allowed| host.eq_ignore_ascii_case(allowed)) {
        return None;
    }

    let after_authority = &rest[authority_end..];
    let query_start = after_authority.find('?');
    let path = match query_start {
        Some(q) => &after_authority[..q],
        None => after_authority.split('#').next().unwrap_or(""),
    };
    let query = query_start
        .map(|q| after_authority[q + 1..].split('#').next().unwrap_or(""))
        .unwrap_or("");
    let kept: Vec<String> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let key = pair.split('=').next().unwrap_or("");
            ALLOWED_QUERY_PARAMS
                .contains(&key)
                .then(|| pair.to_string())
        })
        .collect();

    let mut out = format!("{scheme}://{host}{path}");
    if !kept.is_empty() {
        out.push('?');
        out.push_str(&kept.join("&"));
    }
    Some(out)
}
