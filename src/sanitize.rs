//! Filesystem-safe file names for downloaded documents.

const EXTENSION: &str = ".pdf";

/// Fragments that show up inside vendor file names and carry no meaning once
/// the extension is forced.
const NOISY_SUBSTRINGS: &[&str] = &["_pdf"];

/// Turns an absolute URL into a flat, lower-case file name ending in `.pdf`.
///
/// Only the last path segment is used. Every character outside `[a-z0-9]`
/// becomes `_`, runs of `_` collapse, edge underscores are trimmed and noisy
/// substrings are removed before the extension is appended.
///
/// An empty input (or one with no alphanumerics in its last segment) yields
/// the bare extension `.pdf`.
pub fn sanitize(url: &str) -> String {
    let lower = url.to_lowercase();
    let segment = last_segment(&lower);

    let mut safe = String::with_capacity(segment.len() + EXTENSION.len());
    for ch in segment.chars() {
        let ch = if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            ch
        } else {
            '_'
        };
        if ch == '_' && safe.ends_with('_') {
            continue;
        }
        safe.push(ch);
    }
    let mut safe = safe.trim_matches('_').to_owned();

    for noisy in NOISY_SUBSTRINGS {
        safe = safe.replace(noisy, "");
    }

    if !safe.ends_with(EXTENSION) {
        safe.push_str(EXTENSION);
    }
    safe
}

fn last_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or_default()
}
