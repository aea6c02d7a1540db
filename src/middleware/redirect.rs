//! Where to send the browser back to. Only same-site paths are ever used.

use axum::http::{HeaderMap, header};

/// Starts with `/`, not `//`, and carries no scheme.
pub fn is_safe_next(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains("://")
}

/// The `Referer` as a local path, when it points back at this host.
pub fn referer_path(headers: &HeaderMap) -> Option<String> {
    let referer = headers.get(header::REFERER)?.to_str().ok()?.trim();
    if is_safe_next(referer) {
        return Some(referer.to_string());
    }

    let rest = referer
        .strip_prefix("http://")
        .or_else(|| referer.strip_prefix("https://"))?;
    let (authority, path) = match rest.find('/') {
        Some(idx) => rest.split_at(idx),
        None => (rest, "/"),
    };
    let host = headers.get(header::HOST)?.to_str().ok()?;
    (authority.eq_ignore_ascii_case(host) && is_safe_next(path)).then(|| path.to_string())
}
