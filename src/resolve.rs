// src/resolve.rs
//! Turns operator input (bare id or storefront URL) into a numeric app id.

use once_cell::sync::Lazy;
use regex::Regex;

/// Known storefront URL shapes. The first match wins.
static URL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"/id(\d+)",
        r"/app/[^/]+/id(\d+)",
        r"itunes\.apple\.com/[^/]+/app/[^/]+/id(\d+)",
        r"apps\.apple\.com/[^/]+/app/[^/]+/id(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static url pattern"))
    .collect()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedId {
    pub id: String,
    /// True when the id was pulled out of a URL rather than given directly.
    pub from_url: bool,
}

/// Resolve `input` to an app id. `None` means the input has no recognizable id;
/// callers report a format error and stop.
pub fn resolve_app_id(input: &str) -> Option<ResolvedId> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    for re in URL_PATTERNS.iter() {
        if let Some(id) = re.captures(input).and_then(|c| c.get(1)) {
            return Some(ResolvedId {
                id: id.as_str().to_string(),
                from_url: true,
            });
        }
    }

    if input.bytes().all(|b| b.is_ascii_digit()) {
        return Some(ResolvedId {
            id: input.to_string(),
            from_url: false,
        });
    }

    None
}
