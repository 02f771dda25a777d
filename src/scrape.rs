//! CSRF token scraping from the landing page HTML.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the inline script assignment `csrfToken: '<value>'`.
static CSRF_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"csrfToken: '([^']+)'").expect("csrf token regex is valid"));

/// First `csrfToken: '<value>'` in the body, or None.
pub fn extract_csrf_token(body: &str) -> Option<&str> {
    CSRF_TOKEN_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}
