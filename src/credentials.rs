//! Session cookies and the composed credential bundle stored as `API_HEADERS`.

use crate::audit::redact_secret;
use std::fmt;

/// Trilium session cookie.
pub const SESSION_COOKIE: &str = "trilium.sid";
/// CSRF double-submit cookie.
pub const CSRF_COOKIE: &str = "_csrf";

#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookies {
    pub sid: String,
    pub csrf: String,
}

impl SessionCookies {
    /// Pick both cookies out of a `Cookie` header value (`name=value; name=value`).
    /// Missing header, missing cookie or empty value is an error.
    pub fn from_cookie_header(header: Option<&str>) -> anyhow::Result<Self> {
        let header = header.unwrap_or("");
        let sid = cookie_value(header, SESSION_COOKIE);
        let csrf = cookie_value(header, CSRF_COOKIE);
        match (sid, csrf) {
            (Some(sid), Some(csrf)) => Ok(Self {
                sid: sid.to_string(),
                csrf: csrf.to_string(),
            }),
            _ => anyhow::bail!(
                "required cookies not found ({} or {})",
                SESSION_COOKIE,
                CSRF_COOKIE
            ),
        }
    }
}

impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCookies")
            .field("sid", &redact_secret(&self.sid))
            .field("csrf", &redact_secret(&self.csrf))
            .finish()
    }
}

/// First non-empty value for `name`.
fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// `Cookie: trilium.sid=<sid>; _csrf=<csrf>, x-csrf-token: <token>`
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialBundle(String);

impl CredentialBundle {
    pub fn compose(cookies: &SessionCookies, csrf_token: &str) -> Self {
        Self(format!(
            "Cookie: {}={}; {}={}, x-csrf-token: {}",
            SESSION_COOKIE, cookies.sid, CSRF_COOKIE, cookies.csrf, csrf_token
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CredentialBundle")
            .field(&redact_secret(&self.0))
            .finish()
    }
}
