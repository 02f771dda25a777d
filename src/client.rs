//! HTTP session: two reqwest clients sharing one cookie jar.
//!
//! The login client never follows redirects (the 302 after login carries the session
//! cookie and must be observed as-is). The browse client follows redirects as usual.

use anyhow::Context;
use reqwest::{Client, Url};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::redirect::Policy;
use std::sync::Arc;
use std::time::Duration;

/// Fixed per-request timeout (connect and total).
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

pub struct Session {
    jar: Arc<Jar>,
    login: Client,
    browse: Client,
}

impl Session {
    pub fn new() -> anyhow::Result<Self> {
        let jar = Arc::new(Jar::default());
        let login = build_client(&jar, Policy::none()).context("build login client")?;
        let browse = build_client(&jar, Policy::default()).context("build session client")?;
        Ok(Self { jar, login, browse })
    }

    /// Client for the login POST (redirects disabled).
    pub fn login_client(&self) -> &Client {
        &self.login
    }

    /// Client for requests after login (redirects followed).
    pub fn client(&self) -> &Client {
        &self.browse
    }

    /// `Cookie` header value the jar would send to `url`, e.g. `a=1; b=2`. None when no cookie matches.
    pub fn cookie_header(&self, url: &str) -> anyhow::Result<Option<String>> {
        let url = Url::parse(url).with_context(|| format!("invalid cookie url: {:?}", url))?;
        Ok(self
            .jar
            .cookies(&url)
            .and_then(|v| v.to_str().ok().map(str::to_string)))
    }
}

fn build_client(jar: &Arc<Jar>, redirect: Policy) -> reqwest::Result<Client> {
    let timeout = Duration::from_secs(REQUEST_TIMEOUT_SECS);
    Client::builder()
        .cookie_provider(Arc::clone(jar))
        .redirect(redirect)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
}
