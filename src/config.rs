//! Resolved run configuration.
//!
//! Built once from CLI flags (and their env fallbacks). Base URL is validated and
//! normalized, the settings path has `~` and `$VAR` / `${VAR}` expanded via shellexpand.

use crate::audit::redact_secret;
use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://bootstrap.sphinx-alnitak.ts.net:8080";
pub const DEFAULT_SERVER: &str = "trilium";
pub const DEFAULT_MCP_SETTINGS: &str = "/xinfty/srv/ct-mcphub/mcp_settings.json";

#[derive(Clone)]
pub struct RefreshConfig {
    /// Base URL with any trailing `/` removed.
    base_url: String,
    pub password: String,
    /// Name of the entry under `mcpServers`.
    pub server: String,
    settings_path: PathBuf,
    /// Print the updated document instead of writing it.
    pub dry_run: bool,
}

impl RefreshConfig {
    pub fn resolve(
        base_url: &str,
        password: String,
        server: String,
        mcp_settings: &str,
        dry_run: bool,
    ) -> anyhow::Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        if password.is_empty() {
            anyhow::bail!("password must not be empty");
        }
        if server.trim().is_empty() {
            anyhow::bail!("server name must not be empty");
        }
        let settings_path = expand_path(mcp_settings)?;
        Ok(Self {
            base_url,
            password,
            server,
            settings_path,
            dry_run,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }

    pub fn index_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }
}

impl fmt::Debug for RefreshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshConfig")
            .field("base_url", &self.base_url)
            .field("password", &redact_secret(&self.password))
            .field("server", &self.server)
            .field("settings_path", &self.settings_path)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Parse and strip trailing slashes. Only http and https are accepted.
fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = Url::parse(trimmed).with_context(|| format!("invalid base url: {:?}", raw))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => anyhow::bail!("base url must be http or https, got {:?}", other),
    }
    if parsed.host_str().is_none() {
        anyhow::bail!("base url has no host: {:?}", raw);
    }
    Ok(trimmed.to_string())
}

fn expand_path(raw: &str) -> anyhow::Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| anyhow::anyhow!("mcp settings path: {} ({})", e.var_name, e.cause))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(base: &str, settings: &str) -> anyhow::Result<RefreshConfig> {
        RefreshConfig::resolve(base, "pw".into(), "trilium".into(), settings, false)
    }

    #[test]
    fn trailing_slashes_stripped_from_base_url() {
        let c = resolve("http://notes.local:8080///", "/tmp/s.json").unwrap();
        assert_eq!(c.base_url(), "http://notes.local:8080");
        assert_eq!(c.login_url(), "http://notes.local:8080/login");
        assert_eq!(c.index_url(), "http://notes.local:8080/");
    }

    #[test]
    fn base_url_with_path_prefix_kept() {
        let c = resolve("https://example.com/trilium/", "/tmp/s.json").unwrap();
        assert_eq!(c.login_url(), "https://example.com/trilium/login");
    }

    #[test]
    fn non_http_base_url_rejected() {
        let err = resolve("ftp://example.com", "/tmp/s.json").unwrap_err();
        assert!(err.to_string().contains("http or https"), "{}", err);
        assert!(resolve("not a url", "/tmp/s.json").is_err());
    }

    #[test]
    fn empty_password_rejected() {
        let err = RefreshConfig::resolve(
            DEFAULT_BASE_URL,
            String::new(),
            DEFAULT_SERVER.into(),
            DEFAULT_MCP_SETTINGS,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn settings_path_expands_env_vars() {
        // SAFETY: variable name is unique to this test.
        unsafe { std::env::set_var("TRILIUM_REFRESH_TEST_DIR", "/srv/mcphub") };
        let c = resolve(DEFAULT_BASE_URL, "${TRILIUM_REFRESH_TEST_DIR}/mcp_settings.json").unwrap();
        assert_eq!(
            c.settings_path(),
            Path::new("/srv/mcphub/mcp_settings.json")
        );
    }

    #[test]
    fn settings_path_unset_var_is_error() {
        let err = resolve(DEFAULT_BASE_URL, "$TRILIUM_REFRESH_SURELY_UNSET/x.json").unwrap_err();
        assert!(err.to_string().contains("TRILIUM_REFRESH_SURELY_UNSET"), "{}", err);
    }

    #[test]
    fn debug_hides_password() {
        let c = RefreshConfig::resolve(
            DEFAULT_BASE_URL,
            "hunter2".into(),
            DEFAULT_SERVER.into(),
            DEFAULT_MCP_SETTINGS,
            false,
        )
        .unwrap();
        let dbg = format!("{:?}", c);
        assert!(!dbg.contains("hunter2"), "{}", dbg);
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_settings_path_unchanged() {
        let c = resolve(DEFAULT_BASE_URL, DEFAULT_MCP_SETTINGS).unwrap();
        assert_eq!(c.settings_path(), Path::new(DEFAULT_MCP_SETTINGS));
    }
}
