//! trilium-csrf-refresh — refresh Trilium CSRF/session headers for MCPHub.
//!
//! Logs in to Trilium, scrapes the CSRF token and session cookies, and writes them as
//! `env.API_HEADERS` of one server entry in MCPHub's `mcp_settings.json`.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod audit;
mod client;
mod config;
mod credentials;
mod login_cookie;
mod scrape;
mod settings;

use client::Session;
use config::{DEFAULT_BASE_URL, DEFAULT_MCP_SETTINGS, DEFAULT_SERVER, RefreshConfig};
use credentials::{CredentialBundle, SessionCookies};
use settings::McpSettings;

#[derive(Parser)]
#[command(name = "trilium-csrf-refresh")]
#[command(
    author,
    version,
    about = "Refresh Trilium CSRF/session headers for MCPHub openapi-mcp-server"
)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,

    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the updated mcp_settings.json to stdout instead of writing it
    #[arg(long)]
    dry_run: bool,

    /// Trilium base URL
    #[arg(long, env = "TRILIUM_BASE_URL", default_value = DEFAULT_BASE_URL, value_name = "URL")]
    base_url: String,

    /// Trilium login password
    #[arg(long, env = "TRILIUM_PASSWORD", hide_env_values = true)]
    password: String,

    /// MCP server name in mcp_settings.json
    #[arg(long, default_value = DEFAULT_SERVER, value_name = "NAME")]
    server: String,

    /// Path to MCPHub mcp_settings.json (`~` and `$VAR` are expanded)
    #[arg(long, env = "MCP_SETTINGS", default_value = DEFAULT_MCP_SETTINGS, value_name = "PATH")]
    mcp_settings: String,
}

/// Ignore SIGPIPE so writes to a broken pipe return EPIPE instead of killing the process.
#[cfg(unix)]
fn ignore_sigpipe() {
    unsafe {
        let _ = nix::sys::signal::signal(
            nix::sys::signal::Signal::SIGPIPE,
            nix::sys::signal::SigHandler::SigIgn,
        );
    }
}
#[cfg(not(unix))]
fn ignore_sigpipe() {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    ignore_sigpipe();
    init_logging(&cli);

    let config = RefreshConfig::resolve(
        &cli.base_url,
        cli.password,
        cli.server,
        &cli.mcp_settings,
        cli.dry_run,
    )?;
    tracing::debug!(?config, "resolved config");
    run_refresh(&config).await
}

/// Init tracing on stderr (stdout carries only the result). `--quiet`/`--verbose` win, then RUST_LOG.
/// REFRESH_LOG_FORMAT=json or RUST_LOG_JSON=1 selects JSON lines.
fn init_logging(cli: &Cli) {
    let use_json = std::env::var("REFRESH_LOG_FORMAT").as_deref() == Ok("json")
        || std::env::var("RUST_LOG_JSON").as_deref() == Ok("1");
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose {
        EnvFilter::new("trilium_csrf_refresh=debug")
    } else {
        std::env::var("RUST_LOG")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| EnvFilter::try_new(s).ok())
            .unwrap_or_else(|| EnvFilter::new("trilium_csrf_refresh=warn"))
    };
    if use_json {
        let json_fmt = tracing_subscriber::fmt::format()
            .json()
            .with_current_span(false)
            .with_span_list(false);
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false)
                    .event_format(json_fmt),
            )
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

/// Login, scrape, patch, persist. Any failure propagates; `main` then exits 1 with the error on stderr.
async fn run_refresh(config: &RefreshConfig) -> anyhow::Result<()> {
    let session = Session::new()?;
    let status = login_cookie::login(&session, &config.login_url(), &config.password).await?;
    tracing::info!(base_url = %config.base_url(), status = status.as_u16(), "logged in");

    let index_url = config.index_url();
    let body = login_cookie::fetch_index(&session, &index_url).await?;
    let token = scrape::extract_csrf_token(&body)
        .context("CSRF token not found in index page")?;
    audit::log_credential_access("csrf_token", token);

    let cookies = SessionCookies::from_cookie_header(session.cookie_header(&index_url)?.as_deref())?;
    audit::log_credential_access(credentials::SESSION_COOKIE, &cookies.sid);
    audit::log_credential_access(credentials::CSRF_COOKIE, &cookies.csrf);

    let bundle = CredentialBundle::compose(&cookies, token);

    let mut settings = McpSettings::load(config.settings_path())?;
    settings.set_api_headers(&config.server, bundle.as_str())?;

    if config.dry_run {
        println!("{}", settings.to_pretty()?);
        tracing::info!(
            server = %config.server,
            path = %settings.path().display(),
            "dry-run: mcp settings not written"
        );
        return Ok(());
    }

    settings.save()?;
    println!("Updated API_HEADERS for {}", config.server);
    Ok(())
}
