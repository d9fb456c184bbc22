// src/config.rs
// =============================================================================
// Runtime configuration for the proxy.
//
// Everything is read once at startup (environment + optional .env file) and
// then handed to the components that need it. Nothing reads the environment
// at request time, so tests can build a Config pointing at a local fake
// upstream without touching process state.
//
// Environment variables:
//   GITHUB_TOKEN             optional credential (blank = none)
//   GITHUB_APP_NAME          User-Agent sent upstream
//   GITHUB_API_BASE          REST API base URL
//   GITHUB_RAW_BASE          raw file host used for README images
//   GITHUB_WEB_BASE          web host used for README links
//   GITHUB_TIMEOUT_SECS      optional per-request timeout
//   PORTFOLIO_BIND           server bind address
//   PORTFOLIO_DEFAULT_OWNER  owner used when a bare repo name is given
//   PORTFOLIO_CATALOGUE      path to a projects JSON file (bundled otherwise)
// =============================================================================

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_RAW_BASE: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_WEB_BASE: &str = "https://github.com";
pub const DEFAULT_USER_AGENT: &str = "portfolio-api";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Settings for talking to GitHub.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Token used for the first attempt of every request.
    pub token: Option<String>,
    pub user_agent: String,
    pub api_base: String,
    pub raw_base: String,
    pub web_base: String,
    /// Per-request timeout. `None` leaves reqwest's default (no timeout).
    pub timeout: Option<Duration>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            raw_base: DEFAULT_RAW_BASE.to_string(),
            web_base: DEFAULT_WEB_BASE.to_string(),
            timeout: None,
        }
    }
}

impl GithubConfig {
    /// Same defaults, but every upstream host points at `base`.
    ///
    /// Used by tests that stand up a single fake server.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            api_base: base.clone(),
            raw_base: format!("{}/raw", base),
            web_base: format!("{}/web", base),
            ..Self::default()
        }
    }
}

/// Top-level configuration for the server and CLI.
#[derive(Debug, Clone)]
pub struct Config {
    pub github: GithubConfig,
    pub bind: String,
    pub default_owner: Option<String>,
    pub catalogue_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GithubConfig::default(),
            bind: DEFAULT_BIND.to_string(),
            default_owner: None,
            catalogue_path: None,
        }
    }
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present;
    /// variables already set in the environment win over the file.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is normal, so the result is ignored
        let _ = dotenvy::dotenv();

        let timeout = match non_empty("GITHUB_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("GITHUB_TIMEOUT_SECS is not a number: {}", raw))?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let github = GithubConfig {
            token: non_empty("GITHUB_TOKEN"),
            user_agent: non_empty("GITHUB_APP_NAME")
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            api_base: base_url("GITHUB_API_BASE", DEFAULT_API_BASE),
            raw_base: base_url("GITHUB_RAW_BASE", DEFAULT_RAW_BASE),
            web_base: base_url("GITHUB_WEB_BASE", DEFAULT_WEB_BASE),
            timeout,
        };

        Ok(Self {
            github,
            bind: non_empty("PORTFOLIO_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            default_owner: non_empty("PORTFOLIO_DEFAULT_OWNER"),
            catalogue_path: non_empty("PORTFOLIO_CATALOGUE").map(PathBuf::from),
        })
    }
}

// Reads a variable, treating unset and whitespace-only the same way
fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn base_url(key: &str, default: &str) -> String {
    non_empty(key)
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}
