// src/github/client.rs
// =============================================================================
// Thin wrapper around reqwest for talking to the GitHub REST API.
//
// Every request carries the same standard headers:
//   - Accept (JSON by default, or HTML/raw for README rendering)
//   - X-GitHub-Api-Version
//   - User-Agent (GitHub rejects requests without one)
//   - Authorization, when a token is configured
//
// Credential fallback:
// GitHub treats a malformed or expired token as fatal even on public,
// read-only endpoints, while anonymous access to the same data still works
// (at a lower rate limit). So when a request that carried a token comes back
// 401 or 403, we retry it exactly once without the token. The retry is
// modelled as a two-state machine that can only move one way:
//
//     Authenticated --(401/403)--> Anonymous
//
// The wrapper never turns a status code into an error. Callers inspect the
// response themselves; `upstream_error` helps them build a tagged error.
// =============================================================================

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::GithubConfig;
use crate::error::{ApiError, ApiResult};

/// Default media type for REST calls.
pub const ACCEPT_JSON: &str = "application/vnd.github+json";
/// Asks GitHub to render markdown server-side.
pub const ACCEPT_HTML: &str = "application/vnd.github.html";
/// Asks GitHub for the file as-is.
pub const ACCEPT_RAW: &str = "application/vnd.github.raw";

const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

// Where a single logical request currently stands with respect to credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthState {
    Authenticated,
    Anonymous,
}

impl AuthState {
    // Returns the state to retry in, or None if the response is final
    fn after(self, status: StatusCode) -> Option<AuthState> {
        match self {
            AuthState::Authenticated
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                Some(AuthState::Anonymous)
            }
            _ => None,
        }
    }
}

/// Picks the Authorization scheme for a token.
///
/// Fine-grained tokens (`github_pat_...`) use `Bearer`; classic tokens
/// (`ghp_`, `gho_`, ...) and anything unrecognised use `token`.
pub fn authorization_value(token: &str) -> String {
    if token.starts_with("github_pat_") {
        format!("Bearer {}", token)
    } else {
        format!("token {}", token)
    }
}

/// Cheap-to-clone handle shared by every request handler.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    config: Arc<GithubConfig>,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    /// Resolves an API path (`/users/x/repos`) or passes an absolute URL through.
    pub fn url_for(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else {
            format!("{}{}", self.config.api_base, path_or_url)
        }
    }

    /// GET with the default JSON accept type.
    pub async fn get(&self, path_or_url: &str) -> reqwest::Result<Response> {
        self.get_with_accept(path_or_url, ACCEPT_JSON).await
    }

    /// GET with an explicit accept type, applying the credential fallback.
    ///
    /// Returns the raw response whatever its status; only transport-level
    /// failures are errors.
    pub async fn get_with_accept(
        &self,
        path_or_url: &str,
        accept: &str,
    ) -> reqwest::Result<Response> {
        let url = self.url_for(path_or_url);
        let mut state = if self.config.token.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        };

        loop {
            debug!(%url, ?state, "github request");
            let response = self.send_once(&url, accept, state).await?;

            match state.after(response.status()) {
                Some(next) => {
                    warn!(
                        %url,
                        status = response.status().as_u16(),
                        "credential rejected, retrying anonymously"
                    );
                    state = next;
                }
                None => return Ok(response),
            }
        }
    }

    /// GET a JSON document and decode it.
    ///
    /// Non-2xx becomes `github_error`, transport or decode failure becomes
    /// `unknown_error`.
    pub async fn get_json<T: DeserializeOwned>(&self, path_or_url: &str) -> ApiResult<T> {
        let response = self.get(path_or_url).await?;
        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_once(
        &self,
        url: &str,
        accept: &str,
        state: AuthState,
    ) -> reqwest::Result<Response> {
        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, accept)
            .header(API_VERSION_HEADER, API_VERSION)
            .header(USER_AGENT, self.config.user_agent.as_str());

        if state == AuthState::Authenticated {
            if let Some(token) = &self.config.token {
                request = request.header(AUTHORIZATION, authorization_value(token));
            }
        }

        request.send().await
    }
}

/// Converts a non-2xx response into a `github_error`.
///
/// The message comes from the JSON `message` field when the body is JSON,
/// otherwise the body text, otherwise the status reason phrase.
pub async fn upstream_error(response: Response) -> ApiError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ApiError::Github {
        status: status.as_u16(),
        message: error_message(status, &body),
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    let reason = || {
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
    };

    // A JSON body is only ever read for its `message`
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        return json
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(reason);
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        reason()
    } else {
        trimmed.to_string()
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why return reqwest::Response instead of a parsed body?
//    - README fetches need the Content-Type header and the raw text
//    - JSON callers use get_json, which layers status checking on top
//
// 2. Why is the retry a loop?
//    - AuthState::after only ever returns Some once (Authenticated ->
//      Anonymous), so the loop runs at most twice
//    - Adding states later (e.g. an app token) keeps the same shape
// -----------------------------------------------------------------------------
