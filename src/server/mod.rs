//! HTTP server exposing the GitHub proxy and the project catalogue.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/github/{user}` | All repositories of a user |
//! | `GET` | `/api/github/repos` | Repositories with language breakdowns (`user`, `limit`, `top`, `include`, `timeoutMs`) |
//! | `GET` | `/api/github/readme-by-id` | Rendered README by repository id (`id`) |
//! | `GET` | `/api/github/readme` | README by name (`repo`, `owner`, `format`) |
//! | `GET` | `/api/github/repo-id` | Numeric id of a repository (`user`, `repo`) |
//! | `GET` | `/api/projects` | Catalogue search (`q`, `category`, `page`) |
//! | `GET` | `/health` | Liveness and version |
//!
//! # Error contract
//!
//! Failures are JSON bodies tagged with a machine-readable `error`:
//!
//! ```json
//! { "error": "github_error", "status": 404, "message": "Not Found" }
//! ```
//!
//! Successful reads carry `Cache-Control: s-maxage=…, stale-while-revalidate=…`;
//! errors carry `Cache-Control: no-store`.
//!
//! A client that disconnects mid-request drops the handler future, which
//! cancels its in-flight upstream requests.

mod routes;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalogue::Catalogue;
use crate::config::Config;
use crate::github::GithubClient;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub github: GithubClient,
    pub catalogue: Arc<Catalogue>,
    /// Owner assumed when a request names a repository without one.
    pub default_owner: Option<String>,
}

impl AppState {
    pub fn new(github: GithubClient, catalogue: Catalogue, default_owner: Option<String>) -> Self {
        Self {
            github,
            catalogue: Arc::new(catalogue),
            default_owner,
        }
    }

    /// Builds the state described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let github =
            GithubClient::new(config.github.clone()).context("failed to build HTTP client")?;
        let catalogue = Catalogue::load_or_bundled(config.catalogue_path.as_deref())?;
        Ok(Self::new(github, catalogue, config.default_owner.clone()))
    }
}

/// The full application router.
///
/// The literal `/api/github/...` routes take priority over `/api/github/{user}`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/github/repos", get(routes::repos))
        .route("/api/github/readme-by-id", get(routes::readme_by_id))
        .route("/api/github/readme", get(routes::readme))
        .route("/api/github/repo-id", get(routes::repo_id))
        .route("/api/github/{user}", get(routes::user_repos))
        .route("/api/projects", get(routes::projects))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds `config.bind` and serves until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    info!(
        projects = state.catalogue.len(),
        authenticated = config.github.token.is_some(),
        "state ready"
    );

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
