// src/server/routes.rs
// =============================================================================
// Route handlers: parse query parameters, call into `github` / `catalogue`,
// and shape the JSON responses.
//
// Each handler returns ApiResult<Response>. ApiError implements IntoResponse,
// so every failure leaves the handler as a tagged JSON error with the right
// status code and `Cache-Control: no-store`.
// =============================================================================

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use super::AppState;
use crate::catalogue::{Page, SearchQuery};
use crate::error::{ApiError, ApiResult};
use crate::github::{
    aggregate, list_repos, repo_id as lookup_repo_id, resolve_readme, Enrichment, ReadmeFormat,
    ReadmeTarget, RepoDetail, RepoSummary,
};

/// Edge cache policy for repository listings.
pub const LIST_CACHE: &str = "s-maxage=60, stale-while-revalidate=300";
/// Edge cache policy for README documents.
pub const README_CACHE: &str = "s-maxage=120, stale-while-revalidate=600";

/// Language names in `languagesTop` unless `top` says otherwise.
pub const DEFAULT_TOP: usize = 3;

type Params = Query<HashMap<String, String>>;

fn cached<T: Serialize>(policy: &'static str, body: T) -> Response {
    ([(header::CACHE_CONTROL, policy)], Json(body)).into_response()
}

// Present and non-blank
fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> ApiResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::invalid(format!("{} must be a non-negative integer, got {:?}", key, raw)))
}

// ============ GET /health ============

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ GET /api/github/{user} ============

#[derive(Serialize)]
struct UserReposResponse {
    ok: bool,
    user: String,
    repos: Vec<RepoSummary>,
}

pub async fn user_repos(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> ApiResult<Response> {
    let repos = list_repos(&state.github, &user).await?;
    Ok(cached(
        LIST_CACHE,
        UserReposResponse {
            ok: true,
            user,
            repos,
        },
    ))
}

// ============ GET /api/github/repos ============

/// Parsed query of `/api/github/repos`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReposParams {
    pub user: String,
    pub limit: Option<usize>,
    pub top: usize,
    pub include: Enrichment,
    pub timeout: Option<Duration>,
}

impl ReposParams {
    /// Parses raw query pairs; `include` may repeat or be comma-separated.
    pub fn from_pairs(pairs: &[(String, String)], default_owner: Option<&str>) -> ApiResult<Self> {
        let mut user = None;
        let mut limit = None;
        let mut top = DEFAULT_TOP;
        let mut include = Enrichment::default();
        let mut timeout = None;

        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "user" => user = Some(value.to_string()),
                // 0 means "no limit"
                "limit" => limit = Some(parse_number::<usize>("limit", value)?).filter(|n| *n > 0),
                "top" => top = parse_number("top", value)?,
                "timeoutMs" => {
                    let ms: u64 = parse_number("timeoutMs", value)?;
                    timeout = Some(Duration::from_millis(ms)).filter(|d| !d.is_zero());
                }
                "include" => {
                    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                        match item {
                            "commit" => include.commit = true,
                            "release" => include.release = true,
                            other => {
                                return Err(ApiError::invalid(format!(
                                    "include must be commit or release, got {:?}",
                                    other
                                )))
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        let user = user
            .or_else(|| default_owner.map(str::to_string))
            .ok_or_else(|| ApiError::missing("Required query: user"))?;

        Ok(Self {
            user,
            limit,
            top,
            include,
            timeout,
        })
    }
}

#[derive(Serialize)]
struct DetailedReposResponse {
    ok: bool,
    user: String,
    repos: Vec<RepoDetail>,
}

pub async fn repos(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Response> {
    let params = ReposParams::from_pairs(&pairs, state.default_owner.as_deref())?;

    let work = async {
        let mut repos = list_repos(&state.github, &params.user).await?;
        if let Some(limit) = params.limit {
            repos.truncate(limit);
        }
        Ok::<_, ApiError>(aggregate(&state.github, repos, params.top, params.include).await)
    };

    let details = match params.timeout {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .map_err(|_| ApiError::Timeout {
                message: format!("repository aggregation exceeded {} ms", limit.as_millis()),
            })??,
        None => work.await?,
    };

    info!(user = %params.user, repos = details.len(), "served repository details");
    Ok(cached(
        LIST_CACHE,
        DetailedReposResponse {
            ok: true,
            user: params.user,
            repos: details,
        },
    ))
}

// ============ GET /api/github/readme-by-id ============

#[derive(Serialize)]
struct ReadmeByIdResponse {
    ok: bool,
    id: u64,
    owner: String,
    repo: String,
    html: String,
}

pub async fn readme_by_id(State(state): State<AppState>, Query(params): Params) -> ApiResult<Response> {
    let target = ReadmeTarget::from_id_param(params.get("id").map(String::as_str))?;
    let ReadmeTarget::Id(id) = target else {
        return Err(ApiError::Internal {
            message: "id parameter did not parse to an id".to_string(),
        });
    };

    let payload = resolve_readme(&state.github, &target, ReadmeFormat::Html).await?;
    let html = payload.display().to_string();
    Ok(cached(
        README_CACHE,
        ReadmeByIdResponse {
            ok: true,
            id,
            owner: payload.owner,
            repo: payload.repo,
            html,
        },
    ))
}

// ============ GET /api/github/readme ============

#[derive(Serialize)]
struct ReadmeResponse {
    ok: bool,
    owner: String,
    repo: String,
    format: ReadmeFormat,
    content: String,
}

pub async fn readme(State(state): State<AppState>, Query(params): Params) -> ApiResult<Response> {
    let target = ReadmeTarget::from_repo_param(
        param(&params, "repo"),
        param(&params, "owner"),
        state.default_owner.as_deref(),
    )?;
    let format = match param(&params, "format") {
        Some(raw) => raw.parse::<ReadmeFormat>().map_err(ApiError::invalid)?,
        None => ReadmeFormat::default(),
    };

    let payload = resolve_readme(&state.github, &target, format).await?;
    let content = payload.display().to_string();
    Ok(cached(
        README_CACHE,
        ReadmeResponse {
            ok: true,
            owner: payload.owner,
            repo: payload.repo,
            format: payload.format,
            content,
        },
    ))
}

// ============ GET /api/github/repo-id ============

#[derive(Serialize)]
struct RepoIdResponse {
    id: u64,
}

pub async fn repo_id(State(state): State<AppState>, Query(params): Params) -> ApiResult<Response> {
    let target = ReadmeTarget::from_repo_param(
        param(&params, "repo"),
        param(&params, "user"),
        state.default_owner.as_deref(),
    )?;
    let ReadmeTarget::Name { owner, repo } = target else {
        return Err(ApiError::Internal {
            message: "repo parameter did not parse to a name".to_string(),
        });
    };

    let id = lookup_repo_id(&state.github, &owner, &repo).await?;
    Ok(cached(LIST_CACHE, RepoIdResponse { id }))
}

// ============ GET /api/projects ============

#[derive(Serialize)]
struct CategoryCount {
    name: String,
    count: usize,
}

#[derive(Serialize)]
struct ProjectsResponse<'a> {
    ok: bool,
    #[serde(flatten)]
    page: Page<'a>,
    categories: Vec<CategoryCount>,
}

pub async fn projects(State(state): State<AppState>, Query(params): Params) -> ApiResult<Response> {
    let query = SearchQuery {
        category: param(&params, "category").map(str::to_string),
        text: param(&params, "q").map(str::to_string),
    };
    let page = match param(&params, "page") {
        Some(raw) => parse_number("page", raw)?,
        None => 1,
    };

    let catalogue = &state.catalogue;
    let categories = catalogue
        .categories()
        .into_iter()
        .map(|(name, count)| CategoryCount { name, count })
        .collect();

    Ok(cached(
        LIST_CACHE,
        ProjectsResponse {
            ok: true,
            page: catalogue.page(&query, page),
            categories,
        },
    ))
}
