// src/github/readme.rs
// =============================================================================
// Resolves and fetches a repository's README.
//
// Steps:
// 1. Work out which repository is meant. Callers pass either a numeric
//    repository id (looked up via /repositories/{id}) or an owner + name.
// 2. Fetch /repos/{owner}/{repo}/readme with an Accept header asking GitHub
//    to render it (HTML) or to return the markdown source (raw).
// 3. If GitHub sent HTML back, rewrite relative image and link targets so
//    they work when embedded in another site (see rewrite.rs).
//
// Error tags surfaced to callers:
//   missing_params  no id / repo given
//   invalid_id      id is not a number
//   github_error    lookup or README request answered non-2xx
//   unknown_error   network failure, undecodable body
// =============================================================================

use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::client::{upstream_error, GithubClient, ACCEPT_HTML, ACCEPT_RAW};
use super::repos::{lookup_repo_by_id, segment};
use super::rewrite::{rewrite_readme_html, LinkBases};
use crate::error::{ApiError, ApiResult};

/// Which repository's README to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadmeTarget {
    Id(u64),
    Name { owner: String, repo: String },
}

impl ReadmeTarget {
    /// Parses the `id` query parameter.
    pub fn from_id_param(id: Option<&str>) -> ApiResult<Self> {
        let id = id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::missing("Required query: id"))?;

        id.parse::<u64>()
            .map(ReadmeTarget::Id)
            .map_err(|_| ApiError::InvalidId {
                message: format!("id must be a positive integer, got {:?}", id),
            })
    }

    /// Parses a repository reference.
    ///
    /// Accepts `name` (owner taken from `owner` or `default_owner`),
    /// `owner/name`, or a full `https://github.com/owner/name` URL.
    pub fn from_repo_param(
        repo: Option<&str>,
        owner: Option<&str>,
        default_owner: Option<&str>,
    ) -> ApiResult<Self> {
        let repo = repo
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::missing("Required query: repo"))?;

        let (owner_part, name) = split_repo(repo)
            .ok_or_else(|| ApiError::missing("Required query: repo (URL has no repository)"))?;

        let owner = owner_part
            .or(owner.map(str::trim).filter(|s| !s.is_empty()))
            .or(default_owner)
            .ok_or_else(|| ApiError::missing("Required query: owner (or repo as owner/name)"))?;

        if name.is_empty() {
            return Err(ApiError::missing("Required query: repo"));
        }

        Ok(ReadmeTarget::Name {
            owner: owner.to_string(),
            repo: name.to_string(),
        })
    }
}

// Splits "owner/name", a GitHub URL or bare "name". URL prefixes are only
// recognised on URL forms, so a bare "www.site.com" stays a repository name.
// None when a URL names an owner but no repository.
fn split_repo(raw: &str) -> Option<(Option<&str>, &str)> {
    let raw = raw.trim_end_matches('/');
    let url_path = match raw.strip_prefix("https://").or_else(|| raw.strip_prefix("http://")) {
        // The host is dropped whatever it is
        Some(rest) => Some(rest.split_once('/').map_or("", |(_, path)| path)),
        None => raw.strip_prefix("github.com/"),
    };

    match url_path {
        Some(path) => {
            let mut parts = path.split('/');
            let owner = parts.next().filter(|s| !s.is_empty())?;
            let name = parts.next().filter(|s| !s.is_empty())?;
            Some((Some(owner), strip_git(name)))
        }
        None => match raw.split_once('/') {
            Some((owner, rest)) => {
                let name = rest.split('/').next().unwrap_or("");
                Some((Some(owner).filter(|o| !o.is_empty()), strip_git(name)))
            }
            None => Some((None, strip_git(raw))),
        },
    }
}

fn strip_git(name: &str) -> &str {
    name.strip_suffix(".git").unwrap_or(name)
}

/// How the README should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadmeFormat {
    /// Rendered by GitHub to HTML.
    #[default]
    Html,
    /// Markdown source as committed.
    Raw,
}

impl ReadmeFormat {
    fn accept(self) -> &'static str {
        match self {
            ReadmeFormat::Html => ACCEPT_HTML,
            ReadmeFormat::Raw => ACCEPT_RAW,
        }
    }
}

impl FromStr for ReadmeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" => Ok(ReadmeFormat::Html),
            "raw" | "markdown" | "md" => Ok(ReadmeFormat::Raw),
            other => Err(format!("unknown README format: {} (use html or raw)", other)),
        }
    }
}

impl fmt::Display for ReadmeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadmeFormat::Html => write!(f, "html"),
            ReadmeFormat::Raw => write!(f, "raw"),
        }
    }
}

/// A fetched README.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadmePayload {
    pub owner: String,
    pub repo: String,
    /// `Html` only when GitHub actually returned HTML.
    pub format: ReadmeFormat,
    /// Body exactly as GitHub returned it.
    pub content: String,
    /// Content with absolute links, present for HTML.
    pub rewritten: Option<String>,
}

impl ReadmePayload {
    /// What a page should render: the rewritten HTML when there is one.
    pub fn display(&self) -> &str {
        self.rewritten.as_deref().unwrap_or(&self.content)
    }
}

/// Resolves `target` to owner/name and fetches its README.
pub async fn resolve_readme(
    client: &GithubClient,
    target: &ReadmeTarget,
    format: ReadmeFormat,
) -> ApiResult<ReadmePayload> {
    let (owner, repo) = match target {
        ReadmeTarget::Id(id) => {
            let found = lookup_repo_by_id(client, *id).await?;
            (found.owner, found.name)
        }
        ReadmeTarget::Name { owner, repo } => (owner.clone(), repo.clone()),
    };

    let path = format!("/repos/{}/{}/readme", segment(&owner), segment(&repo));
    let response = client.get_with_accept(&path, format.accept()).await?;
    if !response.status().is_success() {
        return Err(upstream_error(response).await);
    }

    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("html"))
        .unwrap_or(false);
    let content = response.text().await?;
    debug!(%owner, %repo, is_html, bytes = content.len(), "fetched README");

    let (format, rewritten) = if is_html {
        let config = client.config();
        let rewritten = match LinkBases::for_repo(&config.raw_base, &config.web_base, &owner, &repo)
        {
            Ok(bases) => rewrite_readme_html(&content, &bases),
            // Unparseable base URL: serve the document as GitHub rendered it
            Err(_) => content.clone(),
        };
        (ReadmeFormat::Html, Some(rewritten))
    } else {
        (ReadmeFormat::Raw, None)
    };

    Ok(ReadmePayload {
        owner,
        repo,
        format,
        content,
        rewritten,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GithubConfig;
    use crate::github::models::fixtures::repo_json;
    use crate::test_support::spawn_fake;
    use axum::extract::Path;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    // A fake GitHub that knows one repository, id 7 = acme/widgets
    fn fake_github() -> Router {
        Router::new()
            .route(
                "/repositories/{id}",
                get(|Path(id): Path<u64>| async move {
                    if id == 7 {
                        Json(repo_json(7, "acme", "widgets", "2024-01-01T00:00:00Z")).into_response()
                    } else {
                        (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" })))
                            .into_response()
                    }
                }),
            )
            .route(
                "/repos/{owner}/{repo}/readme",
                get(
                    |Path((owner, repo)): Path<(String, String)>, headers: HeaderMap| async move {
                        if (owner.as_str(), repo.as_str()) != ("acme", "widgets") {
                            return (StatusCode::NOT_FOUND, Json(json!({ "message": "Not Found" })))
                                .into_response();
                        }
                        let accept = headers
                            .get(header::ACCEPT)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("")
                            .to_string();
                        if accept.contains("html") {
                            (
                                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                                r#"<div id="readme"><img src="assets/pic.png"><a href="LICENSE">license</a></div>"#,
                            )
                                .into_response()
                        } else {
                            (
                                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                                "# widgets\n",
                            )
                                .into_response()
                        }
                    },
                ),
            )
    }

    async fn client() -> (GithubClient, String) {
        let base = spawn_fake(fake_github()).await;
        (GithubClient::new(GithubConfig::with_base(&base)).unwrap(), base)
    }

    #[test]
    fn test_id_param_validation() {
        assert_eq!(ReadmeTarget::from_id_param(Some("42")).unwrap(), ReadmeTarget::Id(42));
        assert_eq!(ReadmeTarget::from_id_param(None).unwrap_err().tag(), "missing_params");
        assert_eq!(ReadmeTarget::from_id_param(Some("  ")).unwrap_err().tag(), "missing_params");
        assert_eq!(ReadmeTarget::from_id_param(Some("abc")).unwrap_err().tag(), "invalid_id");
        assert_eq!(ReadmeTarget::from_id_param(Some("-3")).unwrap_err().tag(), "invalid_id");
    }

    #[test]
    fn test_repo_param_forms() {
        let expected = ReadmeTarget::Name {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
        };
        assert_eq!(
            ReadmeTarget::from_repo_param(Some("acme/widgets"), None, None).unwrap(),
            expected
        );
        assert_eq!(
            ReadmeTarget::from_repo_param(Some("widgets"), Some("acme"), None).unwrap(),
            expected
        );
        assert_eq!(
            ReadmeTarget::from_repo_param(Some("widgets"), None, Some("acme")).unwrap(),
            expected
        );
        assert_eq!(
            ReadmeTarget::from_repo_param(Some("https://github.com/acme/widgets.git"), None, None)
                .unwrap(),
            expected
        );
    }

    #[test]
    fn test_repo_param_needs_an_owner() {
        let err = ReadmeTarget::from_repo_param(Some("widgets"), None, None).unwrap_err();
        assert_eq!(err.tag(), "missing_params");
        let err = ReadmeTarget::from_repo_param(Some("acme/"), None, None).unwrap_err();
        assert_eq!(err.tag(), "missing_params");
    }

    #[test]
    fn test_bare_www_name_is_kept_whole() {
        assert_eq!(
            ReadmeTarget::from_repo_param(Some("www.example.com"), None, Some("acme")).unwrap(),
            ReadmeTarget::Name {
                owner: "acme".to_string(),
                repo: "www.example.com".to_string(),
            }
        );
        // A URL to the same repository still drops its host
        assert_eq!(
            ReadmeTarget::from_repo_param(
                Some("https://www.github.com/acme/www.example.com/"),
                None,
                None
            )
            .unwrap(),
            ReadmeTarget::Name {
                owner: "acme".to_string(),
                repo: "www.example.com".to_string(),
            }
        );
    }

    #[test]
    fn test_owner_only_url_is_rejected() {
        for raw in ["https://github.com/acme", "github.com/acme/", "https://github.com"] {
            let err = ReadmeTarget::from_repo_param(Some(raw), None, Some("someone")).unwrap_err();
            assert_eq!(err.tag(), "missing_params", "{}", raw);
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("HTML".parse::<ReadmeFormat>().unwrap(), ReadmeFormat::Html);
        assert_eq!("raw".parse::<ReadmeFormat>().unwrap(), ReadmeFormat::Raw);
        assert!("pdf".parse::<ReadmeFormat>().is_err());
    }

    #[tokio::test]
    async fn test_readme_by_id_rewrites_html() {
        let (client, base) = client().await;
        let payload = resolve_readme(&client, &ReadmeTarget::Id(7), ReadmeFormat::Html)
            .await
            .unwrap();

        assert_eq!(payload.owner, "acme");
        assert_eq!(payload.repo, "widgets");
        assert_eq!(payload.format, ReadmeFormat::Html);
        assert!(payload.content.contains(r#"src="assets/pic.png""#));

        let html = payload.display();
        assert!(html.contains(&format!(r#"src="{}/raw/acme/widgets/HEAD/assets/pic.png""#, base)));
        assert!(html.contains(&format!(r#"href="{}/web/acme/widgets/blob/HEAD/LICENSE""#, base)));
        assert!(html.contains(r#"target="_blank""#));
    }

    #[tokio::test]
    async fn test_raw_readme_is_not_rewritten() {
        let (client, _) = client().await;
        let target = ReadmeTarget::Name {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
        };
        let payload = resolve_readme(&client, &target, ReadmeFormat::Raw).await.unwrap();
        assert_eq!(payload.format, ReadmeFormat::Raw);
        assert_eq!(payload.display(), "# widgets\n");
        assert!(payload.rewritten.is_none());
    }

    #[tokio::test]
    async fn test_unknown_id_is_github_404() {
        let (client, _) = client().await;
        let err = resolve_readme(&client, &ReadmeTarget::Id(999_999_999), ReadmeFormat::Html)
            .await
            .unwrap_err();
        match err {
            ApiError::Github { status, ref message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("expected github_error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_readme_is_github_404() {
        let (client, _) = client().await;
        let target = ReadmeTarget::Name {
            owner: "acme".to_string(),
            repo: "gadgets".to_string(),
        };
        let err = resolve_readme(&client, &target, ReadmeFormat::Html).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
