// src/github/repos.rs
// =============================================================================
// Repository listing and single-repository lookups.
//
// Listing strategy:
// - Ask for 100 repos per page (GitHub's maximum), newest update first
// - Keep requesting the next page until one comes back short
// - Any failing page aborts the whole listing: a partial list would silently
//   hide repositories from the portfolio
//
// Also here: lookups by owner/name and by numeric id, and the optional
// "latest commit" / "latest release" enrichments.
// =============================================================================

use reqwest::StatusCode;
use tracing::{debug, info};

use super::client::{upstream_error, GithubClient};
use super::models::{
    LatestCommit, LatestRelease, RawCommit, RawRelease, RawRepository, RepoSummary,
};
use crate::error::ApiResult;

/// GitHub's maximum page size for repository listings.
pub const PAGE_SIZE: usize = 100;

// Path segments are user input; escape anything that is not URL-safe
pub(crate) fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

/// Lists every repository owned by `user`, most recently updated first.
pub async fn list_repos(client: &GithubClient, user: &str) -> ApiResult<Vec<RepoSummary>> {
    let mut repos: Vec<RepoSummary> = Vec::new();
    let mut page = 1;

    loop {
        let path = format!(
            "/users/{}/repos?per_page={}&page={}&type=owner&sort=updated&direction=desc",
            segment(user),
            PAGE_SIZE,
            page
        );
        let chunk: Vec<RawRepository> = client.get_json(&path).await?;
        let len = chunk.len();
        debug!(user, page, len, "fetched repository page");

        repos.extend(chunk.into_iter().map(RepoSummary::from));

        // A short page is the last page
        if len < PAGE_SIZE {
            break;
        }
        page += 1;
    }

    sort_by_updated(&mut repos);
    info!(user, count = repos.len(), "listed repositories");
    Ok(repos)
}

/// Newest `updated_at` first; repositories without a timestamp go last.
///
/// The sort is stable, so upstream order is kept for ties.
pub fn sort_by_updated(repos: &mut [RepoSummary]) {
    repos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// Looks up a repository by owner and name.
pub async fn lookup_repo(client: &GithubClient, owner: &str, repo: &str) -> ApiResult<RepoSummary> {
    let path = format!("/repos/{}/{}", segment(owner), segment(repo));
    let raw: RawRepository = client.get_json(&path).await?;
    Ok(raw.into())
}

/// Looks up a repository by its numeric id.
pub async fn lookup_repo_by_id(client: &GithubClient, id: u64) -> ApiResult<RepoSummary> {
    let raw: RawRepository = client.get_json(&format!("/repositories/{}", id)).await?;
    Ok(raw.into())
}

/// Newest commit on the default branch, or `None` for an empty repository.
pub async fn latest_commit(
    client: &GithubClient,
    owner: &str,
    repo: &str,
) -> ApiResult<Option<LatestCommit>> {
    let path = format!("/repos/{}/{}/commits?per_page=1", segment(owner), segment(repo));
    let response = client.get(&path).await?;

    // GitHub answers 409 Conflict for a repository with no commits
    if response.status() == StatusCode::CONFLICT {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(upstream_error(response).await);
    }

    let body = response.text().await?;
    let commits: Vec<RawCommit> = serde_json::from_str(&body)?;
    Ok(commits.into_iter().next().map(LatestCommit::from))
}

/// Latest published release, or `None` if the repository has none.
pub async fn latest_release(
    client: &GithubClient,
    owner: &str,
    repo: &str,
) -> ApiResult<Option<LatestRelease>> {
    let path = format!("/repos/{}/{}/releases/latest", segment(owner), segment(repo));
    let response = client.get(&path).await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(upstream_error(response).await);
    }

    let body = response.text().await?;
    let release: RawRelease = serde_json::from_str(&body)?;
    Ok(Some(release.into()))
}

/// Resolves a repository's numeric id from owner and name.
pub async fn repo_id(client: &GithubClient, owner: &str, repo: &str) -> ApiResult<u64> {
    lookup_repo(client, owner, repo).await.map(|r| r.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GithubConfig;
    use crate::github::models::fixtures::repo_json;
    use crate::test_support::{spawn_fake, Recorder};
    use axum::extract::{Query, State};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    fn client_for(base: &str) -> GithubClient {
        GithubClient::new(GithubConfig::with_base(base)).unwrap()
    }

    // 100 repos on page 1, 3 on page 2; update times decrease with the index
    async fn paged_repos(
        State(rec): State<Recorder>,
        Query(q): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        rec.record(None);
        let page: usize = q.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        assert_eq!(q.get("per_page").map(String::as_str), Some("100"));
        let (start, count) = if page == 1 { (0, 100) } else if page == 2 { (100, 3) } else { (0, 0) };
        let repos: Vec<Value> = (start..start + count)
            .map(|i| {
                let minutes = 59 - (i % 60);
                let hour = 23 - (i / 60);
                repo_json(
                    i as u64 + 1,
                    "acme",
                    &format!("repo-{}", i),
                    &format!("2024-05-01T{:02}:{:02}:00Z", hour, minutes),
                )
            })
            .collect();
        Json(Value::Array(repos))
    }

    #[tokio::test]
    async fn test_list_repos_follows_pages_until_short_page() {
        let rec = Recorder::default();
        let app = Router::new()
            .route("/users/{user}/repos", get(paged_repos))
            .with_state(rec.clone());
        let base = spawn_fake(app).await;
        let client = client_for(&base);

        let repos = list_repos(&client, "acme").await.unwrap();
        assert_eq!(repos.len(), 103);
        assert_eq!(rec.count(), 2);
        // Newest first
        assert!(repos
            .windows(2)
            .all(|w| w[0].updated_at >= w[1].updated_at));
    }

    #[tokio::test]
    async fn test_list_repos_is_idempotent() {
        let rec = Recorder::default();
        let app = Router::new()
            .route("/users/{user}/repos", get(paged_repos))
            .with_state(rec);
        let base = spawn_fake(app).await;
        let client = client_for(&base);

        let first: Vec<u64> = list_repos(&client, "acme").await.unwrap().iter().map(|r| r.id).collect();
        let second: Vec<u64> = list_repos(&client, "acme").await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_repos_aborts_on_failing_page() {
        let app = Router::new().route(
            "/users/{user}/repos",
            get(|| async {
                (
                    axum::http::StatusCode::NOT_FOUND,
                    Json(json!({ "message": "Not Found" })),
                )
            }),
        );
        let base = spawn_fake(app).await;
        let client = client_for(&base);

        let err = list_repos(&client, "ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_empty_repository_has_no_latest_commit() {
        let app = Router::new()
            .route(
                "/repos/{owner}/{repo}/commits",
                get(|| async { (axum::http::StatusCode::CONFLICT, "Git Repository is empty.") }),
            )
            .route(
                "/repos/{owner}/{repo}/releases/latest",
                get(|| async { (axum::http::StatusCode::NOT_FOUND, "{}") }),
            );
        let base = spawn_fake(app).await;
        let client = client_for(&base);

        assert_eq!(latest_commit(&client, "a", "b").await.unwrap(), None);
        assert_eq!(latest_release(&client, "a", "b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_repo_id_lookup() {
        let app = Router::new().route(
            "/repos/{owner}/{repo}",
            get(|| async { Json(repo_json(4242, "acme", "widgets", "2024-01-01T00:00:00Z")) }),
        );
        let base = spawn_fake(app).await;
        let client = client_for(&base);

        assert_eq!(repo_id(&client, "acme", "widgets").await.unwrap(), 4242);
    }

    #[test]
    fn test_segment_escapes_path_input() {
        assert_eq!(segment("acme"), "acme");
        assert_eq!(segment("a/b"), "a%2Fb");
    }
}
