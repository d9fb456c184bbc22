// src/github/models.rs
// =============================================================================
// Typed views of the GitHub JSON we consume, and the shapes we hand back.
//
// Upstream payloads are decoded into private `Raw*` structs that mirror
// GitHub's field names. Optional or sometimes-missing fields default instead
// of failing; a payload with the wrong shape (e.g. `id` as a string) is a
// decode error. The public types are what our own endpoints serialize, in
// camelCase for the page components.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Language name -> bytes of code, as returned by `/languages`.
pub type LanguageMap = BTreeMap<String, u64>;

/// Language name -> share of the total, in percent (two decimals).
pub type LanguagePercent = BTreeMap<String, f64>;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawOwner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawLicense {
    #[serde(default)]
    pub name: Option<String>,
}

/// One entry of `/users/{user}/repos`, `/repos/{o}/{r}` or `/repositories/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawRepository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: RawOwner,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub license: Option<RawLicense>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub languages_url: Option<String>,
}

/// Snapshot of one repository, as served by `/api/github/{user}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: String,
    pub url: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub visibility: String,
    pub archived: bool,
    pub fork: bool,
    pub primary_language: Option<String>,
    pub topics: Vec<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    #[serde(rename = "sizeKB")]
    pub size_kb: u64,
    pub license: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub default_branch: String,
    pub languages_url: String,
}

impl From<RawRepository> for RepoSummary {
    fn from(raw: RawRepository) -> Self {
        // Older payloads have no `visibility`, only the `private` flag
        let visibility = raw.visibility.unwrap_or_else(|| {
            if raw.private { "private" } else { "public" }.to_string()
        });
        // An empty homepage string means "none"
        let homepage = raw.homepage.filter(|h| !h.trim().is_empty());
        let languages_url = raw
            .languages_url
            .unwrap_or_else(|| format!("/repos/{}/languages", raw.full_name));

        RepoSummary {
            id: raw.id,
            name: raw.name,
            full_name: raw.full_name,
            owner: raw.owner.login,
            url: raw.html_url,
            description: raw.description,
            homepage,
            visibility,
            archived: raw.archived,
            fork: raw.fork,
            primary_language: raw.language,
            topics: raw.topics,
            stars: raw.stargazers_count,
            forks: raw.forks_count,
            watchers: raw.watchers_count,
            open_issues: raw.open_issues_count,
            size_kb: raw.size,
            license: raw.license.and_then(|l| l.name),
            updated_at: raw.updated_at,
            pushed_at: raw.pushed_at,
            default_branch: raw.default_branch.unwrap_or_else(|| "main".to_string()),
            languages_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCommitAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCommitDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: Option<RawCommitAuthor>,
}

/// One entry of `/repos/{o}/{r}/commits`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCommit {
    pub sha: String,
    pub commit: RawCommitDetail,
    pub html_url: String,
}

/// Most recent commit on the default branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestCommit {
    pub sha: String,
    /// Subject line only.
    pub message: String,
    pub author: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub url: String,
}

impl From<RawCommit> for LatestCommit {
    fn from(raw: RawCommit) -> Self {
        let message = raw.commit.message.lines().next().unwrap_or("").to_string();
        let (author, date) = match raw.commit.author {
            Some(a) => (a.name, a.date),
            None => (None, None),
        };
        LatestCommit {
            sha: raw.sha,
            message,
            author,
            date,
            url: raw.html_url,
        }
    }
}

/// `/repos/{o}/{r}/releases/latest`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawRelease {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestRelease {
    pub tag: String,
    pub name: Option<String>,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<RawRelease> for LatestRelease {
    fn from(raw: RawRelease) -> Self {
        LatestRelease {
            tag: raw.tag_name,
            name: raw.name.filter(|n| !n.is_empty()),
            url: raw.html_url,
            published_at: raw.published_at,
        }
    }
}

/// One slice of the language bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    pub name: String,
    pub percent: f64,
}

/// A repository plus everything `/api/github/repos` adds to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoDetail {
    #[serde(flatten)]
    pub summary: RepoSummary,
    pub languages: LanguageMap,
    pub language_percent: LanguagePercent,
    pub language_summary: Vec<LanguageShare>,
    pub languages_top: Vec<String>,
    pub latest_commit: Option<LatestCommit>,
    pub latest_release: Option<LatestRelease>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::repo_json;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_repository() {
        let raw: RawRepository =
            serde_json::from_value(repo_json(7, "acme", "widgets", "2024-05-01T10:00:00Z"))
                .unwrap();
        let summary = RepoSummary::from(raw);
        assert_eq!(summary.id, 7);
        assert_eq!(summary.full_name, "acme/widgets");
        assert_eq!(summary.owner, "acme");
        assert_eq!(summary.license.as_deref(), Some("MIT License"));
        assert_eq!(summary.homepage, None);
        assert_eq!(summary.visibility, "public");
    }

    #[test]
    fn test_decode_defaults_missing_fields() {
        let raw: RawRepository = serde_json::from_value(json!({
            "id": 1,
            "name": "bare",
            "full_name": "me/bare",
            "owner": { "login": "me" },
            "html_url": "https://github.com/me/bare",
            "private": true,
            "pushed_at": null
        }))
        .unwrap();
        let summary = RepoSummary::from(raw);
        assert_eq!(summary.visibility, "private");
        assert!(summary.topics.is_empty());
        assert_eq!(summary.default_branch, "main");
        assert_eq!(summary.languages_url, "/repos/me/bare/languages");
        assert!(summary.pushed_at.is_none());
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let result = serde_json::from_value::<RawRepository>(json!({
            "id": "not-a-number",
            "name": "x",
            "full_name": "a/x",
            "owner": { "login": "a" },
            "html_url": "https://github.com/a/x"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let raw: RawRepository =
            serde_json::from_value(repo_json(7, "acme", "widgets", "2024-05-01T10:00:00Z"))
                .unwrap();
        let value = serde_json::to_value(RepoSummary::from(raw)).unwrap();
        assert_eq!(value["fullName"], "acme/widgets");
        assert_eq!(value["openIssues"], 0);
        assert_eq!(value["sizeKB"], 120);
        assert_eq!(value["primaryLanguage"], "Rust");
    }

    #[test]
    fn test_latest_commit_keeps_subject_line() {
        let raw: RawCommit = serde_json::from_value(json!({
            "sha": "abc123",
            "html_url": "https://github.com/a/b/commit/abc123",
            "commit": {
                "message": "Fix parser\n\nLonger body here",
                "author": { "name": "Dev", "date": "2024-01-02T03:04:05Z" }
            }
        }))
        .unwrap();
        let commit = LatestCommit::from(raw);
        assert_eq!(commit.message, "Fix parser");
        assert_eq!(commit.author.as_deref(), Some("Dev"));
    }
}
