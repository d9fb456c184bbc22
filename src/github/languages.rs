// src/github/languages.rs
// =============================================================================
// Per-repository language breakdowns.
//
// For each repository we fetch its byte-count-per-language map, turn it into
// percentages, and build a short summary for the language bar: the top four
// languages plus an "Other" bucket for the rest.
//
// Fan-out:
// - Six requests in flight at most (keeps us well inside GitHub's secondary
//   rate limits for a portfolio-sized account)
// - A repository whose languages can't be fetched gets an empty map; the
//   rest of the batch carries on
// - Output order == input order (see fanout::map_ordered)
// =============================================================================

use tracing::warn;

use super::client::GithubClient;
use super::models::{
    LanguageMap, LanguagePercent, LanguageShare, LatestCommit, LatestRelease, RepoDetail,
    RepoSummary,
};
use super::repos::{latest_commit, latest_release};
use crate::fanout::map_ordered;

/// Maximum concurrent upstream requests during aggregation.
pub const CONCURRENCY: usize = 6;

/// Languages shown individually before the rest is folded into "Other".
pub const SUMMARY_SLOTS: usize = 4;

pub const OTHER: &str = "Other";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Converts byte counts into percentages of the total, rounded to two decimals.
///
/// An empty map (or one whose counts are all zero) yields all-zero shares
/// for the same keys.
pub fn to_percent(map: &LanguageMap) -> LanguagePercent {
    let total: u64 = map.values().sum();
    // Avoid dividing by zero for repos whose languages are all empty files
    let total = total.max(1) as f64;

    map.iter()
        .map(|(name, bytes)| (name.clone(), round2(*bytes as f64 / total * 100.0)))
        .collect()
}

/// Top languages by share, descending, with the remainder as "Other".
///
/// Ties are broken by name so the output is deterministic.
pub fn summarize(percent: &LanguagePercent) -> Vec<LanguageShare> {
    let mut entries: Vec<(&String, f64)> = percent.iter().map(|(k, v)| (k, *v)).collect();
    entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut summary: Vec<LanguageShare> = entries
        .iter()
        .take(SUMMARY_SLOTS)
        .map(|(name, pct)| LanguageShare {
            name: (*name).clone(),
            percent: *pct,
        })
        .collect();

    let rest: f64 = entries.iter().skip(SUMMARY_SLOTS).map(|(_, pct)| pct).sum();
    if rest > 0.0 {
        summary.push(LanguageShare {
            name: OTHER.to_string(),
            percent: round2(rest),
        });
    }
    summary
}

/// The first `top` language names of a summary, never including "Other".
pub fn top_names(summary: &[LanguageShare], top: usize) -> Vec<String> {
    summary
        .iter()
        .filter(|s| s.name != OTHER)
        .take(top)
        .map(|s| s.name.clone())
        .collect()
}

/// What to fetch besides the language map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub commit: bool,
    pub release: bool,
}

/// Fetches one repository's language map.
///
/// Any failure (transport, non-2xx, bad JSON) yields an empty map.
pub async fn fetch_languages(client: &GithubClient, repo: &RepoSummary) -> LanguageMap {
    match client.get_json::<LanguageMap>(&repo.languages_url).await {
        Ok(map) => map,
        Err(e) => {
            warn!(repo = %repo.full_name, error = %e, "language fetch failed, using empty map");
            LanguageMap::new()
        }
    }
}

async fn fetch_commit(client: &GithubClient, repo: &RepoSummary) -> Option<LatestCommit> {
    match latest_commit(client, &repo.owner, &repo.name).await {
        Ok(commit) => commit,
        Err(e) => {
            warn!(repo = %repo.full_name, error = %e, "latest commit fetch failed");
            None
        }
    }
}

async fn fetch_release(client: &GithubClient, repo: &RepoSummary) -> Option<LatestRelease> {
    match latest_release(client, &repo.owner, &repo.name).await {
        Ok(release) => release,
        Err(e) => {
            warn!(repo = %repo.full_name, error = %e, "latest release fetch failed");
            None
        }
    }
}

/// Builds the detail record for a repository from an already-fetched map.
pub fn detail_from(
    summary: RepoSummary,
    languages: LanguageMap,
    top: usize,
    latest_commit: Option<LatestCommit>,
    latest_release: Option<LatestRelease>,
) -> RepoDetail {
    let language_percent = to_percent(&languages);
    let language_summary = summarize(&language_percent);
    let languages_top = top_names(&language_summary, top);
    RepoDetail {
        summary,
        languages,
        language_percent,
        language_summary,
        languages_top,
        latest_commit,
        latest_release,
    }
}

/// Aggregates languages (and optional extras) for every repository.
///
/// Returns exactly one detail per input repository, in input order.
pub async fn aggregate(
    client: &GithubClient,
    repos: Vec<RepoSummary>,
    top: usize,
    enrich: Enrichment,
) -> Vec<RepoDetail> {
    map_ordered(repos, CONCURRENCY, |repo| async move {
        let languages = fetch_languages(client, &repo).await;
        let commit = if enrich.commit {
            fetch_commit(client, &repo).await
        } else {
            None
        };
        let release = if enrich.release {
            fetch_release(client, &repo).await
        } else {
            None
        };
        detail_from(repo, languages, top, commit, release)
    })
    .await
}
