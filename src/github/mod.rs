// src/github/mod.rs
// =============================================================================
// Everything that talks to GitHub.
//
// Submodules:
// - client:    request wrapper with the anonymous-retry credential fallback
// - models:    typed decoding of GitHub JSON, and our response shapes
// - repos:     paginated listing and single-repository lookups
// - languages: language percentages with bounded concurrent fetching
// - readme:    README lookup by id or name
// - rewrite:   absolute-izing relative links in rendered README HTML
// =============================================================================

mod client;
mod languages;
pub(crate) mod models;
mod readme;
mod repos;
mod rewrite;

pub use client::{authorization_value, upstream_error, GithubClient};
pub use languages::{aggregate, summarize, to_percent, top_names, Enrichment, CONCURRENCY};
pub use models::{
    LanguageMap, LanguagePercent, LanguageShare, LatestCommit, LatestRelease, RepoDetail,
    RepoSummary,
};
pub use readme::{resolve_readme, ReadmeFormat, ReadmePayload, ReadmeTarget};
pub use repos::{list_repos, lookup_repo, lookup_repo_by_id, repo_id, PAGE_SIZE};
pub use rewrite::{rewrite_readme_html, LinkBases};
