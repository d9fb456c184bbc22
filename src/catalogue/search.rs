// src/catalogue/search.rs
// =============================================================================
// Loading, filtering and paging the project catalogue.
//
// How search works:
// 1. Narrow by category ("All" or no category = every project)
// 2. Lower-case the trimmed query; an empty query matches everything
// 3. Build a haystack per project: title, description, category and tags
//    joined by spaces, lower-cased
// 4. Keep projects whose haystack contains the query
//
// Paging is cumulative, like an infinite-scroll list: page N shows the first
// N * 12 matches, and `has_more` says whether scrolling further would reveal
// anything.
//
// The catalogue holds a few dozen entries, so a linear scan per query is fine.
// =============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Matches shown per page increment.
pub const PAGE_SIZE: usize = 12;

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

const BUNDLED: &str = include_str!("../../data/projects.json");

/// One entry in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Project {
    // Everything a query is matched against, lower-cased
    fn haystack(&self) -> String {
        let mut parts = vec![
            self.title.as_str(),
            self.description.as_str(),
            self.category.as_str(),
        ];
        if let Some(tags) = &self.tags {
            parts.extend(tags.iter().map(String::as_str));
        }
        parts.join(" ").to_lowercase()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogueFile {
    #[serde(default)]
    projects: Vec<Project>,
}

/// Filter parameters for [`Catalogue::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    pub category: Option<String>,
    pub text: Option<String>,
}

/// One cumulative page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<'a> {
    pub page: usize,
    /// Matches before paging.
    pub total: usize,
    pub has_more: bool,
    pub projects: Vec<&'a Project>,
}

/// The immutable project list.
#[derive(Debug, Clone)]
pub struct Catalogue {
    projects: Vec<Project>,
}

impl Catalogue {
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }

    /// Parses a `{ "projects": [...] }` document.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogueFile =
            serde_json::from_str(json).context("catalogue is not valid project JSON")?;
        Ok(Self::new(file.projects))
    }

    /// The dataset compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalogue {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Loads from `path` when given, otherwise the bundled dataset.
    pub fn load_or_bundled(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Every category with its project count, sorted by name.
    pub fn categories(&self) -> Vec<(String, usize)> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for p in &self.projects {
            *counts.entry(p.category.as_str()).or_insert(0) += 1;
        }
        counts
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect()
    }

    /// Projects matching the category and text filter, in catalogue order.
    pub fn search(&self, query: &SearchQuery) -> Vec<&Project> {
        let category = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES);
        let needle = query
            .text
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());

        self.projects
            .iter()
            .filter(|p| category.map_or(true, |c| p.category == c))
            .filter(|p| {
                needle
                    .as_deref()
                    .map_or(true, |n| p.haystack().contains(n))
            })
            .collect()
    }

    /// Searches and returns the first `page * PAGE_SIZE` matches.
    ///
    /// Page numbers below 1 are treated as 1.
    pub fn page(&self, query: &SearchQuery, page: usize) -> Page<'_> {
        let page = page.max(1);
        let matches = self.search(query);
        let total = matches.len();
        let visible: Vec<&Project> = matches.into_iter().take(PAGE_SIZE * page).collect();
        Page {
            page,
            total,
            has_more: visible.len() < total,
            projects: visible,
        }
    }
}
