// src/catalogue/mod.rs
// =============================================================================
// The local project catalogue shown on the portfolio's project page.
//
// Features:
// - Loaded once from a JSON file (or the dataset bundled into the binary)
// - Never mutated after loading
// - Filtered by category and free-text query, then sliced page by page
//   for infinite scrolling
// =============================================================================

mod search;

pub use search::{Catalogue, Page, Project, SearchQuery, ALL_CATEGORIES, PAGE_SIZE};
