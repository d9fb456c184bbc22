// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// `serve` runs the HTTP proxy. The other subcommands call the same library
// operations directly and print the result, which is handy for checking a
// token or a catalogue file without starting the server.
// =============================================================================

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use portfolio_api::github::{Enrichment, ReadmeFormat};

#[derive(Parser, Debug)]
#[command(
    name = "portfolio-api",
    version,
    about = "GitHub proxy and project catalogue for a portfolio site",
    long_about = "portfolio-api serves GitHub repository listings, language breakdowns and \
                  rendered READMEs to a portfolio front end, plus a searchable catalogue of \
                  local projects. Configuration comes from the environment (or a .env file); \
                  flags override it."
)]
pub struct Cli {
    /// Owner assumed for bare repository names (overrides PORTFOLIO_DEFAULT_OWNER)
    #[arg(long, global = true)]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    ///
    /// Example: portfolio-api serve --bind 0.0.0.0:8080
    Serve {
        /// Address to listen on (overrides PORTFOLIO_BIND)
        #[arg(long)]
        bind: Option<String>,

        /// Projects JSON file (overrides PORTFOLIO_CATALOGUE)
        #[arg(long)]
        catalogue: Option<PathBuf>,
    },

    /// List a user's repositories with their language breakdowns
    ///
    /// Example: portfolio-api repos octocat --limit 5 --include commit,release
    Repos {
        /// GitHub user or organisation (falls back to --owner)
        user: Option<String>,

        /// Only the N most recently updated repositories
        #[arg(long)]
        limit: Option<usize>,

        /// How many language names to list per repository
        #[arg(long, default_value_t = 3)]
        top: usize,

        /// Extra data to fetch per repository
        #[arg(long, value_enum, value_delimiter = ',')]
        include: Vec<Extra>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print a repository's README
    ///
    /// Example: portfolio-api readme rust-lang/rust --format raw
    Readme {
        /// Numeric repository id, `owner/name`, a GitHub URL, or a bare name
        target: String,

        /// html (rendered, links rewritten) or raw (markdown source)
        #[arg(long, default_value = "html")]
        format: ReadmeFormat,
    },

    /// Search the project catalogue
    ///
    /// Example: portfolio-api projects --query webgl
    Projects {
        /// Free-text filter over title, description, category and tags
        #[arg(long, short)]
        query: Option<String>,

        /// Restrict to one category ("All" for every category)
        #[arg(long)]
        category: Option<String>,

        /// Cumulative page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Projects JSON file (overrides PORTFOLIO_CATALOGUE)
        #[arg(long)]
        catalogue: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Per-repository extras for `repos --include`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extra {
    Commit,
    Release,
}

/// Folds the `--include` list into what the aggregator understands.
pub fn enrichment(extras: &[Extra]) -> Enrichment {
    Enrichment {
        commit: extras.contains(&Extra::Commit),
        release: extras.contains(&Extra::Release),
    }
}
