// src/main.rs
// =============================================================================
// Entry point for the portfolio-api binary.
//
// What happens here:
// 1. Install the tracing subscriber (RUST_LOG, default portfolio_api=info)
// 2. Parse command-line arguments and load configuration from the environment
// 3. Dispatch to the subcommand handler
// 4. Exit with a code: 0 = success, 1 = GitHub reported an error,
//    2 = anything unexpected (bad config, bind failure, ...)
// =============================================================================

mod cli;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use cli::{Cli, Commands};
use portfolio_api::catalogue::{Catalogue, SearchQuery};
use portfolio_api::config::Config;
use portfolio_api::error::ApiError;
use portfolio_api::github::{
    aggregate, list_repos, resolve_readme, Enrichment, GithubClient, ReadmeFormat, ReadmeTarget,
    RepoDetail,
};
use portfolio_api::{logging, server};

#[tokio::main]
async fn main() {
    logging::init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if cli.owner.is_some() {
        config.default_owner = cli.owner;
    }

    match cli.command {
        Commands::Serve { bind, catalogue } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if catalogue.is_some() {
                config.catalogue_path = catalogue;
            }
            server::run_server(&config).await?;
            Ok(0)
        }
        Commands::Repos {
            user,
            limit,
            top,
            include,
            json,
        } => {
            let user = user
                .or_else(|| config.default_owner.clone())
                .ok_or_else(|| anyhow::anyhow!("no user given and PORTFOLIO_DEFAULT_OWNER is unset"))?;
            handle_repos(&config, &user, limit, top, cli::enrichment(&include), json).await
        }
        Commands::Readme { target, format } => handle_readme(&config, &target, format).await,
        Commands::Projects {
            query,
            category,
            page,
            catalogue,
            json,
        } => {
            let path = catalogue.or_else(|| config.catalogue_path.clone());
            let catalogue = Catalogue::load_or_bundled(path.as_deref())?;
            let query = SearchQuery {
                category,
                text: query,
            };
            handle_projects(&catalogue, &query, page, json)
        }
    }
}

// GitHub failures are an expected outcome (unknown user, rate limit), so
// they print and exit 1 rather than bubbling up as exit 2
fn report(err: ApiError) -> i32 {
    eprintln!("❌ {} ({})", err, err.tag());
    1
}

async fn handle_repos(
    config: &Config,
    user: &str,
    limit: Option<usize>,
    top: usize,
    include: Enrichment,
    json: bool,
) -> Result<i32> {
    let client = GithubClient::new(config.github.clone())?;

    let mut repos = match list_repos(&client, user).await {
        Ok(repos) => repos,
        Err(e) => return Ok(report(e)),
    };
    if let Some(limit) = limit.filter(|n| *n > 0) {
        repos.truncate(limit);
    }

    if !json {
        println!("🔍 Fetching languages for {} repositories of {}", repos.len(), user);
    }
    let details = aggregate(&client, repos, top, include).await;

    if json {
        print_json(&details)?;
    } else {
        print_repo_table(&details);
    }
    Ok(0)
}

async fn handle_readme(config: &Config, target: &str, format: ReadmeFormat) -> Result<i32> {
    let target = if target.chars().all(|c| c.is_ascii_digit()) {
        ReadmeTarget::from_id_param(Some(target))
    } else {
        ReadmeTarget::from_repo_param(Some(target), None, config.default_owner.as_deref())
    };
    let target = match target {
        Ok(target) => target,
        Err(e) => return Ok(report(e)),
    };

    let client = GithubClient::new(config.github.clone())?;
    match resolve_readme(&client, &target, format).await {
        Ok(payload) => {
            println!("{}", payload.display());
            Ok(0)
        }
        Err(e) => Ok(report(e)),
    }
}

fn handle_projects(catalogue: &Catalogue, query: &SearchQuery, page: usize, json: bool) -> Result<i32> {
    let page = catalogue.page(query, page);

    if json {
        print_json(&page)?;
        return Ok(0);
    }

    println!("{:<24} {:<16} {:<40}", "TITLE", "CATEGORY", "TAGS");
    println!("{}", "=".repeat(80));
    for project in &page.projects {
        let tags = project.tags.as_deref().unwrap_or_default().join(", ");
        println!("{:<24} {:<16} {:<40}", project.title, project.category, tags);
    }
    println!();
    println!(
        "📋 Showing {} of {} match(es){}",
        page.projects.len(),
        page.total,
        if page.has_more { ", more on the next page" } else { "" }
    );
    Ok(0)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_repo_table(details: &[RepoDetail]) {
    println!("{:<32} {:>6} {:<20} {:<40}", "REPOSITORY", "STARS", "UPDATED", "LANGUAGES");
    println!("{}", "=".repeat(100));

    for d in details {
        let name = if d.summary.name.len() > 30 {
            format!("{}...", &d.summary.name[..27])
        } else {
            d.summary.name.clone()
        };
        let updated = d
            .summary
            .updated_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let languages = d
            .language_summary
            .iter()
            .map(|s| format!("{} {:.1}%", s.name, s.percent))
            .collect::<Vec<_>>()
            .join(", ");

        println!("{:<32} {:>6} {:<20} {:<40}", name, d.summary.stars, updated, languages);
        if let Some(commit) = &d.latest_commit {
            println!("    └ commit {}: {}", &commit.sha[..commit.sha.len().min(7)], commit.message);
        }
        if let Some(release) = &d.latest_release {
            println!("    └ release {}", release.tag);
        }
    }

    println!();
    println!("📊 {} repositories", details.len());
}
