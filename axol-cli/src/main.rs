//! `axol` CLI shell: loads the user's configuration,
//! builds the feed registry, and dispatches to one of the crawl/feed/prune/stats/feeds/
//! markdown/search subcommands.

mod commands;
mod config;
mod registry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{TomlUserConfig, UserConfig};
use registry::FeedRegistry;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "axol")]
#[command(version, about = "Provider-polymorphic vanity/topic-watch feed engine", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file; defaults to $XDG_CONFIG_HOME/axol/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a provider's search ad-hoc, without touching any store.
    Search {
        module: String,
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        raw: bool,
        #[arg(long)]
        quiet: bool,
    },
    /// Crawl every matched feed: compile queries, search, insert new rows, parse them.
    Crawl {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        include: Option<String>,
        #[arg(long)]
        exclude: Option<String>,
        #[arg(long)]
        dry: bool,
        #[arg(long)]
        quiet: bool,
        #[arg(long)]
        parallel: bool,
    },
    /// Stream the accumulated store contents of every matched feed.
    Feed {
        #[arg(long)]
        include: Option<String>,
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Apply each matched feed's current exclude predicate destructively.
    Prune {
        #[arg(long)]
        include: Option<String>,
        #[arg(long)]
        exclude: Option<String>,
        #[arg(long)]
        dry: bool,
        #[arg(long)]
        print: bool,
    },
    /// Histogram of field values across entities of each matched feed.
    Stats {
        #[arg(long)]
        include: Option<String>,
        #[arg(long)]
        exclude: Option<String>,
        #[arg(long, default_value_t = 0.0)]
        threshold: f64,
    },
    /// Tabulate declared feeds.
    Feeds {
        #[arg(long)]
        include: Option<String>,
        #[arg(long)]
        exclude: Option<String>,
        #[arg(long)]
        search: bool,
        #[arg(long)]
        db_stats: bool,
    },
    /// Render entities to Markdown (external renderer contract; not bundled here).
    Markdown {
        #[arg(long)]
        include: Option<String>,
        #[arg(long)]
        to: Option<PathBuf>,
    },
}

fn load_registry(config_path: Option<PathBuf>) -> Result<FeedRegistry> {
    let path = config_path
        .or_else(TomlUserConfig::default_path)
        .context("could not determine a configuration file path")?;
    let config = TomlUserConfig::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    let feeds = config.feeds()?;
    Ok(FeedRegistry::new(feeds))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` for the "ran fine but at least one feed errored" case, matching
/// the CLI's exit-code contract (0 success, 1 if any per-feed error occurred).
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Search { module, query, limit, raw, quiet } => {
            commands::search(&module, &query, limit, raw, quiet)?;
            Ok(true)
        }
        Commands::Crawl { limit, include, exclude, dry, quiet, parallel } => {
            let registry = load_registry(cli.config)?;
            let any_error = commands::crawl(
                &registry,
                include.as_deref(),
                exclude.as_deref(),
                limit,
                dry,
                quiet,
                parallel,
            )?;
            Ok(!any_error)
        }
        Commands::Feed { include, exclude } => {
            let registry = load_registry(cli.config)?;
            let any_error = commands::feed(&registry, include.as_deref(), exclude.as_deref())?;
            Ok(!any_error)
        }
        Commands::Prune { include, exclude, dry, print } => {
            let registry = load_registry(cli.config)?;
            let any_error = commands::prune(&registry, include.as_deref(), exclude.as_deref(), dry, print)?;
            Ok(!any_error)
        }
        Commands::Stats { include, exclude, threshold } => {
            let registry = load_registry(cli.config)?;
            commands::stats(&registry, include.as_deref(), exclude.as_deref(), threshold)?;
            Ok(true)
        }
        Commands::Feeds { include, exclude, search, db_stats } => {
            let registry = load_registry(cli.config)?;
            if search {
                print_search_fanout(&registry, include.as_deref(), exclude.as_deref())?;
            } else {
                commands::feeds(&registry, include.as_deref(), exclude.as_deref(), db_stats)?;
            }
            Ok(true)
        }
        Commands::Markdown { include, to } => {
            commands::markdown(include.as_deref(), to.as_deref())?;
            Ok(true)
        }
    }
}

fn print_search_fanout(registry: &FeedRegistry, include: Option<&str>, exclude: Option<&str>) -> Result<()> {
    let include = include.map(regex::Regex::new).transpose()?;
    let exclude = exclude.map(regex::Regex::new).transpose()?;
    for feed in registry.get_feeds(include.as_ref(), exclude.as_ref())? {
        println!("{}:", feed.name());
        for atom in feed.compiled_queries() {
            println!("  {atom}");
        }
    }
    Ok(())
}
