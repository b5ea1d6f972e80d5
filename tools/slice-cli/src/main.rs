//! Slice CLI - pizza search from the terminal.
//!
//! Commands:
//! - `slice facets` - List the filters a city offers
//! - `slice search` - Run one search and print the results
//! - `slice browse` - Refine a search interactively
//! - `slice metrics` - Compute value metrics for an item
//! - `slice config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BrowseArgs, ConfigArgs, FacetsArgs, MetricsArgs, SearchArgs};

/// Slice CLI - find the best pizza value in your city
#[derive(Parser)]
#[command(name = "slice")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Config environment to apply
    #[arg(short, long, global = true)]
    env: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the filters available in one or more cities
    Facets(FacetsArgs),

    /// Search pizzas in a city
    Search(SearchArgs),

    /// Refine a search interactively
    Browse(BrowseArgs),

    /// Compute value metrics for an item
    Metrics(MetricsArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Route session logs to stderr. `SLICE_LOG` wins over the config level.
fn init_tracing(level: &str, verbose: bool) {
    let default = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_env("SLICE_LOG")
        .or_else(|_| EnvFilter::try_new(default))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let ctx = match context::Context::load(cli.config.as_deref(), cli.env.as_deref(), output.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            output.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };
    init_tracing(&ctx.config.logging.level, cli.verbose);

    // Execute command
    let result = match cli.command {
        Commands::Facets(args) => commands::facets::run(args, &ctx).await,
        Commands::Search(args) => commands::search::run(args, &ctx).await,
        Commands::Browse(args) => commands::browse::run(args, &ctx).await,
        Commands::Metrics(args) => commands::metrics::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
