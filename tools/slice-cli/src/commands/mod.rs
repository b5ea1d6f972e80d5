//! CLI command implementations.

pub mod browse;
pub mod config;
pub mod facets;
pub mod metrics;
pub mod search;

use clap::{Args, Subcommand};

/// Arguments for the facets command.
#[derive(Args)]
pub struct FacetsArgs {
    /// Cities to list (default: the configured city).
    pub cities: Vec<String>,
}

/// Filter and sort flags shared by search and browse.
#[derive(Args, Clone, Default)]
pub struct SelectionArgs {
    /// Free-text term.
    #[arg(short, long)]
    pub term: Option<String>,

    /// Shape facet id.
    #[arg(long)]
    pub shape: Option<String>,

    /// Dough facet ids.
    #[arg(long)]
    pub dough: Vec<String>,

    /// Sauce facet ids.
    #[arg(long)]
    pub sauce: Vec<String>,

    /// Crust facet ids.
    #[arg(long)]
    pub crust: Vec<String>,

    /// Style facet ids.
    #[arg(long)]
    pub style: Vec<String>,

    /// Restaurant ids.
    #[arg(long)]
    pub vendor: Vec<String>,

    /// Maximum price, in the configured currency.
    #[arg(long)]
    pub max_price: Option<f64>,

    /// Minimum diameter in cm (circular shapes).
    #[arg(long)]
    pub min_diameter: Option<f64>,

    /// Minimum width in cm (rectangular shapes).
    #[arg(long)]
    pub min_width: Option<f64>,

    /// Minimum length in cm (rectangular shapes).
    #[arg(long)]
    pub min_length: Option<f64>,

    /// Sort label, e.g. price-asc or profitability.
    #[arg(short, long)]
    pub sort: Option<String>,
}

/// Arguments for the search command.
#[derive(Args)]
pub struct SearchArgs {
    /// City to search (default: the configured city).
    #[arg(long)]
    pub city: Option<String>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Print the session counters after the results.
    #[arg(long)]
    pub stats: bool,
}

/// Arguments for the metrics command.
#[derive(Args)]
pub struct MetricsArgs {
    /// Item price.
    #[arg(long)]
    pub price: f64,

    /// Price currency code (default: the configured currency).
    #[arg(long)]
    pub currency: Option<String>,

    /// Diameter in cm.
    #[arg(long, conflicts_with_all = ["width", "length"])]
    pub diameter: Option<f64>,

    /// Width in cm.
    #[arg(long, requires = "length")]
    pub width: Option<f64>,

    /// Length in cm.
    #[arg(long, requires = "width")]
    pub length: Option<f64>,

    /// Weight in grams.
    #[arg(long)]
    pub weight: Option<f64>,

    /// Energy value in kcal.
    #[arg(long)]
    pub kcal: Option<f64>,
}

/// Arguments for the browse command.
#[derive(Args)]
pub struct BrowseArgs {
    /// City to browse (default: the configured city).
    #[arg(long)]
    pub city: Option<String>,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Default city written into the file.
        #[arg(long, default_value = "krakow")]
        city: String,

        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
