//! Output formatting for the CLI.

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use slice_catalog::facets::FilterControls;
use slice_catalog::metrics::AnnotatedListing;
use slice_core::QueryPhase;
use slice_search::SearchState;

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
    term: Term,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self {
            verbose,
            json,
            term: Term::stderr(),
        }
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    /// Print a header/title.
    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print JSON output.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(&self, item: &str) {
        if self.json {
            return;
        }
        println!("  {} {}", style("•").dim(), item);
    }

    /// Print a table row.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  ").trim_end());
    }

    /// Create a spinner for indeterminate progress.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json || !self.term.is_term() {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Check if JSON mode is enabled.
    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print a published search state as a results table.
    pub fn results(&self, state: &SearchState) {
        if self.json {
            self.json(state);
            return;
        }

        match state.phase {
            QueryPhase::Failed => {
                let reason = state
                    .error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "unknown error".to_string());
                self.error(&format!("Search failed: {}", reason));
                return;
            }
            QueryPhase::Pending => self.warn("Results are still loading"),
            QueryPhase::Idle => {
                self.info("No search has run yet");
                return;
            }
            QueryPhase::Settled => {}
        }

        if state.is_no_match() {
            self.info("No pizzas match these filters");
            return;
        }

        let widths = [2, 28, 20, 12, 40];
        self.table_row(&["", "Pizza", "Restaurant", "Price", "Metrics"], &widths);
        for listing in &state.results {
            let row = listing_row(listing);
            self.table_row(
                &[
                    &row.marker,
                    &row.name,
                    &row.vendor,
                    &row.price,
                    &row.metrics,
                ],
                &widths,
            );
        }

        let count = state.results.len();
        self.info(&format!(
            "{} result{}{}",
            count,
            if count == 1 { "" } else { "s" },
            if state.results.iter().any(|l| l.best_value) {
                format!(", {} marks the best price per cm\u{00b2}", style("★").yellow())
            } else {
                String::new()
            }
        ));
    }

    /// Print the filter controls of a session.
    pub fn controls(&self, controls: &FilterControls) {
        if self.json {
            self.json(controls);
            return;
        }

        if let Some(ref error) = controls.error {
            self.warn(&format!("Filters unavailable: {}", error));
        }

        for group in &controls.groups {
            if group.options.is_empty() {
                continue;
            }
            let options: Vec<String> = group
                .options
                .iter()
                .map(|o| {
                    let text = format!("{} ({})", o.label, o.id);
                    if o.selected {
                        style(text).green().bold().to_string()
                    } else {
                        text
                    }
                })
                .collect();
            let suffix = if group.exclusive { " [one of]" } else { "" };
            self.kv(&format!("{}{}", group.kind, suffix), &options.join(", "));
        }

        let bounds = &controls.bounds;
        if let (Some(min), Some(max)) = (&bounds.price_min, &bounds.price_max) {
            self.kv("price", &format!("{} - {}", min, max));
        }
        if let (Some(min), Some(max)) = (bounds.diameter_min_cm, bounds.diameter_max_cm) {
            self.kv("diameter", &format!("{:.0} - {:.0} cm", min, max));
        }
    }
}

/// Display columns for one listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub marker: String,
    pub name: String,
    pub vendor: String,
    pub price: String,
    pub metrics: String,
}

/// Render the columns of a result row. Metrics that cannot be computed are
/// left out rather than shown as zero.
pub fn listing_row(listing: &AnnotatedListing) -> ListingRow {
    let metrics: Vec<String> = listing.badges().into_iter().map(|b| b.text).collect();
    ListingRow {
        marker: if listing.best_value { "★".to_string() } else { String::new() },
        name: listing.listing.name.clone(),
        vendor: listing.listing.vendor_label().to_string(),
        price: listing.listing.price.display(),
        metrics: metrics.join(", "),
    }
}
