//! Derived metrics for an item described on the command line.

use anyhow::{bail, Result};
use serde::Serialize;
use slice_catalog::listing::Listing;
use slice_catalog::metrics::{geometry_issue, DerivedMetrics};
use slice_catalog::money::{Currency, Money};

use super::MetricsArgs;
use crate::context::Context;

#[derive(Serialize)]
struct MetricsReport {
    price: Money,
    metrics: DerivedMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    geometry_issue: Option<String>,
}

/// Run the metrics command.
pub async fn run(args: MetricsArgs, ctx: &Context) -> Result<()> {
    let listing = listing_from_args(&args, ctx.config.defaults.currency)?;
    let metrics = DerivedMetrics::compute(&listing);
    let has_geometry = args.diameter.is_some() || args.width.is_some();
    let issue = has_geometry
        .then(|| geometry_issue(&listing))
        .flatten()
        .map(|i| i.to_string());

    if ctx.output.is_json() {
        ctx.output.json(&MetricsReport {
            price: listing.price,
            metrics,
            geometry_issue: issue,
        });
        return Ok(());
    }

    ctx.output.header(&format!("Metrics for {}", listing.price));
    if let Some(ref issue) = issue {
        ctx.output.warn(&format!("Area not computed: {}", issue));
    }
    if metrics.is_empty() {
        ctx.output.info("Not enough data to compute any metric");
        return Ok(());
    }
    for badge in metrics.badges(listing.price.currency.symbol()) {
        ctx.output.list_item(&badge.text);
    }

    Ok(())
}

fn listing_from_args(args: &MetricsArgs, default_currency: Currency) -> Result<Listing> {
    let currency = match args.currency.as_deref() {
        Some(code) => match Currency::from_code(code) {
            Some(currency) => currency,
            None => bail!("Unknown currency: {}", code),
        },
        None => default_currency,
    };

    let price = Money::from_decimal(args.price, currency);
    let mut listing = Listing::new("adhoc", "ad hoc", "adhoc", price);
    if let Some(diameter) = args.diameter {
        listing = listing.circular(diameter);
    } else if let (Some(width), Some(length)) = (args.width, args.length) {
        listing = listing.rectangular(width, length);
    }
    if let Some(weight) = args.weight {
        listing = listing.with_weight(weight);
    }
    if let Some(kcal) = args.kcal {
        listing = listing.with_energy(kcal);
    }
    Ok(listing)
}
