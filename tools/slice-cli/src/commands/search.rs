//! One-shot search.

use anyhow::{bail, Result};
use slice_catalog::facets::FacetKind;
use slice_catalog::ids::FacetId;
use slice_catalog::money::{Currency, Money};
use slice_catalog::search::SelectionState;
use slice_core::SessionId;
use slice_observability::StructuredLogger;
use slice_search::{SearchError, SearchSession};

use super::{SearchArgs, SelectionArgs};
use crate::context::Context;

/// Run the search command.
pub async fn run(args: SearchArgs, ctx: &Context) -> Result<()> {
    let session = start_session(ctx, args.city.as_deref(), &args.selection).await?;

    if let Some(err) = session.vocabulary_error() {
        ctx.output.warn(&format!("{}; searching without filters", err));
    }

    let spinner = ctx
        .output
        .spinner(&format!("Searching pizzas in {}", session.city()));
    let state = session.settled().await;
    spinner.finish_and_clear();

    if let Some(err) = state.error.clone() {
        session.end();
        return Err(err.into());
    }

    ctx.output.header(&format!("Pizzas in {}", session.city()));
    ctx.output.results(&state);

    if args.stats {
        let snapshot = session.counters().snapshot();
        if ctx.output.is_json() {
            ctx.output.json(&snapshot);
        } else {
            println!("{}", snapshot.to_summary());
        }
    }

    session.end();
    Ok(())
}

/// Start a session for the given city with the flags applied to its first query.
pub async fn start_session(
    ctx: &Context,
    city: Option<&str>,
    selection: &SelectionArgs,
) -> Result<SearchSession> {
    let backend = ctx.backend()?;
    let config = ctx.config.search.clone();
    let logger = StructuredLogger::new(SessionId::generate()).with_format(config.log_format);

    let mut initial = SelectionState::with_sort(config.default_sort.clone());
    apply_selection(selection, ctx.config.defaults.currency, &mut initial);

    match SearchSession::start_with_selection(backend, ctx.pinned(city), config, logger, initial)
        .await
    {
        Ok(session) => Ok(session),
        Err(SearchError::MissingContext) => {
            bail!("No city selected. Pass --city or set defaults.city in slicefinder.toml")
        }
        Err(err) => Err(err.into()),
    }
}

/// Copy command-line flags into a selection.
///
/// Values are taken as typed; the criteria composer drops the ones the
/// city's vocabulary does not know.
pub fn apply_selection(args: &SelectionArgs, currency: Currency, selection: &mut SelectionState) {
    if let Some(ref term) = args.term {
        selection.set_term(term.clone());
    }
    if let Some(ref shape) = args.shape {
        selection.select_shape(Some(FacetId::new(shape.trim())));
    }

    let groups = [
        (FacetKind::Dough, &args.dough),
        (FacetKind::Sauce, &args.sauce),
        (FacetKind::Crust, &args.crust),
        (FacetKind::Style, &args.style),
        (FacetKind::Vendor, &args.vendor),
    ];
    for (kind, ids) in groups {
        for id in ids {
            let id = FacetId::new(id.trim());
            if !selection.is_selected(kind, &id) {
                selection.toggle(kind, id);
            }
        }
    }

    if let Some(price) = args.max_price {
        selection.set_price_ceiling(Some(Money::from_decimal(price, currency)));
    }
    if let Some(diameter) = args.min_diameter {
        selection.set_diameter_floor(Some(diameter));
    }
    if args.min_width.is_some() || args.min_length.is_some() {
        selection.set_rectangle_floor(args.min_width, args.min_length);
    }
    if let Some(ref sort) = args.sort {
        selection.set_sort(sort.clone());
    }
}
