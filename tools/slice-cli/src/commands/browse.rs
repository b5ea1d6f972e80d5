//! Interactive browsing: one session, many selection changes.

use anyhow::Result;
use dialoguer::{Input, MultiSelect, Select};
use slice_catalog::facets::{FacetControl, FacetKind};
use slice_catalog::ids::FacetId;
use slice_catalog::money::Money;
use slice_catalog::search::SortLabel;
use slice_search::{SearchSession, SubmitOutcome};

use super::search::start_session;
use super::{BrowseArgs, SelectionArgs};
use crate::context::Context;

const ACTIONS: [&str; 10] = [
    "Search term",
    "Shape",
    "Other filters",
    "Maximum price",
    "Minimum diameter",
    "Minimum rectangle size",
    "Sort",
    "Clear filters",
    "Retry loading filters",
    "Quit",
];

/// Run the browse command.
pub async fn run(args: BrowseArgs, ctx: &Context) -> Result<()> {
    let mut session = start_session(ctx, args.city.as_deref(), &SelectionArgs::default()).await?;
    show(&session, ctx).await;

    loop {
        let action = Select::new()
            .with_prompt(format!("Browsing {}", session.city()))
            .items(&ACTIONS)
            .default(0)
            .interact()?;

        let outcome = match ACTIONS[action] {
            "Search term" => {
                let term: String = Input::new()
                    .with_prompt("Term (empty to clear)")
                    .allow_empty(true)
                    .interact_text()?;
                session.set_term(term)?
            }
            "Shape" => {
                let Some(shape) = pick_shape(&session)? else {
                    continue;
                };
                session.select_shape(shape)?
            }
            "Other filters" => match pick_facets(&mut session)? {
                Some(outcome) => outcome,
                None => continue,
            },
            "Maximum price" => {
                let currency = ctx.config.defaults.currency;
                let value = prompt_number(&format!("Maximum price in {}", currency))?;
                session.set_price_ceiling(value.map(|v| Money::from_decimal(v, currency)))?
            }
            "Minimum diameter" => {
                let value = prompt_number("Minimum diameter in cm")?;
                session.set_diameter_floor(value)?
            }
            "Minimum rectangle size" => {
                let width = prompt_number("Minimum width in cm")?;
                let length = prompt_number("Minimum length in cm")?;
                session.set_rectangle_floor(width, length)?
            }
            "Sort" => {
                let labels: Vec<&str> = SortLabel::ALL.iter().map(|l| l.display_name()).collect();
                let choice = Select::new()
                    .with_prompt("Sort by")
                    .items(&labels)
                    .default(0)
                    .interact()?;
                session.set_sort(SortLabel::ALL[choice].key())?
            }
            "Clear filters" => session.clear_filters()?,
            "Retry loading filters" => {
                if session.retry_vocabulary().await? {
                    ctx.output.success("Filters loaded");
                } else {
                    ctx.output.warn("Filters are still unavailable");
                }
                show(&session, ctx).await;
                continue;
            }
            _ => break,
        };

        if let SubmitOutcome::Deduplicated(_) = outcome {
            ctx.output.info("Nothing changed");
            continue;
        }
        show(&session, ctx).await;
    }

    let snapshot = session.counters().snapshot();
    ctx.output.info(&format!(
        "{} queries dispatched, {} result sets shown, {} stale responses dropped",
        snapshot.dispatched, snapshot.published, snapshot.stale_discarded
    ));
    session.end();
    Ok(())
}

async fn show(session: &SearchSession, ctx: &Context) {
    if let Some(err) = session.vocabulary_error() {
        ctx.output.warn(&format!("{}; filters are disabled", err));
    }
    let spinner = ctx.output.spinner("Searching");
    let state = session.settled().await;
    spinner.finish_and_clear();
    ctx.output.results(&state);
}

/// Returns `None` when there is nothing to pick from.
fn pick_shape(session: &SearchSession) -> Result<Option<Option<FacetId>>> {
    let controls = session.controls();
    let Some(group) = controls.group(FacetKind::Shape).filter(|g| !g.options.is_empty()) else {
        return Ok(None);
    };

    let mut items = vec!["Any shape".to_string()];
    items.extend(group.options.iter().map(|o| o.label.clone()));
    let current = group.options.iter().position(|o| o.selected).map_or(0, |i| i + 1);

    let choice = Select::new()
        .with_prompt("Shape")
        .items(&items)
        .default(current)
        .interact()?;

    Ok(Some(match choice {
        0 => None,
        i => Some(group.options[i - 1].id.clone()),
    }))
}

/// Pick a multi-select group, then its options. Only toggled options change.
fn pick_facets(session: &mut SearchSession) -> Result<Option<SubmitOutcome>> {
    let controls = session.controls();
    let groups: Vec<_> = controls
        .groups
        .iter()
        .filter(|g| !g.exclusive && !g.options.is_empty())
        .collect();
    if groups.is_empty() {
        return Ok(None);
    }

    let names: Vec<&str> = groups.iter().map(|g| g.kind.display_name()).collect();
    let group = groups[Select::new()
        .with_prompt("Filter group")
        .items(&names)
        .default(0)
        .interact()?];

    let labels: Vec<&str> = group.options.iter().map(|o| o.label.as_str()).collect();
    let defaults: Vec<bool> = group.options.iter().map(|o| o.selected).collect();
    let chosen = MultiSelect::new()
        .with_prompt(group.kind.display_name())
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    apply_choice(session, group, &chosen)
}

/// Toggle the options whose selection differs from `chosen`.
fn apply_choice(
    session: &mut SearchSession,
    group: &FacetControl,
    chosen: &[usize],
) -> Result<Option<SubmitOutcome>> {
    let kind = group.kind;
    let toggled: Vec<FacetId> = group
        .options
        .iter()
        .enumerate()
        .filter(|(i, o)| o.selected != chosen.contains(i))
        .map(|(_, o)| o.id.clone())
        .collect();
    if toggled.is_empty() {
        return Ok(None);
    }

    Ok(Some(session.update(|s| {
        for id in toggled {
            s.toggle(kind, id);
        }
    })?))
}

fn prompt_number(prompt: &str) -> Result<Option<f64>> {
    let raw: String = Input::new()
        .with_prompt(format!("{} (empty to clear)", prompt))
        .allow_empty(true)
        .validate_with(|input: &String| -> Result<(), String> {
            let input = input.trim();
            if input.is_empty() || input.replace(',', ".").parse::<f64>().is_ok() {
                Ok(())
            } else {
                Err(format!("'{}' is not a number", input))
            }
        })
        .interact_text()?;

    let raw = raw.trim().replace(',', ".");
    Ok(if raw.is_empty() { None } else { raw.parse().ok() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use slice_catalog::search::PinnedContext;
    use slice_core::SearchConfig;
    use slice_data::FixtureBackend;
    use std::sync::Arc;

    const DEMO_CATALOG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures/catalog.json");

    fn sauce_group(session: &SearchSession) -> FacetControl {
        session
            .controls()
            .groups
            .into_iter()
            .find(|g| g.kind == FacetKind::Sauce)
            .unwrap()
    }

    fn index_of(group: &FacetControl, id: &str) -> usize {
        group.options.iter().position(|o| o.id.as_str() == id).unwrap()
    }

    #[tokio::test]
    async fn test_apply_choice_toggles_only_changed_options() {
        let backend = FixtureBackend::load(DEMO_CATALOG).unwrap();
        let mut session = SearchSession::start(
            Arc::new(backend),
            PinnedContext::city("krakow"),
            SearchConfig::default(),
        )
        .await
        .unwrap();
        session.settled().await;

        let group = sauce_group(&session);
        let chosen = [index_of(&group, "cream"), index_of(&group, "bbq")];
        let outcome = apply_choice(&mut session, &group, &chosen).unwrap();
        assert!(outcome.is_some_and(|o| o.is_dispatched()));

        let state = session.settled().await;
        let mut ids: Vec<&str> = state.results.iter().map(|r| r.listing.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, ["kr-3", "kr-5"]);

        let group = sauce_group(&session);
        assert!(apply_choice(&mut session, &group, &chosen).unwrap().is_none());

        let bbq_only = [index_of(&group, "bbq")];
        apply_choice(&mut session, &group, &bbq_only).unwrap();
        let state = session.settled().await;
        let ids: Vec<&str> = state.results.iter().map(|r| r.listing.id.as_str()).collect();
        assert_eq!(ids, ["kr-5"]);
    }
}
