//! List the facet vocabulary of one or more cities.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use futures::future::join_all;
use serde::Serialize;
use slice_catalog::facets::{FacetVocabulary, FilterControls};
use slice_catalog::ids::CityId;
use slice_catalog::search::SelectionState;
use slice_data::with_timeout;

use super::FacetsArgs;
use crate::context::Context;

#[derive(Serialize)]
#[serde(untagged)]
enum CityFacets {
    Loaded(FacetVocabulary),
    Failed { error: String },
}

/// Run the facets command.
pub async fn run(args: FacetsArgs, ctx: &Context) -> Result<()> {
    let cities: Vec<CityId> = if args.cities.is_empty() {
        match ctx.pinned(None).resolved_city() {
            Some(city) => vec![city.clone()],
            None => bail!("No city given and defaults.city is not set"),
        }
    } else {
        args.cities.iter().map(|c| CityId::new(c.trim())).collect()
    };

    let backend = ctx.backend()?;
    let limit = ctx.config.search.facets_timeout();

    let spinner = ctx
        .output
        .spinner(&format!("Fetching filters for {} city(s)", cities.len()));
    let results = join_all(
        cities
            .iter()
            .map(|city| with_timeout(limit, backend.fetch_facet_vocabulary(city))),
    )
    .await;
    spinner.finish_and_clear();

    if ctx.output.is_json() {
        let report: BTreeMap<&str, CityFacets> = cities
            .iter()
            .zip(results)
            .map(|(city, result)| {
                let entry = match result {
                    Ok(vocabulary) => CityFacets::Loaded(vocabulary),
                    Err(err) => CityFacets::Failed {
                        error: err.to_string(),
                    },
                };
                (city.as_str(), entry)
            })
            .collect();
        ctx.output.json(&report);
        return Ok(());
    }

    let mut failures = 0;
    for (city, result) in cities.iter().zip(results) {
        ctx.output.header(&format!("Filters for {}", city));
        match result {
            Ok(vocabulary) => {
                ctx.output.kv(
                    "fetched",
                    &vocabulary.fetched_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                );
                if vocabulary.is_empty() {
                    ctx.output.info("This city offers no filters");
                    continue;
                }
                let controls = FilterControls::build(&vocabulary, &SelectionState::new(), None);
                ctx.output.controls(&controls);
            }
            Err(err) => {
                failures += 1;
                ctx.output.warn(&format!("Filters unavailable: {}", err));
            }
        }
    }

    if failures == cities.len() {
        bail!("No filters could be fetched");
    }

    Ok(())
}
