use std::path::PathBuf;

use chrono::NaiveDate;
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::errors::{Error, Result};
use crate::fetch::{fetch_observations, search_filters, FetchOptions};
use crate::flashcards::{flashcard_block, journal_header, save_asset};
use crate::inat::models::{Observation, Taxon, RANK_HYBRID};
use crate::inat::Inat;
use crate::ledger::Ledger;
use crate::outline::append_lines;
use crate::settings::GraphPaths;
use crate::taxa::{SpeciesRef, TaxonPageWriter};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub fetch: FetchOptions,
    pub max_additions: usize,
    pub extra_tags: Vec<String>,
}

#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub added: usize,
    pub already_in_graph: usize,
    pub hybrids: usize,
    pub not_species: usize,
    /// Set when at least one card was written.
    pub journal: Option<PathBuf>,
}

/// One conversion pass: search, skip known and unsupported observations,
/// write cards for the rest, then save the ledger.
pub fn run(
    api: &impl Inat,
    paths: &GraphPaths,
    locales: &[String],
    opts: &RunOptions,
    today: NaiveDate,
    progress: &ProgressBar,
) -> Result<RunSummary> {
    let mode = opts.fetch.mode;
    // bad filters must fail before anything touches the disk
    search_filters(&opts.fetch, today)?;
    let journal = paths.journal(today)?;

    paths.create_dirs(mode)?;
    let mut ledger = Ledger::load(&paths.ledger)?;
    info!(ledger = %paths.ledger.display(), known = ledger.len(), "Loaded ledger");

    let observations = fetch_observations(api, &opts.fetch, today)?;
    let writer = TaxonPageWriter::new(&paths.taxa_dir, locales);

    let mut summary = RunSummary::default();
    let mut lines: Vec<String> = Vec::new();

    for obs in &observations {
        if summary.added >= opts.max_additions {
            break;
        }

        let index = match ledger.position(obs.id) {
            Ok(_) => {
                debug!(obs_id = obs.id, "Already in graph");
                summary.already_in_graph += 1;
                continue;
            }
            Err(index) => index,
        };

        let Some(taxon) = identified_taxon(api, obs, opts.fetch.require_research_grade)? else {
            warn!(obs_id = obs.id, "Observation has no identification, skipping");
            summary.not_species += 1;
            continue;
        };
        if taxon.rank == RANK_HYBRID {
            debug!(obs_id = obs.id, taxon = %taxon.name, "Hybrid taxa are not supported, skipping");
            summary.hybrids += 1;
            continue;
        }
        if !taxon.is_species() {
            warn!(
                obs_id = obs.id,
                taxon_id = taxon.id,
                rank = %taxon.rank,
                "Neither observer nor community taxon is a species, skipping"
            );
            summary.not_species += 1;
            continue;
        }

        if lines.is_empty() {
            lines.extend(journal_header(mode, &opts.extra_tags));
        }

        let date = obs.created_at.format("%d/%m/%Y, %H:%M");
        info!(obs_id = obs.id, "Downloading observation of {} ({})", obs.taxon_name(), date);
        progress.set_message(obs.taxon_name().to_string());

        // localized names only come with the species lookup
        let species = if taxon.names.is_empty() {
            SpeciesRef::Id(taxon.id)
        } else {
            SpeciesRef::Taxon(taxon)
        };
        let species = writer.write_species(api, species)?;
        let asset = save_asset(api, obs, mode, &paths.assets_dir)?;
        lines.extend(flashcard_block(obs, mode, &asset, &species));

        ledger.insert_at(index, obs.id);
        summary.added += 1;
        progress.inc(1);
    }

    if !lines.is_empty() {
        append_lines(&journal, &lines)?;
        info!(journal = %journal.display(), cards = summary.added, "Updated journal");
        summary.journal = Some(journal);
    }
    ledger.persist(&paths.ledger)?;

    Ok(summary)
}

/// The taxon a card is made for.
///
/// With research grade the community taxon is already a species. Otherwise
/// the observer's own call is used, unless the community settled on a species.
fn identified_taxon(api: &impl Inat, obs: &Observation, research_grade: bool) -> Result<Option<Taxon>> {
    if research_grade {
        return obs
            .community_taxon_id
            .or(obs.taxon_id())
            .map(|id| taxon_by_id(api, id))
            .transpose();
    }

    if let Some(community_id) = obs.community_taxon_id {
        let community = taxon_by_id(api, community_id)?;
        if community.is_species() {
            return Ok(Some(community));
        }
    }
    obs.taxon_id().map(|id| taxon_by_id(api, id)).transpose()
}

fn taxon_by_id(api: &impl Inat, id: i64) -> Result<Taxon> {
    let found = api.taxa(&[id])?;
    let count = found.len();
    found
        .into_iter()
        .find(|t| t.id == id)
        .ok_or(Error::TaxonNotFound { id, found: count })
}
