use chrono::{Duration, NaiveDate};
use clap::ValueEnum;
use tracing::info;

use crate::errors::{Error, Result};
use crate::inat::models::{Observation, RANK_SPECIES};
use crate::inat::urls::{parse_search_url, SearchFilters};
use crate::inat::Inat;

const DATE_FORMAT: &str = "%Y-%m-%d";
const PER_PAGE: i64 = 100;

/// Which media an observation must carry, and which one gets downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Photos,
    Sounds,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Photos => "photos",
            Mode::Sounds => "sounds",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub url: String,
    pub mode: Mode,
    pub require_research_grade: bool,
    pub captive: bool,
    /// `YYYY-MM-DD`; defaults to `today`.
    pub observed_before: Option<String>,
    pub days_back: Option<u32>,
}

/// Full filter set for the search call: url filters plus derived defaults.
/// Fails before any request is made on bad input.
pub fn search_filters(opts: &FetchOptions, today: NaiveDate) -> Result<SearchFilters> {
    if opts.captive && opts.require_research_grade {
        return Err(Error::CaptiveResearchGrade);
    }

    let mut filters = parse_search_url(&opts.url)?;

    let observed_before = match &opts.observed_before {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|_| Error::InvalidDate(raw.clone()))?;
            filters.insert("d2", date.format(DATE_FORMAT).to_string());
            date
        }
        None => today,
    };

    if let Some(days) = opts.days_back {
        let d1 = observed_before
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or(Error::InvalidDaysBack(days))?;
        filters.set_default("d1", d1.format(DATE_FORMAT).to_string());
    }

    // hrank alone does not make the community taxon a species; the run loop checks that
    filters.set_default("hrank", RANK_SPECIES);
    filters.set_default("per_page", PER_PAGE);
    filters.insert(opts.mode.as_str(), true);
    if opts.require_research_grade {
        filters.insert("quality_grade", "research");
    }
    if opts.captive {
        filters.insert("captive", true);
    }
    Ok(filters)
}

pub fn fetch_observations(
    api: &impl Inat,
    opts: &FetchOptions,
    today: NaiveDate,
) -> Result<Vec<Observation>> {
    let filters = search_filters(opts, today)?;
    let observations = api.observations(&filters)?;
    info!(count = observations.len(), mode = opts.mode.as_str(), "Fetched observations");
    Ok(observations)
}
