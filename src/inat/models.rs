use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

pub const INAT_WEB_URL: &str = "https://www.inaturalist.org";

/// Envelope of every list endpoint of the v1 API.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub total_results: Option<u64>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub place_guess: Option<String>,
    #[serde(default)]
    pub taxon: Option<TaxonSummary>,
    #[serde(default)]
    pub community_taxon_id: Option<i64>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(default)]
    pub sounds: Vec<Sound>,
    pub user: User,
    #[serde(default)]
    pub uri: Option<String>,
}

impl Observation {
    pub fn uri(&self) -> String {
        self.uri
            .clone()
            .unwrap_or_else(|| format!("{}/observations/{}", INAT_WEB_URL, self.id))
    }

    /// The observer's own identification.
    pub fn taxon_id(&self) -> Option<i64> {
        self.taxon.as_ref().map(|t| t.id)
    }

    pub fn taxon_name(&self) -> &str {
        self.taxon.as_ref().map(|t| t.name.as_str()).unwrap_or("unknown taxon")
    }

    /// Comma-split place guess, e.g. "Milano, Lombardia, Italia".
    pub fn places(&self) -> Vec<&str> {
        self.place_guess
            .as_deref()
            .map(|p| {
                p.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Photo {
    pub url: String,
}

impl Photo {
    /// The API hands out the square thumbnail; the medium rendition lives next to it.
    pub fn medium_url(&self) -> String {
        self.url.replacen("square", "medium", 1)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sound {
    #[serde(default)]
    pub file_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Taxon {
    pub id: i64,
    pub name: String,
    pub rank: String,
    #[serde(default)]
    pub rank_level: Option<f64>,
    #[serde(default)]
    pub ancestor_ids: Vec<i64>,
    #[serde(default)]
    pub wikipedia_url: Option<String>,
    #[serde(default)]
    pub preferred_common_name: Option<String>,
    #[serde(default)]
    pub names: Vec<TaxonName>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonName {
    pub name: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub is_valid: bool,
}

pub const RANK_SPECIES: &str = "species";
pub const RANK_HYBRID: &str = "hybrid";

impl Taxon {
    pub fn url(&self) -> String {
        format!("{}/taxa/{}", INAT_WEB_URL, self.id)
    }

    pub fn is_species(&self) -> bool {
        self.rank == RANK_SPECIES
    }

    /// "Genus Pinus (pines)": title-cased rank, scientific name, optional common name.
    pub fn full_name(&self) -> String {
        let mut rank = self.rank.chars();
        let rank = match rank.next() {
            Some(first) => first.to_uppercase().chain(rank).collect::<String>(),
            None => String::new(),
        };
        match &self.preferred_common_name {
            Some(common) if !common.is_empty() => format!("{} {} ({})", rank, self.name, common),
            _ => format!("{} {}", rank, self.name),
        }
    }

    /// Valid common names for each requested locale, ordered by `position`.
    /// Locales without data are absent from the result.
    pub fn local_names(&self, locales: &[String]) -> Vec<(String, Vec<String>)> {
        let mut names: Vec<&TaxonName> = self
            .names
            .iter()
            .filter(|n| n.is_valid)
            .filter(|n| n.locale.as_ref().is_some_and(|l| locales.contains(l)))
            .collect();
        names.sort_by_key(|n| n.position);

        locales
            .iter()
            .filter_map(|loc| {
                let group: Vec<String> = names
                    .iter()
                    .filter(|n| n.locale.as_deref() == Some(loc.as_str()))
                    .map(|n| n.name.clone())
                    .collect();
                (!group.is_empty()).then(|| (loc.clone(), group))
            })
            .collect()
    }
}
