pub mod models;
pub mod urls;

use std::time::Instant;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::errors::{Error, Result};
use models::{Observation, Page, Taxon, RANK_SPECIES};
use urls::SearchFilters;

pub const DEFAULT_API_BASE_URL: &str = "https://api.inaturalist.org/v1";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Everything the converter needs from iNaturalist.
pub trait Inat {
    /// One search request; results in API order.
    fn observations(&self, filters: &SearchFilters) -> Result<Vec<Observation>>;

    /// Taxa by id, without localized names.
    fn taxa(&self, ids: &[i64]) -> Result<Vec<Taxon>>;

    /// Species-ranked taxa matching `id`, with all localized names.
    fn species(&self, id: i64) -> Result<Vec<Taxon>>;

    /// Raw bytes of a media file.
    fn download(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct InatClient {
    http: Client,
    base_url: String,
}

impl InatClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::api(base_url, e))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_page<T: DeserializeOwned>(&self, path: &str, query: &[(String, String)]) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.base_url, path);
        let start = Instant::now();
        let page: Page<T> = self
            .http
            .get(&url)
            .query(query)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| Error::api(&url, e))?;
        debug!(
            url = %url,
            results = page.results.len(),
            total = ?page.total_results,
            latency_ms = start.elapsed().as_millis() as u64,
            "GET"
        );
        Ok(page.results)
    }
}

impl Inat for InatClient {
    fn observations(&self, filters: &SearchFilters) -> Result<Vec<Observation>> {
        info!(filters = ?filters.to_query(), "Searching observations");
        self.get_page("observations", &filters.to_query())
    }

    fn taxa(&self, ids: &[i64]) -> Result<Vec<Taxon>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
        self.get_page(&format!("taxa/{}", ids), &[])
    }

    fn species(&self, id: i64) -> Result<Vec<Taxon>> {
        let query = [
            ("taxon_id".to_string(), id.to_string()),
            ("all_names".to_string(), "true".to_string()),
            ("rank".to_string(), RANK_SPECIES.to_string()),
        ];
        self.get_page("taxa", &query)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>> {
        let bytes = self
            .http
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.bytes())
            .map_err(|e| Error::api(url, e))?;
        Ok(bytes.to_vec())
    }
}
