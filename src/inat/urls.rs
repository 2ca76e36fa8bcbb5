use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{Error, Result};

pub const OBSERVATIONS_URL_PREFIX: &str = "https://www.inaturalist.org/observations?";

static TAXON_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"www\.inaturalist\.org/taxa/(\d+)").unwrap());

static SOUND_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[^/?#]+?(\.[A-Za-z0-9]+)(?:[?#]|$)").unwrap());

/// Display-only parameter of the web search page.
const VIEW_KEY: &str = "view";

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Str(s) => f.write_str(s),
            FilterValue::Bool(b) => write!(f, "{}", b),
            FilterValue::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Str(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Str(s)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        FilterValue::Int(i)
    }
}

/// Observation search filters, in insertion order.
/// Re-inserting a key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilters {
    entries: Vec<(String, FilterValue)>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert only if the key is not already present.
    pub fn set_default(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        let key = key.into();
        if !self.contains_key(&key) {
            self.entries.push((key, value.into()));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Key/value pairs ready for a query string.
    pub fn to_query(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }
}

/// Turn a saved web search into API filters.
/// `key=value` maps to a string, a bare `key` to `true`; `view` is dropped.
pub fn parse_search_url(url: &str) -> Result<SearchFilters> {
    let query = url
        .strip_prefix(OBSERVATIONS_URL_PREFIX)
        .ok_or_else(|| Error::InvalidSearchUrl {
            url: url.to_string(),
            expected: OBSERVATIONS_URL_PREFIX,
        })?;

    let mut filters = SearchFilters::new();
    for option in query.split('&').filter(|o| !o.is_empty()) {
        let (key, value) = match option.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (option, None),
        };
        if key.is_empty() || key == VIEW_KEY {
            continue;
        }
        match value {
            Some(v) if !v.is_empty() => filters.insert(key, v),
            _ => filters.insert(key, true),
        }
    }
    Ok(filters)
}

/// Numeric id from a taxon page url such as
/// `https://www.inaturalist.org/taxa/873626-Pinus-sylvestris-sylvestris`.
/// With `strict`, a url without an id is an error; otherwise `None`.
pub fn parse_taxon_id(url: &str, strict: bool) -> Result<Option<i64>> {
    let id = TAXON_URL_RE
        .captures_iter(url)
        .last()
        .and_then(|c| c[1].parse::<i64>().ok());
    match id {
        None if strict => Err(Error::InvalidTaxonUrl(url.to_string())),
        id => Ok(id),
    }
}

/// Extension (with the dot) of a sound file url, ignoring its query string.
/// `https://static.inaturalist.org/sounds/106308.mp3?1591992369` -> `.mp3`
pub fn sound_extension(url: &str) -> Result<String> {
    SOUND_EXT_RE
        .captures_iter(url)
        .last()
        .map(|c| c[1].to_string())
        .ok_or_else(|| Error::InvalidSoundUrl(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_values_and_flags() {
        let f = parse_search_url(
            "https://www.inaturalist.org/observations?place_id=any&user_id=rhem42&verifiable",
        )
        .unwrap();
        assert_eq!(f.get("place_id"), Some(&FilterValue::from("any")));
        assert_eq!(f.get("user_id"), Some(&FilterValue::from("rhem42")));
        assert_eq!(f.get("verifiable"), Some(&FilterValue::Bool(true)));
        assert_eq!(f.to_query().len(), 3);
    }

    #[test]
    fn view_is_skipped() {
        let f = parse_search_url("https://www.inaturalist.org/observations?view=species&subview=table")
            .unwrap();
        assert!(!f.contains_key("view"));
        assert!(f.contains_key("subview"));
    }

    #[test]
    fn insertion_order_and_last_writer_wins() {
        let f = parse_search_url("https://www.inaturalist.org/observations?b=1&a=2&b=3").unwrap();
        let keys: Vec<&str> = f.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(f.get("b"), Some(&FilterValue::from("3")));
    }

    #[test]
    fn wrong_prefix_rejected() {
        let err = parse_search_url("https://example.com/observations?place_id=any").unwrap_err();
        assert!(matches!(err, Error::InvalidSearchUrl { .. }));
        assert!(parse_search_url("https://www.inaturalist.org/taxa/1").is_err());
    }

    #[test]
    fn set_default_keeps_existing() {
        let mut f = SearchFilters::new();
        f.insert("per_page", 30i64);
        f.set_default("per_page", 100i64);
        f.set_default("hrank", "species");
        assert_eq!(f.get("per_page"), Some(&FilterValue::Int(30)));
        assert_eq!(
            f.to_query(),
            vec![
                ("per_page".to_string(), "30".to_string()),
                ("hrank".to_string(), "species".to_string())
            ]
        );
    }

    #[test]
    fn taxon_id_from_url() {
        let id = parse_taxon_id("https://www.inaturalist.org/taxa/873626-Pinus-sylvestris-sylvestris", true)
            .unwrap();
        assert_eq!(id, Some(873626));
    }

    #[test]
    fn taxon_id_missing() {
        assert!(matches!(
            parse_taxon_id("https://www.inaturalist.org/observations/1", true),
            Err(Error::InvalidTaxonUrl(_))
        ));
        assert_eq!(parse_taxon_id("https://www.inaturalist.org/observations/1", false).unwrap(), None);
    }

    #[test]
    fn sound_extensions() {
        assert_eq!(
            sound_extension("https://static.inaturalist.org/sounds/106308.mp3?1591992369").unwrap(),
            ".mp3"
        );
        assert_eq!(sound_extension("https://static.inaturalist.org/sounds/1.wav").unwrap(), ".wav");
        assert_eq!(
            sound_extension("https://static.inaturalist.org/sounds/2.m4a?1&x=y").unwrap(),
            ".m4a"
        );
        assert!(sound_extension("https://static.inaturalist.org/sounds/3?1591992369").is_err());
    }
}
