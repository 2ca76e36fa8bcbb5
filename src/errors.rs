use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not an observation search url (expected prefix {expected}): {url}")]
    InvalidSearchUrl { url: String, expected: &'static str },

    #[error("not a valid taxon url: {0}")]
    InvalidTaxonUrl(String),

    #[error("incorrect date format, should be YYYY-MM-DD: {0}")]
    InvalidDate(String),

    #[error("--days_back {0} reaches before the first representable date")]
    InvalidDaysBack(u32),

    #[error("invalid journal date format: {0:?}")]
    InvalidDateFormat(String),

    #[error("captive observations cannot be research grade (pass --dont_require_research_grade)")]
    CaptiveResearchGrade,

    #[error("taxon {id} has rank {rank:?}, expected {expected:?}")]
    UnsupportedRank {
        id: i64,
        rank: String,
        expected: &'static str,
    },

    #[error("expected exactly one taxon for id {id}, got {found}")]
    TaxonNotFound { id: i64, found: usize },

    #[error("observation {id} has no {mode} to download")]
    MissingMedia { id: i64, mode: &'static str },

    #[error("cannot find a file extension in sound url: {0}")]
    InvalidSoundUrl(String),

    #[error("malformed ledger {path:?}: {message}")]
    MalformedLedger { path: PathBuf, message: String },

    #[error("request to {url} failed")]
    Api {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("i/o error on {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings")]
    Settings(#[from] config::ConfigError),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn api(url: impl Into<String>, source: reqwest::Error) -> Self {
        Error::Api {
            url: url.into(),
            source,
        }
    }
}
