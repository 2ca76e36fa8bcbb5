use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::errors::{Error, Result};
use crate::fetch::Mode;
use crate::flashcards::asset_subdir;
use crate::inat::DEFAULT_API_BASE_URL;

pub const DEFAULT_CONFIG_FILE: &str = "inat2logseq.toml";
const ENV_PREFIX: &str = "INAT2LOGSEQ";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub graph_dir: PathBuf,
    pub journals_dir: Option<PathBuf>,
    pub assets_dir: Option<PathBuf>,
    pub taxa_dir: Option<PathBuf>,
    pub photos_ledger: Option<PathBuf>,
    pub sounds_ledger: Option<PathBuf>,
    pub locales: Vec<String>,
    pub journal_date_format: String,
    pub api_base_url: String,
}

impl Settings {
    /// Defaults, then the config file (if any), then `INAT2LOGSEQ_*` variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("graph_dir", ".")?
            .set_default("locales", vec!["en", "it", "de", "fr", "es"])?
            .set_default("journal_date_format", "%Y_%m_%d")?
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?;

        builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("locales"),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        check_date_format(&settings.journal_date_format)?;
        Ok(settings)
    }

    /// Concrete locations for one run.
    pub fn paths(&self, mode: Mode) -> GraphPaths {
        let under = |p: &Option<PathBuf>, default: &str| {
            p.clone().unwrap_or_else(|| self.graph_dir.join(default))
        };
        let ledger = match mode {
            Mode::Photos => under(&self.photos_ledger, "iNat_photo_obs_in_graph.csv"),
            Mode::Sounds => under(&self.sounds_ledger, "iNat_sounds_obs_in_graph.csv"),
        };
        GraphPaths {
            journals_dir: under(&self.journals_dir, "journals"),
            assets_dir: under(&self.assets_dir, "assets"),
            taxa_dir: under(&self.taxa_dir, "pages/iNat_taxon"),
            ledger,
            journal_date_format: self.journal_date_format.clone(),
        }
    }
}

fn check_date_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::InvalidDateFormat(format.to_string()));
    }
    Ok(())
}

/// Where a run reads and writes.
#[derive(Debug, Clone)]
pub struct GraphPaths {
    pub journals_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub taxa_dir: PathBuf,
    pub ledger: PathBuf,
    pub journal_date_format: String,
}

impl GraphPaths {
    /// Every path under `root`, default layout.
    #[cfg(test)]
    pub fn under(root: &Path, mode: Mode) -> Self {
        let settings = Settings {
            graph_dir: root.to_path_buf(),
            journals_dir: None,
            assets_dir: None,
            taxa_dir: None,
            photos_ledger: None,
            sounds_ledger: None,
            locales: Vec::new(),
            journal_date_format: "%Y_%m_%d".into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
        };
        settings.paths(mode)
    }

    pub fn create_dirs(&self, mode: Mode) -> Result<()> {
        let ledger_dir = self.ledger.parent().filter(|d| !d.as_os_str().is_empty());
        let dirs = [
            Some(self.journals_dir.clone()),
            Some(self.assets_dir.join(asset_subdir(mode))),
            Some(self.taxa_dir.clone()),
            ledger_dir.map(Path::to_path_buf),
        ];
        for dir in dirs.into_iter().flatten() {
            fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        }
        Ok(())
    }

    pub fn journal(&self, date: NaiveDate) -> Result<PathBuf> {
        let mut stem = String::new();
        write!(stem, "{}", date.format(&self.journal_date_format))
            .map_err(|_| Error::InvalidDateFormat(self.journal_date_format.clone()))?;
        Ok(self.journals_dir.join(format!("{}.md", stem)))
    }
}
