use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::errors::{Error, Result};

const HEADER: &str = "Observation ID";

/// Ids of observations already turned into flashcards.
/// Always sorted ascending, without duplicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    ids: Vec<i64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a single-column CSV. A missing or empty file is an empty ledger;
    /// anything unparseable is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(Error::io(path, e)),
        };
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::new());
        }

        let malformed = |message: String| Error::MalformedLedger {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(raw.as_slice());
        // without the header row the first id would be taken for one
        let header = reader
            .headers()
            .map_err(|e| malformed(e.to_string()))?
            .get(0)
            .map(|h| h.trim().to_string());
        if header.as_deref() != Some(HEADER) {
            return Err(malformed(format!(
                "expected header {:?}, found {:?}",
                HEADER,
                header.unwrap_or_default()
            )));
        }

        let mut ids = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| malformed(e.to_string()))?;
            let field = record
                .get(0)
                .map(str::trim)
                .ok_or_else(|| malformed(format!("row {} is empty", i + 1)))?;
            let id: i64 = field
                .parse()
                .map_err(|_| malformed(format!("row {}: {:?} is not an integer", i + 1, field)))?;
            // older ledgers carry a -1 placeholder row
            if id >= 0 {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        ids.dedup();
        debug!(path = %path.display(), entries = ids.len(), "Loaded ledger");
        Ok(Self { ids })
    }

    /// `Ok(index)` if present, else `Err(insertion_point)`.
    pub fn position(&self, id: i64) -> std::result::Result<usize, usize> {
        self.ids.binary_search(&id)
    }

    /// Insert at a point previously returned by [`Ledger::position`].
    pub fn insert_at(&mut self, index: usize, id: i64) {
        debug_assert_eq!(self.position(id), Err(index));
        self.ids.insert(index, id);
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, id: i64) -> bool {
        match self.position(id) {
            Ok(_) => false,
            Err(index) => {
                self.ids.insert(index, id);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Overwrite `path` with the full set.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let mut buffer = Vec::<u8>::new();
        {
            let mut wtr = csv::Writer::from_writer(&mut buffer);
            let rows = std::iter::once(HEADER.to_string()).chain(self.ids.iter().map(i64::to_string));
            for row in rows {
                wtr.write_record([row])
                    .map_err(|e| Error::io(path, e.into()))?;
            }
            wtr.flush().map_err(|e| Error::io(path, e))?;
        }
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        fs::write(path, buffer).map_err(|e| Error::io(path, e))?;
        debug!(path = %path.display(), entries = self.ids.len(), "Saved ledger");
        Ok(())
    }
}
