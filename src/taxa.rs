use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::inat::models::{Taxon, RANK_SPECIES};
use crate::inat::urls::parse_taxon_id;
use crate::inat::Inat;
use crate::outline::{page_ref, property, write_once};

/// Kingdom. Anything coarser ("Life", state of matter) gets no page.
pub const MAX_ANCESTOR_RANK_LEVEL: f64 = 70.0;

/// Namespace separator in page file names.
const FILE_SEPARATOR: &str = "___";
/// Namespace separator in page references.
const REF_SEPARATOR: &str = "/";

pub enum SpeciesRef {
    Id(i64),
    /// A taxon page url, e.g. `https://www.inaturalist.org/taxa/46001-Sciurus-vulgaris`.
    Url(String),
    Taxon(Taxon),
}

/// Where a species page ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesPage {
    pub name: String,
    /// Namespaced page name, root first: `Animalia/Chordata/.../Sciurus vulgaris`.
    pub path: String,
}

pub struct TaxonPageWriter<'a> {
    dir: &'a Path,
    locales: &'a [String],
}

impl<'a> TaxonPageWriter<'a> {
    pub fn new(dir: &'a Path, locales: &'a [String]) -> Self {
        Self { dir, locales }
    }

    /// Make sure the species page and one page per ancestor exist.
    /// Existing pages are left untouched.
    pub fn write_species(&self, api: &impl Inat, species: SpeciesRef) -> Result<SpeciesPage> {
        let taxon = resolve_species(api, species)?;
        if !taxon.is_species() {
            return Err(Error::UnsupportedRank {
                id: taxon.id,
                rank: taxon.rank,
                expected: RANK_SPECIES,
            });
        }

        let ancestors = ancestors(api, &taxon)?;
        let mut names: Vec<&str> = Vec::with_capacity(ancestors.len() + 1);
        for anc in &ancestors {
            names.push(&anc.name);
            self.write_page(&names, ancestor_page(anc))?;
        }

        names.push(&taxon.name);
        self.write_page(&names, self.species_page(&taxon))?;

        Ok(SpeciesPage {
            name: taxon.name.clone(),
            path: names.join(REF_SEPARATOR),
        })
    }

    /// File of a namespaced page. A `/` inside a name must not open a directory.
    pub fn page_file(&self, names: &[&str]) -> PathBuf {
        let stem = names
            .iter()
            .map(|n| n.replace('/', "_"))
            .collect::<Vec<_>>()
            .join(FILE_SEPARATOR);
        self.dir.join(format!("{}.md", stem))
    }

    fn write_page(&self, names: &[&str], lines: Vec<String>) -> Result<()> {
        let path = self.page_file(names);
        if write_once(&path, &lines)? {
            info!(page = %path.display(), "Created taxon page");
        } else {
            debug!(page = %path.display(), "Taxon page exists");
        }
        Ok(())
    }

    fn species_page(&self, taxon: &Taxon) -> Vec<String> {
        let mut lines = vec![
            property("rank", page_ref(&taxon.rank)),
            property("alias", page_ref(&taxon.name)),
        ];
        for (locale, names) in taxon.local_names(self.locales) {
            lines.push(property(&locale, names.join(", ")));
        }
        lines.extend(links(taxon));
        lines
    }
}

fn ancestor_page(taxon: &Taxon) -> Vec<String> {
    let mut lines = vec![
        property("rank", page_ref(&taxon.rank)),
        property("full-name", taxon.full_name()),
        property("alias", page_ref(&taxon.name)),
    ];
    lines.extend(links(taxon));
    lines
}

fn links(taxon: &Taxon) -> Vec<String> {
    let mut lines = vec![property("iNat-url", taxon.url())];
    if let Some(wiki) = &taxon.wikipedia_url {
        lines.push(property("wiki-url", wiki));
    }
    lines
}

fn resolve_species(api: &impl Inat, species: SpeciesRef) -> Result<Taxon> {
    let id = match species {
        SpeciesRef::Taxon(taxon) => return Ok(taxon),
        SpeciesRef::Id(id) => id,
        // strict parsing: Ok(None) cannot happen
        SpeciesRef::Url(url) => parse_taxon_id(&url, true)?.ok_or(Error::InvalidTaxonUrl(url))?,
    };

    let mut found: Vec<Taxon> = api.species(id)?.into_iter().filter(|t| t.id == id).collect();
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => {
            // not a species at all, or unknown
            let taxa = api.taxa(&[id])?;
            match taxa.into_iter().find(|t| t.id == id) {
                Some(t) => Err(Error::UnsupportedRank {
                    id,
                    rank: t.rank,
                    expected: RANK_SPECIES,
                }),
                None => Err(Error::TaxonNotFound { id, found: 0 }),
            }
        }
        n => Err(Error::TaxonNotFound { id, found: n }),
    }
}

/// Ancestors from the root down, without the taxon itself and without
/// anything above [`MAX_ANCESTOR_RANK_LEVEL`].
fn ancestors(api: &impl Inat, taxon: &Taxon) -> Result<Vec<Taxon>> {
    let ids: Vec<i64> = taxon
        .ancestor_ids
        .iter()
        .copied()
        .filter(|&id| id != taxon.id)
        .collect();
    let mut ancestors: Vec<Taxon> = api
        .taxa(&ids)?
        .into_iter()
        .filter(|t| t.rank_level.map_or(true, |l| l <= MAX_ANCESTOR_RANK_LEVEL))
        .collect();
    ancestors.sort_by_key(|t| ids.iter().position(|&id| id == t.id));
    Ok(ancestors)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::inat::fake::FakeInat;
    use tempfile::TempDir;

    fn locales() -> Vec<String> {
        ["en", "it", "de", "fr", "es"].iter().map(|s| s.to_string()).collect()
    }

    const SQUIRREL_PATH: &str = "Animalia/Chordata/Mammalia/Rodentia/Sciuridae/Sciurus/Sciurus vulgaris";

    #[test]
    fn creates_species_and_ancestor_pages() {
        let dir = TempDir::new().unwrap();
        let locales = locales();
        let writer = TaxonPageWriter::new(dir.path(), &locales);
        let api = FakeInat::from_fixtures();

        let page = writer.write_species(&api, SpeciesRef::Id(46001)).unwrap();
        assert_eq!(page.name, "Sciurus vulgaris");
        assert_eq!(page.path, SQUIRREL_PATH);

        let mut files: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(
            files,
            vec![
                "Animalia.md",
                "Animalia___Chordata.md",
                "Animalia___Chordata___Mammalia.md",
                "Animalia___Chordata___Mammalia___Rodentia.md",
                "Animalia___Chordata___Mammalia___Rodentia___Sciuridae.md",
                "Animalia___Chordata___Mammalia___Rodentia___Sciuridae___Sciurus.md",
                "Animalia___Chordata___Mammalia___Rodentia___Sciuridae___Sciurus___Sciurus vulgaris.md",
            ]
        );
    }

    #[test]
    fn page_contents() {
        let dir = TempDir::new().unwrap();
        let locales = locales();
        let writer = TaxonPageWriter::new(dir.path(), &locales);
        let api = FakeInat::from_fixtures();
        writer.write_species(&api, SpeciesRef::Id(46001)).unwrap();

        let genus = fs::read_to_string(dir.path().join(
            "Animalia___Chordata___Mammalia___Rodentia___Sciuridae___Sciurus.md",
        ))
        .unwrap();
        assert_eq!(
            genus,
            "rank:: [[genus]]\n\
             full-name:: Genus Sciurus (Holarctic Tree Squirrels)\n\
             alias:: [[Sciurus]]\n\
             iNat-url:: https://www.inaturalist.org/taxa/46000\n\
             wiki-url:: http://en.wikipedia.org/wiki/Sciurus\n"
        );

        let species = fs::read_to_string(writer.page_file(&SQUIRREL_PATH.split('/').collect::<Vec<_>>())).unwrap();
        assert_eq!(
            species,
            "rank:: [[species]]\n\
             alias:: [[Sciurus vulgaris]]\n\
             en:: Eurasian Red Squirrel, Red Squirrel\n\
             it:: Scoiattolo comune\n\
             fr:: Écureuil roux\n\
             iNat-url:: https://www.inaturalist.org/taxa/46001\n\
             wiki-url:: http://en.wikipedia.org/wiki/Red_squirrel\n"
        );
    }

    #[test]
    fn existing_pages_are_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let api = FakeInat::from_fixtures();
        let first = vec!["en".to_string()];
        TaxonPageWriter::new(dir.path(), &first)
            .write_species(&api, SpeciesRef::Id(46001))
            .unwrap();

        let second = vec!["it".to_string()];
        let writer = TaxonPageWriter::new(dir.path(), &second);
        writer.write_species(&api, SpeciesRef::Id(46001)).unwrap();

        let species = fs::read_to_string(writer.page_file(&SQUIRREL_PATH.split('/').collect::<Vec<_>>())).unwrap();
        assert!(species.contains("en:: Eurasian Red Squirrel"));
        assert!(!species.contains("it::"));
    }

    #[test]
    fn slash_in_name_stays_in_taxa_dir() {
        let dir = TempDir::new().unwrap();
        let locales = locales();
        let writer = TaxonPageWriter::new(dir.path(), &locales);
        let mut api = FakeInat::from_fixtures();
        api.add_taxon(5001, "Sciurus vulgaris/meridionalis", "species");
        api.taxa.get_mut(&5001).unwrap().ancestor_ids = vec![48460, 1, 5001];

        let page = writer.write_species(&api, SpeciesRef::Id(5001)).unwrap();
        assert_eq!(page.path, "Animalia/Sciurus vulgaris/meridionalis");
        assert!(dir.path().join("Animalia___Sciurus vulgaris_meridionalis.md").is_file());
    }

    #[test]
    fn from_taxon_url() {
        let dir = TempDir::new().unwrap();
        let locales = locales();
        let writer = TaxonPageWriter::new(dir.path(), &locales);
        let api = FakeInat::from_fixtures();
        let page = writer
            .write_species(
                &api,
                SpeciesRef::Url("https://www.inaturalist.org/taxa/46001-Sciurus-vulgaris".into()),
            )
            .unwrap();
        assert_eq!(page.path, SQUIRREL_PATH);
    }

    #[test]
    fn genus_is_rejected() {
        let dir = TempDir::new().unwrap();
        let locales = locales();
        let writer = TaxonPageWriter::new(dir.path(), &locales);
        let api = FakeInat::from_fixtures();

        let err = writer.write_species(&api, SpeciesRef::Id(46000)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedRank { id: 46000, ref rank, .. } if rank == "genus"));

        let genus = api.taxa.get(&46000).cloned().unwrap();
        let err = writer.write_species(&api, SpeciesRef::Taxon(genus)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedRank { .. }));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unknown_taxon() {
        let dir = TempDir::new().unwrap();
        let locales = locales();
        let writer = TaxonPageWriter::new(dir.path(), &locales);
        let err = writer
            .write_species(&FakeInat::from_fixtures(), SpeciesRef::Id(1234567))
            .unwrap_err();
        assert!(matches!(err, Error::TaxonNotFound { id: 1234567, found: 0 }));
    }

    #[test]
    fn bad_taxon_url() {
        let dir = TempDir::new().unwrap();
        let locales = locales();
        let writer = TaxonPageWriter::new(dir.path(), &locales);
        let err = writer
            .write_species(
                &FakeInat::from_fixtures(),
                SpeciesRef::Url("https://www.inaturalist.org/observations/101".into()),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTaxonUrl(_)));
    }
}
