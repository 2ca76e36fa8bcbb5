use std::fs;
use std::path::Path;

use tracing::info;

use crate::errors::{Error, Result};
use crate::fetch::Mode;
use crate::inat::models::Observation;
use crate::inat::urls::sound_extension;
use crate::inat::Inat;
use crate::outline::{page_ref, page_refs, property};
use crate::taxa::SpeciesPage;

const DATE_FORMAT: &str = "%d/%m/%Y, %H:%M";
const THUMBNAIL: &str = "{:height 200, :width 200}";
const CARD_TAG: &str = "#card";

/// Subdirectory of the assets dir holding this mode's media.
pub fn asset_subdir(mode: Mode) -> String {
    format!("iNat_{}", mode.as_str())
}

/// Page that collects every flashcard of a mode.
pub fn collection_page(mode: Mode) -> String {
    format!("iNat {} flashcards", mode.as_str())
}

/// Section header, written once per run before the first card.
pub fn journal_header(mode: Mode, extra_tags: &[String]) -> Vec<String> {
    let mut refs = page_ref(&collection_page(mode));
    if !extra_tags.is_empty() {
        refs.push_str(", ");
        refs.push_str(&page_refs(extra_tags));
    }
    vec![
        format!("- ## {}", collection_page(mode)),
        format!("  {}", refs),
        format!("  {}", property("collapsed", true)),
    ]
}

/// Download the observation's first photo or sound into `<assets_dir>/iNat_<mode>/`.
/// Returns the file name.
pub fn save_asset(api: &impl Inat, obs: &Observation, mode: Mode, assets_dir: &Path) -> Result<String> {
    let (url, filename) = match mode {
        Mode::Photos => {
            let photo = obs.photos.first().ok_or(Error::MissingMedia {
                id: obs.id,
                mode: mode.as_str(),
            })?;
            (photo.medium_url(), format!("iNat_obs_{}_{}.jpg", mode.as_str(), obs.id))
        }
        Mode::Sounds => {
            let url = obs
                .sounds
                .first()
                .and_then(|s| s.file_url.clone())
                .ok_or(Error::MissingMedia {
                    id: obs.id,
                    mode: mode.as_str(),
                })?;
            let ext = sound_extension(&url)?;
            (url, format!("iNat_obs_{}_{}{}", mode.as_str(), obs.id, ext))
        }
    };

    let bytes = api.download(&url)?;
    let path = assets_dir.join(asset_subdir(mode)).join(&filename);
    fs::write(&path, &bytes).map_err(|e| Error::io(&path, e))?;
    info!(obs_id = obs.id, path = %path.display(), bytes = bytes.len(), "Saved asset");
    Ok(filename)
}

/// Lines of one flashcard: media embed, attribution, places, and the
/// species page embedded as a child block.
pub fn flashcard_block(obs: &Observation, mode: Mode, asset: &str, species: &SpeciesPage) -> Vec<String> {
    let date = obs.created_at.format(DATE_FORMAT);
    let places = obs.places();
    let places_line = if places.is_empty() {
        format!("\t  {}", CARD_TAG)
    } else {
        format!("\t  {} {}", page_refs(&places), CARD_TAG)
    };

    vec![
        format!(
            "\t- ![{}](../assets/{}/{}){}",
            asset,
            asset_subdir(mode),
            asset,
            THUMBNAIL
        ),
        format!(
            "\t  [Observation]({}) by {} on {} ",
            obs.uri(),
            page_ref(&obs.user.login),
            date
        ),
        places_line,
        format!("\t  {}", property("collapsed", true)),
        format!("\t\t- {{{{embed {}}}}}", page_ref(&species.path)),
    ]
}
