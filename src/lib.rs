//! Convert iNaturalist observations into Logseq flashcards: one journal
//! block per observation plus write-once pages for each species and its
//! ancestors.

pub mod errors;
pub mod fetch;
pub mod flashcards;
pub mod inat;
pub mod ledger;
pub mod outline;
pub mod run;
pub mod settings;
pub mod taxa;

pub use errors::{Error, Result};
