use std::path::PathBuf;

use itertools::{Either, Itertools};
use log::{info, warn};
use thiserror::Error;

pub mod cards;
pub mod config;
pub mod deck;
pub mod error;
pub mod parsing;
pub mod storage;

use cards::{find_card, CardDraft, CardId, CardInvalidity, CardRecord};
use deck::{Deck, DeckEntry, DeckViolation, DeckWarning, Format};
use parsing::BatchReader;
use storage::Storage;

pub use error::{Error, Result};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportReport {
    pub imported: Vec<CardId>,
    /// Card name and the first check it failed.
    pub rejected: Vec<(String, CardInvalidity)>,
}

/// Imports every file or nothing: parse failures in any file abort before
/// storing. Invalid cards are skipped, the valid ones stored together.
pub fn import_cards(paths: Vec<PathBuf>, storage: &impl Storage) -> Result<ImportReport> {
    let drafts = BatchReader::from_files(paths)
        .parse()
        .map_err(Error::Import)?;

    let (rejected, cards): (Vec<_>, Vec<_>) = drafts.into_iter().partition_map(|draft| {
        let name = draft.name.clone();
        match draft.into_record() {
            Ok(card) => Either::Right(card),
            Err(reason) => Either::Left((name, reason)),
        }
    });
    for (name, reason) in &rejected {
        warn!("skipping \"{}\": {}", name, reason);
    }

    let imported = storage.create_records(&cards)?;
    info!("imported {} card(s), rejected {}", imported.len(), rejected.len());
    Ok(ImportReport { imported, rejected })
}

pub fn add_card(storage: &impl Storage, draft: CardDraft) -> Result<CardId> {
    let card = draft.into_record()?;
    Ok(storage.create_record(&card)?)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Skipped {
    #[error("Card not found: {0}")]
    UnknownCard(String),
    #[error("{name}: {violation}")]
    Violation {
        name: String,
        violation: DeckViolation,
    },
}

#[derive(Debug)]
pub struct DeckBuild<'a> {
    pub deck: Deck<'a>,
    pub skipped: Vec<Skipped>,
    pub warnings: Vec<DeckWarning>,
}

/// Assembles a deck from catalog names. Entries that are unknown or break
/// a format rule are skipped and reported, the rest still go in.
pub fn build_deck<'a>(
    catalog: &'a [CardRecord],
    name: &str,
    format: Format,
    commander: Option<&str>,
    entries: &[DeckEntry],
) -> DeckBuild<'a> {
    let mut deck = Deck::new(name, format);
    let mut skipped = vec![];
    let mut warnings = vec![];

    if let Some(commander) = commander {
        match find_card(catalog, commander) {
            Some(card) => {
                deck.set_commander(card);
            }
            None => skipped.push(Skipped::UnknownCard(commander.to_string())),
        }
    }

    for entry in entries {
        let Some(card) = find_card(catalog, &entry.name) else {
            skipped.push(Skipped::UnknownCard(entry.name.clone()));
            continue;
        };
        match deck.add_copies(card, entry.quantity) {
            Ok(warning) => warnings.extend(warning),
            Err(violation) => skipped.push(Skipped::Violation {
                name: card.name.clone(),
                violation,
            }),
        }
    }

    DeckBuild {
        deck,
        skipped,
        warnings,
    }
}
