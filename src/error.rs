use std::{path::PathBuf, result::Result as StdResult};

use thiserror::Error;

use crate::{
    cards::CardInvalidity, config::ConfigError, deck::DeckViolation, parsing::ImportError,
    storage::StorageError,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Invalid(#[from] CardInvalidity),

    #[error(transparent)]
    Deck(#[from] DeckViolation),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Error loading cards:{}", render_batch(.0))]
    Import(Vec<(ImportError, PathBuf)>),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = StdResult<T, Error>;

fn render_batch(errors: &[(ImportError, PathBuf)]) -> String {
    errors
        .iter()
        .map(|(e, path)| format!("\n{}: {}", path.display(), e))
        .collect()
}
