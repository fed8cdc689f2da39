use std::{path::Path, str::FromStr};

use log::{debug, info};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use thiserror::Error;

use crate::{
    cards::{check_market_value, CardId, CardInvalidity, CardRecord},
    deck::{Deck, DeckHeader, DeckId},
};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Invalid(#[from] CardInvalidity),
    #[error("Card \"{0}\" has not been saved to the collection.")]
    UnsavedCard(String),
    #[error("Deck {0} does not exist.")]
    UnknownDeck(DeckId),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A deck read back from storage, owning its cards.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDeck {
    pub header: DeckHeader,
    pub commander: Option<CardRecord>,
    pub members: Vec<(CardRecord, u32)>,
}

impl LoadedDeck {
    pub fn deck(&self) -> Deck<'_> {
        Deck::restore(
            &self.header,
            self.commander.as_ref(),
            self.members.iter().map(|(card, quantity)| (card, *quantity)),
        )
    }
}

/// Everything the application needs from a card store. Names are matched
/// ignoring case.
pub trait Storage {
    fn create_record(&self, card: &CardRecord) -> StorageResult<CardId>;

    /// Stores several cards, stopping at the first failure.
    fn create_records(&self, cards: &[CardRecord]) -> StorageResult<Vec<CardId>> {
        cards.iter().map(|card| self.create_record(card)).collect()
    }

    fn list_records(&self) -> StorageResult<Vec<CardRecord>>;

    /// Returns the number of updated rows.
    fn update_market_value(&self, name: &str, market_value: f64) -> StorageResult<usize>;

    /// Returns the number of deleted rows.
    fn delete_record(&self, name: &str) -> StorageResult<usize>;

    /// Stores the deck header only.
    fn create_deck(&self, deck: &Deck<'_>) -> StorageResult<DeckId>;

    /// Adding a card that is already part of the deck increases its quantity.
    fn add_membership(&self, deck: DeckId, card: CardId, quantity: u32) -> StorageResult<()>;

    fn load_deck_with_members(&self, deck: DeckId) -> StorageResult<LoadedDeck>;

    /// Stores header and members as a unit.
    fn save_deck(&self, deck: &Deck<'_>) -> StorageResult<DeckId>;

    fn list_decks(&self) -> StorageResult<Vec<DeckHeader>>;
}

const SCHEMA: &str = "
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS card (
        card_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        mana_cost TEXT NOT NULL,
        card_type TEXT,
        rarity TEXT,
        set_name TEXT NOT NULL,
        collector_number INTEGER NOT NULL CHECK (collector_number > 0),
        market_value REAL NOT NULL CHECK (market_value >= 0),
        is_foil INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS card_name ON card (name COLLATE NOCASE);
    CREATE TABLE IF NOT EXISTS deck (
        deck_id INTEGER PRIMARY KEY,
        deck_name TEXT NOT NULL,
        format TEXT NOT NULL,
        commander_id INTEGER REFERENCES card (card_id) ON DELETE SET NULL
    );
    CREATE TABLE IF NOT EXISTS deck_card (
        deck_id INTEGER NOT NULL REFERENCES deck (deck_id) ON DELETE CASCADE,
        card_id INTEGER NOT NULL REFERENCES card (card_id) ON DELETE CASCADE,
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        PRIMARY KEY (deck_id, card_id)
    );
";

const CARD_COLUMNS: &str = "c.card_id, c.name, c.mana_cost, c.card_type, c.rarity, \
    c.set_name, c.collector_number, c.market_value, c.is_foil";

pub struct SqliteStorage {
    connection: Connection,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> StorageResult<SqliteStorage> {
        debug!("opening {}", path.display());
        SqliteStorage::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> StorageResult<SqliteStorage> {
        SqliteStorage::init(Connection::open_in_memory()?)
    }

    fn init(connection: Connection) -> StorageResult<SqliteStorage> {
        connection.execute_batch(SCHEMA)?;
        Ok(SqliteStorage { connection })
    }
}

fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: Option<String> = row.get(idx)?;
    text.map(|text| {
        text.parse()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<CardRecord> {
    Ok(CardRecord {
        id: Some(CardId(row.get(0)?)),
        name: row.get(1)?,
        mana_cost: row.get::<_, String>(2)?.into(),
        card_type: parse_text(row, 3)?,
        rarity: parse_text(row, 4)?,
        set_name: row.get(5)?,
        collector_number: row.get(6)?,
        market_value: row.get(7)?,
        foil: row.get(8)?,
    })
}

fn header_from_row(row: &Row<'_>) -> rusqlite::Result<DeckHeader> {
    let format = parse_text(row, 2)?
        .ok_or(rusqlite::Error::InvalidColumnType(2, "format".to_string(), Type::Null))?;
    Ok(DeckHeader {
        id: DeckId(row.get(0)?),
        name: row.get(1)?,
        format,
        commander: row.get::<_, Option<i64>>(3)?.map(CardId),
    })
}

fn saved_id(card: &CardRecord) -> StorageResult<CardId> {
    card.id
        .ok_or_else(|| StorageError::UnsavedCard(card.name.clone()))
}

fn insert_card(connection: &Connection, card: &CardRecord) -> StorageResult<CardId> {
    connection
        .prepare_cached(
            "INSERT INTO card (name, mana_cost, card_type, rarity, set_name,
                collector_number, market_value, is_foil)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?
        .execute(params![
            card.name,
            card.mana_cost.as_str(),
            card.card_type.map(|t| t.to_string()),
            card.rarity.map(|r| r.to_string()),
            card.set_name,
            card.collector_number,
            card.market_value,
            card.foil,
        ])?;
    let id = CardId(connection.last_insert_rowid());
    info!("Card added: {} (id {})", card.name, id);
    Ok(id)
}

fn insert_deck(connection: &Connection, deck: &Deck<'_>) -> StorageResult<DeckId> {
    let commander = deck.commander().map(saved_id).transpose()?;
    connection.execute(
        "INSERT INTO deck (deck_name, format, commander_id) VALUES (?1, ?2, ?3)",
        params![deck.name, deck.format.to_string(), commander.map(|id| id.0)],
    )?;
    let id = DeckId(connection.last_insert_rowid());
    info!("Deck created: {} ({}, id {})", deck.name, deck.format, id);
    Ok(id)
}

fn upsert_membership(
    connection: &Connection,
    deck: DeckId,
    card: CardId,
    quantity: u32,
) -> StorageResult<()> {
    connection
        .prepare_cached(
            "INSERT INTO deck_card (deck_id, card_id, quantity) VALUES (?1, ?2, ?3)
             ON CONFLICT (deck_id, card_id) DO UPDATE SET quantity = quantity + excluded.quantity",
        )?
        .execute(params![deck.0, card.0, quantity])?;
    debug!("deck {}: card {} +{}", deck, card, quantity);
    Ok(())
}

impl Storage for SqliteStorage {
    fn create_record(&self, card: &CardRecord) -> StorageResult<CardId> {
        insert_card(&self.connection, card)
    }

    fn create_records(&self, cards: &[CardRecord]) -> StorageResult<Vec<CardId>> {
        let tx = self.connection.unchecked_transaction()?;
        let ids = cards
            .iter()
            .map(|card| insert_card(&tx, card))
            .collect::<StorageResult<Vec<_>>>()?;
        tx.commit()?;
        Ok(ids)
    }

    fn list_records(&self) -> StorageResult<Vec<CardRecord>> {
        let mut select = self.connection.prepare_cached(&format!(
            "SELECT {} FROM card c ORDER BY c.card_id",
            CARD_COLUMNS
        ))?;
        let cards = select
            .query_map([], card_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    fn update_market_value(&self, name: &str, market_value: f64) -> StorageResult<usize> {
        check_market_value(market_value)?;
        let updated = self.connection.execute(
            "UPDATE card SET market_value = ?1 WHERE name = ?2 COLLATE NOCASE",
            params![market_value, name],
        )?;
        debug!("updated market value of {} row(s) named {}", updated, name);
        Ok(updated)
    }

    fn delete_record(&self, name: &str) -> StorageResult<usize> {
        let deleted = self
            .connection
            .execute("DELETE FROM card WHERE name = ?1 COLLATE NOCASE", params![name])?;
        debug!("deleted {} row(s) named {}", deleted, name);
        Ok(deleted)
    }

    fn create_deck(&self, deck: &Deck<'_>) -> StorageResult<DeckId> {
        insert_deck(&self.connection, deck)
    }

    fn add_membership(&self, deck: DeckId, card: CardId, quantity: u32) -> StorageResult<()> {
        upsert_membership(&self.connection, deck, card, quantity)
    }

    fn load_deck_with_members(&self, deck: DeckId) -> StorageResult<LoadedDeck> {
        let header = self
            .connection
            .query_row(
                "SELECT deck_id, deck_name, format, commander_id FROM deck WHERE deck_id = ?1",
                params![deck.0],
                header_from_row,
            )
            .optional()?
            .ok_or(StorageError::UnknownDeck(deck))?;
        let commander = match header.commander {
            Some(id) => self
                .connection
                .query_row(
                    &format!("SELECT {} FROM card c WHERE c.card_id = ?1", CARD_COLUMNS),
                    params![id.0],
                    card_from_row,
                )
                .optional()?,
            None => None,
        };
        let mut select = self.connection.prepare_cached(&format!(
            "SELECT {}, dc.quantity
             FROM deck_card dc
             JOIN card c ON dc.card_id = c.card_id
             WHERE dc.deck_id = ?1
             ORDER BY dc.rowid",
            CARD_COLUMNS
        ))?;
        let members = select
            .query_map(params![deck.0], |row| Ok((card_from_row(row)?, row.get(9)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(LoadedDeck {
            header,
            commander,
            members,
        })
    }

    fn save_deck(&self, deck: &Deck<'_>) -> StorageResult<DeckId> {
        // Dropping the transaction on any error rolls everything back.
        let tx = self.connection.unchecked_transaction()?;
        let id = insert_deck(&tx, deck)?;
        for member in deck.members() {
            upsert_membership(&tx, id, saved_id(member.card)?, member.quantity)?;
        }
        tx.commit()?;
        Ok(id)
    }

    fn list_decks(&self) -> StorageResult<Vec<DeckHeader>> {
        let mut select = self.connection.prepare_cached(
            "SELECT deck_id, deck_name, format, commander_id FROM deck ORDER BY deck_id",
        )?;
        let decks = select
            .query_map([], header_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(decks)
    }
}
