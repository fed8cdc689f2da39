use std::{fmt, str::FromStr};

use log::{debug, warn};
use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::cards::{CardId, CardRecord};

pub const COMMANDER_DECK_SIZE: u32 = 100;
pub const STANDARD_MIN_DECK_SIZE: u32 = 60;
pub const STANDARD_COPY_LIMIT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Format {
    Commander,
    Standard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DeckId(pub i64);

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeckViolation {
    #[error("Commander decks are limited to {limit} cards (currently {total}).")]
    DeckFull { limit: u32, total: u32 },
    #[error("Commander decks may only contain one copy of \"{name}\".")]
    SingletonViolation { name: String },
    #[error("Standard decks may only contain {limit} copies of \"{name}\".")]
    CopyLimit { name: String, limit: u32 },
    #[error("Quantity must be at least 1.")]
    ZeroQuantity,
    #[error("Too many copies of \"{name}\" to count.")]
    TooManyCopies { name: String },
}

/// `current + quantity` goes past `limit` or does not fit a `u32` at all.
fn exceeds(current: u32, quantity: u32, limit: u32) -> bool {
    current.checked_add(quantity).map_or(true, |n| n > limit)
}

/// Non-fatal remark attached to an accepted insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeckWarning {
    #[error(
        "Standard deck already holds {total} cards (minimum is {min}).",
        min = STANDARD_MIN_DECK_SIZE
    )]
    AboveStandardSize { total: u32 },
}

/// Deck row as persisted, without members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckHeader {
    pub id: DeckId,
    pub name: String,
    pub format: Format,
    pub commander: Option<CardId>,
}

impl fmt::Display for DeckHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({})", self.id, self.name, self.format)
    }
}

/// One line of a deck list: `[quantity] name`, e.g. `4 Lightning Bolt`
/// or `4x Lightning Bolt`. Without a quantity one copy is meant.
///
/// A leading number is always read as the quantity, so names that start
/// with a number need an explicit one: `1 1996 World Champion`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckEntry {
    pub quantity: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid deck entry \"{0}\"")]
pub struct InvalidDeckEntry(String);

impl FromStr for DeckEntry {
    type Err = InvalidDeckEntry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        let (quantity, name) = match line.split_once(' ') {
            Some((count, rest)) => match count.trim_end_matches(['x', 'X']).parse() {
                Ok(quantity) => (quantity, rest.trim()),
                Err(_) => (1, line),
            },
            None => (1, line),
        };
        if name.is_empty() {
            return Err(InvalidDeckEntry(s.to_string()));
        }
        Ok(DeckEntry {
            quantity,
            name: name.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Member<'a> {
    pub card: &'a CardRecord,
    pub quantity: u32,
}

/// A deck under construction. Members borrow their records from the
/// catalog they were picked from.
#[derive(Debug, Clone)]
pub struct Deck<'a> {
    pub id: Option<DeckId>,
    pub name: String,
    pub format: Format,
    commander: Option<&'a CardRecord>,
    members: Vec<Member<'a>>,
}

impl<'a> Deck<'a> {
    pub fn new(name: impl Into<String>, format: Format) -> Deck<'a> {
        Deck {
            id: None,
            name: name.into(),
            format,
            commander: None,
            members: vec![],
        }
    }

    /// Rebuilds a persisted deck without re-running legality checks.
    pub(crate) fn restore(
        header: &DeckHeader,
        commander: Option<&'a CardRecord>,
        members: impl IntoIterator<Item = (&'a CardRecord, u32)>,
    ) -> Deck<'a> {
        Deck {
            id: Some(header.id),
            name: header.name.clone(),
            format: header.format,
            commander,
            members: members
                .into_iter()
                .map(|(card, quantity)| Member { card, quantity })
                .collect(),
        }
    }

    pub fn commander(&self) -> Option<&'a CardRecord> {
        self.commander
    }

    /// Replaces the commander regardless of format and returns the
    /// previous one.
    pub fn set_commander(&mut self, card: &'a CardRecord) -> Option<&'a CardRecord> {
        if self.format != Format::Commander {
            debug!("{}: commander set on a {} deck", self.name, self.format);
        }
        self.commander.replace(card)
    }

    pub fn members(&self) -> &[Member<'a>] {
        &self.members
    }

    pub fn total_cards(&self) -> u32 {
        self.members
            .iter()
            .fold(0u32, |total, m| total.saturating_add(m.quantity))
    }

    /// Copies across all printings sharing the name, ignoring case.
    pub fn copies_of(&self, name: &str) -> u32 {
        self.members
            .iter()
            .filter(|m| m.card.has_name(name))
            .fold(0u32, |copies, m| copies.saturating_add(m.quantity))
    }

    pub fn add_card(
        &mut self,
        card: &'a CardRecord,
    ) -> Result<Option<DeckWarning>, DeckViolation> {
        self.add_copies(card, 1)
    }

    /// Adds `quantity` copies at once or none at all.
    pub fn add_copies(
        &mut self,
        card: &'a CardRecord,
        quantity: u32,
    ) -> Result<Option<DeckWarning>, DeckViolation> {
        if quantity == 0 {
            return Err(DeckViolation::ZeroQuantity);
        }
        let warning = self.check_legality(card, quantity)?;
        match self
            .members
            .iter_mut()
            .find(|m| m.card.is_same_printing(card))
        {
            Some(member) => member.quantity += quantity,
            None => self.members.push(Member { card, quantity }),
        }
        debug!(
            "{}: added {}x {} ({} total)",
            self.name,
            quantity,
            card.name,
            self.total_cards()
        );
        Ok(warning)
    }

    fn check_legality(
        &self,
        card: &CardRecord,
        quantity: u32,
    ) -> Result<Option<DeckWarning>, DeckViolation> {
        let total = self.total_cards();
        match self.format {
            Format::Commander => {
                if exceeds(total, quantity, COMMANDER_DECK_SIZE) {
                    return Err(DeckViolation::DeckFull {
                        limit: COMMANDER_DECK_SIZE,
                        total,
                    });
                }
                if !card.is_land() && exceeds(self.copies_of(&card.name), quantity, 1) {
                    return Err(DeckViolation::SingletonViolation {
                        name: card.name.clone(),
                    });
                }
                Ok(None)
            }
            Format::Standard => {
                let warning = if total >= STANDARD_MIN_DECK_SIZE {
                    let warning = DeckWarning::AboveStandardSize { total };
                    warn!("{}: {}", self.name, warning);
                    Some(warning)
                } else {
                    None
                };
                if exceeds(total, quantity, u32::MAX) {
                    return Err(DeckViolation::TooManyCopies {
                        name: card.name.clone(),
                    });
                }
                if !card.is_land()
                    && exceeds(self.copies_of(&card.name), quantity, STANDARD_COPY_LIMIT)
                {
                    return Err(DeckViolation::CopyLimit {
                        name: card.name.clone(),
                        limit: STANDARD_COPY_LIMIT,
                    });
                }
                Ok(warning)
            }
        }
    }

    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Deck<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Deck Summary ---")?;
        writeln!(f, "Deck Name: {}", self.name)?;
        writeln!(f, "Format: {}", self.format)?;
        match self.format {
            Format::Commander => {
                let commander = self.commander.map_or("Not selected", |c| c.name.as_str());
                writeln!(f, "Commander: {}", commander)?;
                writeln!(f, "Total Cards: {} / {}", self.total_cards(), COMMANDER_DECK_SIZE)?;
            }
            Format::Standard => {
                writeln!(
                    f,
                    "Total Cards: {} (min {})",
                    self.total_cards(),
                    STANDARD_MIN_DECK_SIZE
                )?;
            }
        }
        for Member { card, quantity } in &self.members {
            let card_type = card.card_type.map_or_else(|| "-".to_string(), |t| t.to_string());
            writeln!(
                f,
                " - {}x {} ({}) {}",
                quantity, card.name, card_type, card.mana_cost
            )?;
        }
        Ok(())
    }
}
