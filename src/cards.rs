use std::{fmt, str::FromStr};

use log::warn;
use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;

/// Mana cost stored for cards without a cost, i.e. lands.
pub const NO_MANA_COST: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CardId(pub i64);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum CardType {
    Land,
    Creature,
    Artifact,
    Enchantment,
    Planeswalker,
    Battle,
    Instant,
    Sorcery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    #[strum(to_string = "Mythic Rare")]
    #[serde(rename = "Mythic Rare")]
    MythicRare,
}

/// A single mana symbol as printed in a cost, e.g. `{W}` or `{3}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManaSymbol {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
    Variable,
    Generic(u32),
}

impl fmt::Display for ManaSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManaSymbol::White => f.write_str("{W}"),
            ManaSymbol::Blue => f.write_str("{U}"),
            ManaSymbol::Black => f.write_str("{B}"),
            ManaSymbol::Red => f.write_str("{R}"),
            ManaSymbol::Green => f.write_str("{G}"),
            ManaSymbol::Colorless => f.write_str("{C}"),
            ManaSymbol::Variable => f.write_str("{X}"),
            ManaSymbol::Generic(n) => write!(f, "{{{}}}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mana symbol \"{0}\"")]
pub struct UnknownManaSymbol(String);

impl FromStr for ManaSymbol {
    type Err = UnknownManaSymbol;

    /// Accepts both bare (`W`, `3`) and bracketed (`{W}`, `{3}`) symbols.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bare = trimmed
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(trimmed);
        match bare.to_ascii_uppercase().as_str() {
            "W" => Ok(ManaSymbol::White),
            "U" => Ok(ManaSymbol::Blue),
            "B" => Ok(ManaSymbol::Black),
            "R" => Ok(ManaSymbol::Red),
            "G" => Ok(ManaSymbol::Green),
            "C" => Ok(ManaSymbol::Colorless),
            "X" => Ok(ManaSymbol::Variable),
            digits => digits
                .parse()
                .map(ManaSymbol::Generic)
                .map_err(|_| UnknownManaSymbol(s.to_string())),
        }
    }
}

/// Cost text, kept verbatim so imported costs survive unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ManaCost(String);

impl ManaCost {
    pub fn none() -> ManaCost {
        ManaCost(NO_MANA_COST.to_string())
    }

    pub fn from_symbols<I: IntoIterator<Item = ManaSymbol>>(symbols: I) -> ManaCost {
        let cost: String = symbols.into_iter().map(|s| s.to_string()).collect();
        if cost.is_empty() {
            ManaCost::none()
        } else {
            ManaCost(cost)
        }
    }

    pub fn is_none(&self) -> bool {
        self.0 == NO_MANA_COST
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ManaCost {
    fn from(cost: String) -> Self {
        ManaCost(cost)
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First record carrying `name`, ignoring case.
pub fn find_card<'a>(catalog: &'a [CardRecord], name: &str) -> Option<&'a CardRecord> {
    catalog.iter().find(|card| card.has_name(name))
}

/// Case-insensitive name comparison used for every card lookup.
pub fn same_name(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CardInvalidity {
    #[error("Card name cannot be blank.")]
    NameEmpty,
    #[error("Invalid card type \"{0}\".")]
    InvalidType(String),
    #[error("Invalid card rarity \"{0}\".")]
    InvalidRarity(String),
    #[error("Set name cannot be blank.")]
    SetNameEmpty,
    #[error("Collector number must be greater than 0 (got {0}).")]
    CollectorNumberNotPositive(i32),
    #[error("Market value cannot be negative (got {0}).")]
    MarketValueNegative(f64),
}

/// Raw field values of a card as entered by a user or read from an import
/// file. Nothing is checked until [`CardDraft::validate`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CardDraft {
    pub name: String,
    pub mana_cost: String,
    pub card_type: String,
    pub rarity: String,
    pub set_name: String,
    pub collector_number: i32,
    pub market_value: f64,
    pub foil: bool,
}

impl CardDraft {
    /// Runs the checks in order and reports the first failure.
    pub fn validate(&self) -> Result<(), CardInvalidity> {
        self.checked().map(|_| ())
    }

    /// Same as [`CardDraft::validate`] but only logs the reason.
    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(reason) => {
                warn!("rejected card \"{}\": {}", self.name, reason);
                false
            }
        }
    }

    pub fn into_record(self) -> Result<CardRecord, CardInvalidity> {
        let (card_type, rarity, collector_number) = self.checked()?;
        let mana_cost = if self.mana_cost.is_empty() {
            ManaCost::none()
        } else {
            ManaCost(self.mana_cost)
        };
        Ok(CardRecord {
            id: None,
            name: self.name,
            mana_cost,
            card_type,
            rarity,
            set_name: self.set_name,
            collector_number,
            market_value: self.market_value,
            foil: self.foil,
        })
    }

    fn checked(&self) -> Result<(Option<CardType>, Option<Rarity>, u32), CardInvalidity> {
        if self.name.is_empty() {
            return Err(CardInvalidity::NameEmpty);
        }
        let card_type = if self.card_type.is_empty() {
            None
        } else {
            Some(
                self.card_type
                    .parse()
                    .map_err(|_| CardInvalidity::InvalidType(self.card_type.clone()))?,
            )
        };
        let rarity = if self.rarity.is_empty() {
            None
        } else {
            Some(
                self.rarity
                    .parse()
                    .map_err(|_| CardInvalidity::InvalidRarity(self.rarity.clone()))?,
            )
        };
        if self.set_name.is_empty() {
            return Err(CardInvalidity::SetNameEmpty);
        }
        if self.collector_number <= 0 {
            return Err(CardInvalidity::CollectorNumberNotPositive(self.collector_number));
        }
        check_market_value(self.market_value)?;
        Ok((card_type, rarity, self.collector_number.unsigned_abs()))
    }
}

/// NaN fails as well.
pub fn check_market_value(value: f64) -> Result<(), CardInvalidity> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(CardInvalidity::MarketValueNegative(value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CardId>,
    pub name: String,
    pub mana_cost: ManaCost,
    pub card_type: Option<CardType>,
    pub rarity: Option<Rarity>,
    pub set_name: String,
    pub collector_number: u32,
    pub market_value: f64,
    pub foil: bool,
}

impl CardRecord {
    pub fn is_land(&self) -> bool {
        self.card_type == Some(CardType::Land)
    }

    pub fn has_name(&self, name: &str) -> bool {
        same_name(&self.name, name)
    }

    /// Whether both records describe the same owned printing. Persisted
    /// records compare by id, everything else by its printing attributes.
    pub fn is_same_printing(&self, other: &CardRecord) -> bool {
        match (self.id, other.id) {
            (Some(a), Some(b)) => a == b,
            _ => {
                self.has_name(&other.name)
                    && same_name(&self.set_name, &other.set_name)
                    && self.collector_number == other.collector_number
                    && self.foil == other.foil
            }
        }
    }

    /// In-memory counterpart of [`Storage::update_market_value`] for a
    /// single record; the value is left untouched when it is rejected.
    ///
    /// [`Storage::update_market_value`]: crate::storage::Storage::update_market_value
    pub fn revalue(&mut self, market_value: f64) -> Result<(), CardInvalidity> {
        check_market_value(market_value)?;
        self.market_value = market_value;
        Ok(())
    }
}

fn or_dash<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

impl fmt::Display for CardRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}, {}, {}, Set: {}, #{}, ${:.2}, Foil: {}]",
            self.name,
            self.mana_cost,
            or_dash(self.card_type),
            or_dash(self.rarity),
            self.set_name,
            self.collector_number,
            self.market_value,
            self.foil,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, card_type: &str, rarity: &str, number: i32, value: f64) -> CardDraft {
        CardDraft {
            name: name.to_string(),
            mana_cost: "{R}".to_string(),
            card_type: card_type.to_string(),
            rarity: rarity.to_string(),
            set_name: "Core".to_string(),
            collector_number: number,
            market_value: value,
            foil: false,
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        let card = draft("", "Instant", "Common", 1, 0.5);
        assert!(!card.is_valid());
        assert_eq!(card.validate(), Err(CardInvalidity::NameEmpty));
    }

    #[test]
    fn zero_collector_number_is_rejected() {
        let card = draft("Bolt", "Instant", "Common", 0, 0.5);
        assert!(!card.is_valid());
        assert_eq!(
            card.validate(),
            Err(CardInvalidity::CollectorNumberNotPositive(0))
        );
    }

    #[test]
    fn checks_short_circuit_in_order() {
        let mut card = draft("", "Goblin", "Shiny", 0, -1.0);
        card.set_name.clear();
        assert_eq!(card.validate(), Err(CardInvalidity::NameEmpty));
        card.name = "Bolt".to_string();
        assert_eq!(
            card.validate(),
            Err(CardInvalidity::InvalidType("Goblin".to_string()))
        );
        card.card_type = "instant".to_string();
        assert_eq!(
            card.validate(),
            Err(CardInvalidity::InvalidRarity("Shiny".to_string()))
        );
        card.rarity = "MYTHIC RARE".to_string();
        assert_eq!(card.validate(), Err(CardInvalidity::SetNameEmpty));
        card.set_name = "Core".to_string();
        assert_eq!(
            card.validate(),
            Err(CardInvalidity::CollectorNumberNotPositive(0))
        );
        card.collector_number = 7;
        assert_eq!(card.validate(), Err(CardInvalidity::MarketValueNegative(-1.0)));
        card.market_value = 0.0;
        assert_eq!(card.validate(), Ok(()));
    }

    #[test]
    fn empty_classification_is_tolerated() {
        let record = draft("Bolt", "", "", 150, 1.25).into_record().unwrap();
        assert_eq!(record.card_type, None);
        assert_eq!(record.rarity, None);
    }

    #[test]
    fn vocabulary_is_case_insensitive() {
        let record = draft("Bolt", "iNsTaNt", "mythic rare", 1, 0.0)
            .into_record()
            .unwrap();
        assert_eq!(record.card_type, Some(CardType::Instant));
        assert_eq!(record.rarity, Some(Rarity::MythicRare));
        assert_eq!(record.rarity.unwrap().to_string(), "Mythic Rare");
    }

    #[test]
    fn nan_market_value_is_rejected() {
        assert!(!draft("Bolt", "Instant", "Common", 1, f64::NAN).is_valid());
    }

    #[test]
    fn revalue_rejects_negative() {
        let mut record = draft("Bolt", "Instant", "Common", 1, 1.0)
            .into_record()
            .unwrap();
        assert!(record.revalue(-0.01).is_err());
        assert_eq!(record.market_value, 1.0);
        record.revalue(2.5).unwrap();
        assert_eq!(record.market_value, 2.5);
    }

    #[test]
    fn mana_cost_from_symbols() {
        let symbols: Vec<ManaSymbol> = ["1", "w", "{U}"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(ManaCost::from_symbols(symbols).as_str(), "{1}{W}{U}");
        assert!(ManaCost::from_symbols(Vec::new()).is_none());
        assert!("Q".parse::<ManaSymbol>().is_err());
    }

    #[test]
    fn display() {
        let record = draft("Lightning Bolt", "Instant", "Common", 150, 1.25)
            .into_record()
            .unwrap();
        assert_eq!(
            record.to_string(),
            "Lightning Bolt [{R}, Instant, Common, Set: Core, #150, $1.25, Foil: false]"
        );
    }

    #[test]
    fn names_match_ignoring_case() {
        assert!(same_name("Lightning Bolt", "LIGHTNING BOLT"));
        assert!(!same_name("Lightning Bolt", "Lightning Helix"));
    }
}
