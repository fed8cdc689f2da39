use mtgdms::{
    cards::{CardDraft, CardRecord},
    deck::{Deck, DeckId, Format},
    storage::{SqliteStorage, Storage, StorageError},
};

#[macro_use]
extern crate macro_rules_attribute;

#[macro_use]
mod common;

fn card(name: &str, card_type: &str, number: i32) -> CardRecord {
    CardDraft {
        name: name.to_string(),
        mana_cost: if card_type == "Land" { "None" } else { "{R}" }.to_string(),
        card_type: card_type.to_string(),
        rarity: "Common".to_string(),
        set_name: "Core".to_string(),
        collector_number: number,
        market_value: 0.5,
        foil: false,
    }
    .into_record()
    .unwrap()
}

fn stored(storage: &SqliteStorage, cards: &[CardRecord]) -> Vec<CardRecord> {
    storage.create_records(cards).unwrap();
    storage.list_records().unwrap()
}

#[macro_rules_attribute(storage_test)]
fn update_and_delete_ignore_case(storage: &SqliteStorage) {
    stored(storage, &[card("Shock", "Instant", 1), card("Shock", "Instant", 2)]);

    assert_eq!(storage.update_market_value("SHOCK", 0.75).unwrap(), 2);
    assert_eq!(storage.update_market_value("Opt", 0.75).unwrap(), 0);
    assert!(storage
        .list_records()
        .unwrap()
        .iter()
        .all(|c| c.market_value == 0.75));

    assert!(matches!(
        storage.update_market_value("Shock", -1.0),
        Err(StorageError::Invalid(_))
    ));

    assert_eq!(storage.delete_record("shock").unwrap(), 2);
    assert_eq!(storage.delete_record("shock").unwrap(), 0);
    assert!(storage.list_records().unwrap().is_empty());
}

#[macro_rules_attribute(storage_test)]
fn membership_upsert_adds_quantity(storage: &SqliteStorage) {
    let cards = stored(storage, &[card("Forest", "Land", 1)]);
    let forest = cards[0].id.unwrap();
    let deck_id = storage
        .create_deck(&Deck::new("Stompy", Format::Standard))
        .unwrap();

    storage.add_membership(deck_id, forest, 2).unwrap();
    storage.add_membership(deck_id, forest, 3).unwrap();

    let loaded = storage.load_deck_with_members(deck_id).unwrap();
    assert_eq!(loaded.members.len(), 1);
    assert_eq!(loaded.members[0].1, 5);
    assert_eq!(loaded.header.name, "Stompy");
    assert_eq!(loaded.header.format, Format::Standard);
}

#[macro_rules_attribute(storage_test)]
fn saved_deck_loads_back(storage: &SqliteStorage) {
    let cards = stored(
        storage,
        &[
            card("Krenko, Mob Boss", "Creature", 1),
            card("Sol Ring", "Artifact", 2),
            card("Mountain", "Land", 3),
        ],
    );
    let mut deck = Deck::new("Goblins", Format::Commander);
    deck.set_commander(&cards[0]);
    deck.add_card(&cards[1]).unwrap();
    deck.add_copies(&cards[2], 30).unwrap();

    let id = storage.save_deck(&deck).unwrap();
    let loaded = storage.load_deck_with_members(id).unwrap();

    assert_eq!(loaded.header.commander, cards[0].id);
    assert_eq!(loaded.commander.as_ref(), Some(&cards[0]));
    assert_eq!(
        loaded.members,
        vec![(cards[1].clone(), 1), (cards[2].clone(), 30)]
    );
    let mut expected = deck.clone();
    expected.id = Some(id);
    assert_eq!(loaded.deck().summary(), expected.summary());
    assert_eq!(storage.list_decks().unwrap(), vec![loaded.header.clone()]);
}

#[macro_rules_attribute(storage_test)]
fn unsaved_member_commits_nothing(storage: &SqliteStorage) {
    let cards = stored(storage, &[card("Shock", "Instant", 1)]);
    let loose = card("Opt", "Instant", 2);
    let mut deck = Deck::new("Burn", Format::Standard);
    deck.add_card(&cards[0]).unwrap();
    deck.add_card(&loose).unwrap();

    match storage.save_deck(&deck) {
        Err(StorageError::UnsavedCard(name)) => assert_eq!(name, "Opt"),
        other => panic!("unexpected result {:?}", other),
    }
    assert!(storage.list_decks().unwrap().is_empty());
}

#[macro_rules_attribute(storage_test)]
fn deleting_a_card_updates_decks(storage: &SqliteStorage) {
    let cards = stored(
        storage,
        &[card("Krenko, Mob Boss", "Creature", 1), card("Mountain", "Land", 2)],
    );
    let mut deck = Deck::new("Goblins", Format::Commander);
    deck.set_commander(&cards[0]);
    deck.add_card(&cards[0]).unwrap();
    deck.add_copies(&cards[1], 10).unwrap();
    let id = storage.save_deck(&deck).unwrap();

    storage.delete_record("krenko, mob boss").unwrap();

    let loaded = storage.load_deck_with_members(id).unwrap();
    assert_eq!(loaded.header.commander, None);
    assert_eq!(loaded.commander, None);
    assert_eq!(loaded.members, vec![(cards[1].clone(), 10)]);
}

#[macro_rules_attribute(storage_test)]
fn unknown_deck(storage: &SqliteStorage) {
    assert!(matches!(
        storage.load_deck_with_members(DeckId(42)),
        Err(StorageError::UnknownDeck(DeckId(42)))
    ));
}
