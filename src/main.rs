use std::{path::PathBuf, process::ExitCode};

use clap::{Args, Parser, Subcommand};

use mtgdms::{
    add_card, build_deck,
    cards::{CardDraft, CardType, ManaCost, ManaSymbol},
    config::get_config,
    deck::{DeckEntry, DeckId, Format},
    import_cards,
    storage::{SqliteStorage, Storage},
    Error, Result,
};

#[derive(Parser)]
#[command(name = "mtgdms", version, about = "Magic: The Gathering collection and deck manager")]
struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database, overrides the config
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a card to the collection
    Add(AddArgs),
    /// Show the collection
    List {
        #[arg(long)]
        json: bool,
    },
    /// Change the market value of every card with this name
    Update {
        name: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Remove every card with this name
    Remove { name: String },
    /// Load cards from CSV files
    Import { files: Vec<PathBuf> },
    #[command(subcommand)]
    Deck(DeckCommand),
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    name: String,
    /// Mana symbols such as W, U, B, R, G, C, X or a number; repeatable
    #[arg(long = "mana", value_name = "SYMBOL")]
    mana: Vec<ManaSymbol>,
    #[arg(long = "type", default_value = "")]
    card_type: String,
    #[arg(long, default_value = "")]
    rarity: String,
    #[arg(long = "set", default_value = "")]
    set_name: String,
    #[arg(long = "number", allow_negative_numbers = true)]
    collector_number: i32,
    #[arg(long = "value", allow_negative_numbers = true)]
    market_value: f64,
    #[arg(long)]
    foil: bool,
}

#[derive(Subcommand)]
enum DeckCommand {
    /// Build a deck from collection cards, e.g. `"4 Lightning Bolt"`
    Build {
        #[arg(long)]
        name: String,
        #[arg(long)]
        format: Format,
        #[arg(long)]
        commander: Option<String>,
        entries: Vec<DeckEntry>,
    },
    /// Print a saved deck
    Show { id: i64 },
    /// List saved decks
    List,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ Error::Import(_)) => {
            eprintln!("{}", e);
            ExitCode::from(65)
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = get_config(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    let storage = SqliteStorage::open(&config.database)?;

    match cli.command {
        Command::Add(args) => add(&storage, args),
        Command::List { json } => list(&storage, json),
        Command::Update { name, value } => {
            match storage.update_market_value(&name, value)? {
                0 => println!("Card not found."),
                _ => println!("Card updated successfully!"),
            }
            Ok(())
        }
        Command::Remove { name } => {
            match storage.delete_record(&name)? {
                0 => println!("Card not found."),
                _ => println!("Card deleted successfully!"),
            }
            Ok(())
        }
        Command::Import { files } => {
            let files = if files.is_empty() {
                vec![config.import_file]
            } else {
                files
            };
            let report = import_cards(files, &storage)?;
            for (name, reason) in &report.rejected {
                eprintln!("Skipped \"{}\": {}", name, reason);
            }
            println!(
                "Loaded {} card(s), skipped {}.",
                report.imported.len(),
                report.rejected.len()
            );
            Ok(())
        }
        Command::Deck(command) => deck(&storage, command),
    }
}

fn add(storage: &impl Storage, args: AddArgs) -> Result<()> {
    let is_land = args
        .card_type
        .parse::<CardType>()
        .is_ok_and(|t| t == CardType::Land);
    let mana_cost = if is_land {
        ManaCost::none()
    } else {
        ManaCost::from_symbols(args.mana)
    };
    let draft = CardDraft {
        name: args.name,
        mana_cost: mana_cost.to_string(),
        card_type: args.card_type,
        rarity: args.rarity,
        set_name: args.set_name,
        collector_number: args.collector_number,
        market_value: args.market_value,
        foil: args.foil,
    };
    match add_card(storage, draft) {
        Ok(id) => println!("Card added successfully! (ID {})", id),
        Err(Error::Invalid(reason)) => eprintln!("Invalid card data: {}", reason),
        Err(e) => return Err(e),
    }
    Ok(())
}

fn list(storage: &impl Storage, json: bool) -> Result<()> {
    let cards = storage.list_records()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
    } else if cards.is_empty() {
        println!("No cards found in the collection.");
    } else {
        println!("--- Your Collection ({} cards) ---", cards.len());
        for card in &cards {
            println!("{}", card);
        }
    }
    Ok(())
}

fn deck(storage: &impl Storage, command: DeckCommand) -> Result<()> {
    match command {
        DeckCommand::Build {
            name,
            format,
            commander,
            entries,
        } => {
            let catalog = storage.list_records()?;
            let build = build_deck(&catalog, &name, format, commander.as_deref(), &entries);
            for skipped in &build.skipped {
                eprintln!("Error: {}", skipped);
            }
            for warning in &build.warnings {
                eprintln!("Warning: {}", warning);
            }
            let id = storage.save_deck(&build.deck)?;
            println!("Deck saved successfully! (ID {})", id);
            print!("{}", build.deck.summary());
        }
        DeckCommand::Show { id } => {
            let loaded = storage.load_deck_with_members(DeckId(id))?;
            print!("{}", loaded.deck().summary());
        }
        DeckCommand::List => {
            let decks = storage.list_decks()?;
            if decks.is_empty() {
                println!("No decks found.");
            }
            for header in decks {
                println!("{}", header);
            }
        }
    }
    Ok(())
}
