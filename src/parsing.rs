use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use itertools::{Either, Itertools};
use log::debug;
use thiserror::Error;

use crate::cards::CardDraft;

/// name, mana cost, type, rarity, set, collector number, market value, foil
pub const FIELD_COUNT: usize = 8;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Could not open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Could not read line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: invalid {field} \"{value}\"")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Splits one row on commas outside of double quotes. Quotes only toggle
/// the quoted state and are dropped; there is no escaping.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = vec![];
    let mut current = String::new();
    let mut quoted = false;
    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_row(fields: &[String], line: usize) -> Result<CardDraft, ImportError> {
    let field = |i: usize| fields[i].trim();
    let collector_number = field(5)
        .parse()
        .map_err(|_| ImportError::InvalidNumber {
            line,
            field: "collector number",
            value: field(5).to_string(),
        })?;
    let market_value = field(6)
        .parse()
        .map_err(|_| ImportError::InvalidNumber {
            line,
            field: "market value",
            value: field(6).to_string(),
        })?;
    Ok(CardDraft {
        name: field(0).to_string(),
        mana_cost: field(1).to_string(),
        card_type: field(2).to_string(),
        rarity: field(3).to_string(),
        set_name: field(4).to_string(),
        collector_number,
        market_value,
        foil: field(7).eq_ignore_ascii_case("true"),
    })
}

/// Reads candidate cards, skipping the header row, blank rows and rows
/// with too few fields. A bad number aborts the whole read.
pub fn read_cards<R: BufRead>(reader: R) -> Result<Vec<CardDraft>, ImportError> {
    let mut drafts = vec![];
    for (index, line) in reader.lines().enumerate().skip(1) {
        let line_no = index + 1;
        let line = line.map_err(|source| ImportError::Read {
            line: line_no,
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_fields(&line);
        if fields.len() < FIELD_COUNT {
            debug!(
                "skipping line {}: {} of {} fields",
                line_no,
                fields.len(),
                FIELD_COUNT
            );
            continue;
        }
        drafts.push(parse_row(&fields, line_no)?);
    }
    Ok(drafts)
}

pub fn parse_file(path: &Path) -> Result<Vec<CardDraft>, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_cards(BufReader::new(file))
}

/// Parses several files and only succeeds if every one of them does.
pub struct BatchReader {
    paths: Vec<PathBuf>,
}

impl BatchReader {
    pub fn from_files(paths: Vec<PathBuf>) -> BatchReader {
        BatchReader { paths }
    }

    pub fn parse(self) -> Result<Vec<CardDraft>, Vec<(ImportError, PathBuf)>> {
        let (errors, drafts): (Vec<_>, Vec<_>) =
            self.paths.into_iter().partition_map(|path| match parse_file(&path) {
                Ok(drafts) => Either::Right(drafts),
                Err(e) => Either::Left((e, path)),
            });
        if errors.is_empty() {
            Ok(drafts.into_iter().flatten().collect())
        } else {
            Err(errors)
        }
    }
}

#[test]
fn quoted_commas() {
    assert_eq!(
        split_fields("\"Jace, the Mind Sculptor\",{2}{U}{U},Planeswalker"),
        vec!["Jace, the Mind Sculptor", "{2}{U}{U}", "Planeswalker"]
    );
    assert_eq!(split_fields("a,,b,"), vec!["a", "", "b", ""]);
}

#[test]
fn basic() {
    let result = parse_file(Path::new("test_files/cards.csv"));

    assert!(result.is_ok(), "{}", result.unwrap_err());

    let drafts = result.unwrap();
    assert_eq!(drafts.len(), 4);
    assert_eq!(
        drafts[1],
        CardDraft {
            name: "Jace, the Mind Sculptor".to_string(),
            mana_cost: "{2}{U}{U}".to_string(),
            card_type: "Planeswalker".to_string(),
            rarity: "Mythic Rare".to_string(),
            set_name: "Worldwake".to_string(),
            collector_number: 31,
            market_value: 45.5,
            foil: true,
        }
    );
    assert!(!drafts[0].foil);
}

#[test]
fn short_rows_are_skipped() {
    let csv = "name,mana,type,rarity,set,number,value,foil\n\
               Forest,None,Land\n\
               \n\
               Forest,None,Land,Common,Core,280,0.1,FALSE\n";
    let drafts = read_cards(csv.as_bytes()).unwrap();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].collector_number, 280);
}

#[test]
fn header_is_always_skipped() {
    let csv = "Shock,{R},Instant,Common,Core,1,0.2,false\n";
    assert!(read_cards(csv.as_bytes()).unwrap().is_empty());
}

#[test]
fn bad_number_aborts() {
    let result = parse_file(Path::new("test_files/bad_number.csv"));

    match result {
        Err(ImportError::InvalidNumber { line, field, value }) => {
            assert_eq!(line, 3);
            assert_eq!(field, "collector number");
            assert_eq!(value, "twelve");
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn nonexistent() {
    let result = parse_file(Path::new("test_files/nonexistent.csv"));

    assert!(result.is_err(), "The nonexistent test case exists");
}

#[test]
fn batch_collects_every_failure() {
    let result = BatchReader::from_files(vec![
        PathBuf::from("test_files/cards.csv"),
        PathBuf::from("test_files/bad_number.csv"),
        PathBuf::from("test_files/nonexistent.csv"),
    ])
    .parse();

    let errors = result.unwrap_err();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].1, PathBuf::from("test_files/bad_number.csv"));
}
