use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "MTGDMS_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "mtgdms.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SQLite database holding the collection and decks.
    pub database: PathBuf,
    /// Imported when `import` is run without arguments.
    pub import_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: PathBuf::from("mtgdms.sqlite3"),
            import_file: PathBuf::from("cards.csv"),
        }
    }
}

/// Looks for a config file in this order: `path`, `$MTGDMS_CONFIG`,
/// `./mtgdms.toml`. Only an explicitly named file has to exist.
pub fn get_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let explicit = path
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
    match explicit {
        Some(path) => load(&path),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.is_file() {
                load(fallback)
            } else {
                Ok(Config::default())
            }
        }
    }
}

fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[test]
fn partial_config_keeps_defaults() {
    let config: Config = toml::from_str("database = \"cards.db\"").unwrap();
    assert_eq!(config.database, PathBuf::from("cards.db"));
    assert_eq!(config.import_file, PathBuf::from("cards.csv"));
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(toml::from_str::<Config>("databse = \"cards.db\"").is_err());
}

#[test]
fn explicit_file() {
    let config = get_config(Some(Path::new("test_files/mtgdms.toml"))).unwrap();
    assert_eq!(config.database, PathBuf::from("collection.sqlite3"));
    assert_eq!(config.import_file, PathBuf::from("test_files/cards.csv"));
}

#[test]
fn missing_explicit_file() {
    let result = get_config(Some(Path::new("test_files/nonexistent.toml")));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}
