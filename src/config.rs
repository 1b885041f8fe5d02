//! TOML configuration.
//!
//! Every field has a default matching the CoFID 2021 release, so an empty
//! file (or no file at all) describes the stock import:
//!
//! ```toml
//! [source]
//! path = "McCance_Widdowsons_Composition_of_Foods_Integrated_Dataset_2021..xlsx"
//! sheet = "1.3 Proximates"
//! header_row = 0
//!
//! [source.columns]
//! name = "Food Name"
//! energy = "Energy (kcal) (kcal)"
//! protein = "Protein (g)"
//! fat = "Fat (g)"
//! carbs = "Carbohydrate (g)"
//! fibre = "AOAC fibre (g)"
//!
//! [store]
//! collection = "foods"
//! credentials = "serviceAccountKey.json"
//! # project_id = "my-project"          # defaults to the key's project_id
//! # emulator_host = "localhost:8080"   # or FIRESTORE_EMULATOR_HOST
//!
//! [load]
//! mode = "upsert"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::LoadMode;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
    #[serde(default = "default_sheet")]
    pub sheet: String,
    /// Zero-based index of the row holding the column headers.
    #[serde(default)]
    pub header_row: usize,
    #[serde(default)]
    pub columns: ColumnNames,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
            sheet: default_sheet(),
            header_row: 0,
            columns: ColumnNames::default(),
        }
    }
}

fn default_source_path() -> PathBuf {
    PathBuf::from("McCance_Widdowsons_Composition_of_Foods_Integrated_Dataset_2021..xlsx")
}
fn default_sheet() -> String {
    "1.3 Proximates".to_string()
}

/// Exact header strings of the columns the loader reads.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    #[serde(default = "default_name_column")]
    pub name: String,
    #[serde(default = "default_energy_column")]
    pub energy: String,
    #[serde(default = "default_protein_column")]
    pub protein: String,
    #[serde(default = "default_fat_column")]
    pub fat: String,
    #[serde(default = "default_carbs_column")]
    pub carbs: String,
    #[serde(default = "default_fibre_column")]
    pub fibre: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            name: default_name_column(),
            energy: default_energy_column(),
            protein: default_protein_column(),
            fat: default_fat_column(),
            carbs: default_carbs_column(),
            fibre: default_fibre_column(),
        }
    }
}

impl ColumnNames {
    /// All required headers, identifying field first.
    pub fn required(&self) -> [&str; 6] {
        [
            &self.name,
            &self.energy,
            &self.protein,
            &self.fat,
            &self.carbs,
            &self.fibre,
        ]
    }
}

fn default_name_column() -> String {
    "Food Name".to_string()
}
fn default_energy_column() -> String {
    "Energy (kcal) (kcal)".to_string()
}
fn default_protein_column() -> String {
    "Protein (g)".to_string()
}
fn default_fat_column() -> String {
    "Fat (g)".to_string()
}
fn default_carbs_column() -> String {
    "Carbohydrate (g)".to_string()
}
fn default_fibre_column() -> String {
    "AOAC fibre (g)".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_credentials")]
    pub credentials: PathBuf,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default)]
    pub emulator_host: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            credentials: default_credentials(),
            project_id: None,
            database: default_database(),
            emulator_host: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_collection() -> String {
    "foods".to_string()
}
fn default_credentials() -> PathBuf {
    PathBuf::from("serviceAccountKey.json")
}
fn default_database() -> String {
    "(default)".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl StoreConfig {
    /// Emulator address from config, falling back to `FIRESTORE_EMULATOR_HOST`.
    pub fn resolved_emulator_host(&self) -> Option<String> {
        self.emulator_host
            .clone()
            .or_else(|| std::env::var("FIRESTORE_EMULATOR_HOST").ok())
            .filter(|h| !h.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoadConfig {
    #[serde(default)]
    pub mode: LoadMode,
}

/// Config file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./cofid.toml";

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Load `path` if given, else `./cofid.toml` if present, else built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_PATH);
            if fallback.exists() {
                load_config(fallback)
            } else {
                log::debug!("no config file, using built-in defaults");
                Ok(Config::default())
            }
        }
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.source.sheet.trim().is_empty() {
        bail!("source.sheet must not be empty");
    }

    for header in config.source.columns.required() {
        if header.trim().is_empty() {
            bail!("source.columns entries must not be empty");
        }
    }

    if config.store.collection.is_empty() || config.store.collection.contains('/') {
        bail!(
            "store.collection must be a single non-empty path segment, got '{}'",
            config.store.collection
        );
    }

    if config.store.timeout_secs == 0 {
        bail!("store.timeout_secs must be > 0");
    }

    Ok(config)
}
