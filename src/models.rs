//! Core data types that flow through the loader.
//!
//! A [`SourceRow`] is what the worksheet yields after column selection; a
//! [`FoodRecord`] is the document written to the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One worksheet row restricted to the columns the loader reads.
///
/// Numeric cells that are blank, non-numeric (`N`, `Tr`), or not finite are
/// `None`; zero stays `Some(0.0)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRow {
    pub name: Option<String>,
    pub energy_kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbohydrate_g: Option<f64>,
    pub fibre_g: Option<f64>,
}

/// Destination document in the `foods` collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_lower: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub fibre: Option<f64>,
}

impl FoodRecord {
    /// Record for upsert mode: carries `name_lower` for case-insensitive lookup.
    pub fn keyed(name: &str, row: &SourceRow) -> Self {
        Self {
            name_lower: Some(name.to_lowercase()),
            ..Self::plain(name, row)
        }
    }

    /// Record for append mode: the bare fields, no `name_lower`.
    pub fn plain(name: &str, row: &SourceRow) -> Self {
        Self {
            name: name.to_string(),
            name_lower: None,
            calories: row.energy_kcal,
            protein: row.protein_g,
            fat: row.fat_g,
            carbs: row.carbohydrate_g,
            fibre: row.fibre_g.filter(|v| v.is_finite()),
        }
    }

    /// JSON object form handed to a [`DocumentStore`](crate::store::DocumentStore).
    pub fn to_document(&self) -> serde_json::Value {
        // Serializing a struct of strings and Option<f64> cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// How records reach the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Create-or-replace at a key derived from the food name.
    #[default]
    Upsert,
    /// Create with a store-assigned id; re-runs duplicate documents.
    Append,
}

impl FromStr for LoadMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upsert" => Ok(LoadMode::Upsert),
            "append" => Ok(LoadMode::Append),
            other => anyhow::bail!("Unknown load mode: '{}'. Must be upsert or append.", other),
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::Upsert => write!(f, "upsert"),
            LoadMode::Append => write!(f, "append"),
        }
    }
}
