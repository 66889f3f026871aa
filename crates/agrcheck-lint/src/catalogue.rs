//! Requirement catalogue loading.
//!
//! A catalogue is a JSON array of rows, one per acceptance requirement of a
//! tier. `auto` and `recommendation` accept booleans, numbers or the `"0"` /
//! `"1"` strings spreadsheet exports produce.

use agrcheck_scene::Tier;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a catalogue.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("failed to read catalogue {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalogue JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("requirement {0} appears more than once")]
    Duplicate(String),

    #[error("catalogue row {index} has an empty requirement number")]
    MissingNumber { index: usize },
}

/// One catalogue row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementRow {
    /// Row identifier of the source table.
    pub req_id: String,
    /// Requirement id the rules report against, e.g. `2.10.4.1`.
    pub req_num: String,
    pub category: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "flag")]
    pub auto: bool,
    /// Advisory rows; they never reach the checklist.
    #[serde(default, deserialize_with = "flag")]
    pub recommendation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_link: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(i64),
    Text(String),
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Number(n) => n != 0,
        Flag::Text(s) => !matches!(s.trim(), "" | "0" | "false" | "False"),
    })
}

/// The requirement rows of one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalogue {
    pub tier: Tier,
    rows: Vec<RequirementRow>,
}

impl Catalogue {
    /// Builds a catalogue, dropping recommendations.
    pub fn new(tier: Tier, rows: Vec<RequirementRow>) -> Result<Self, CatalogueError> {
        let mut seen = HashSet::new();
        for (index, row) in rows.iter().enumerate() {
            if row.req_num.trim().is_empty() {
                return Err(CatalogueError::MissingNumber { index });
            }
            if !row.recommendation && !seen.insert(row.req_num.as_str()) {
                return Err(CatalogueError::Duplicate(row.req_num.clone()));
            }
        }
        let rows = rows.into_iter().filter(|r| !r.recommendation).collect();
        Ok(Self { tier, rows })
    }

    pub fn from_json(tier: Tier, text: &str) -> Result<Self, CatalogueError> {
        let rows: Vec<RequirementRow> = serde_json::from_str(text)?;
        Self::new(tier, rows)
    }

    pub fn load(tier: Tier, path: &Path) -> Result<Self, CatalogueError> {
        let text = std::fs::read_to_string(path).map_err(|source| CatalogueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(tier, &text)
    }

    /// Rows in catalogue order.
    pub fn rows(&self) -> &[RequirementRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, req_num: &str) -> Option<&RequirementRow> {
        self.rows.iter().find(|r| r.req_num == req_num)
    }
}
