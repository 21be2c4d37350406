use crate::utils::error::{CadetError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One document to upsert. Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

impl Record {
    pub fn new(data: HashMap<String, serde_json::Value>) -> Self {
        Self { data }
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.data.get(field)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Record {
    fn from(obj: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data: obj.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Tsv,
    Json,
}

impl FileType {
    pub const EXTENSIONS: [&'static str; 3] = ["csv", "tsv", "json"];

    /// Field separator for delimited formats, `None` for JSON.
    pub fn delimiter(&self) -> Option<u8> {
        match self {
            FileType::Csv => Some(b','),
            FileType::Tsv => Some(b'\t'),
            FileType::Json => None,
        }
    }

    pub fn is_delimited(&self) -> bool {
        self.delimiter().is_some()
    }
}

impl FromStr for FileType {
    type Err = CadetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(FileType::Csv),
            "tsv" => Ok(FileType::Tsv),
            "json" => Ok(FileType::Json),
            _ => Err(CadetError::InvalidConfigValueError {
                field: "file-type".to_string(),
                value: s.to_string(),
                reason: "Options: csv, tsv, json".to_string(),
            }),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Csv => "CSV",
            FileType::Tsv => "TSV",
            FileType::Json => "JSON",
        };
        f.write_str(name)
    }
}

/// How delimited rows whose width differs from the header are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowPolicy {
    /// Reject the row with a parse error.
    #[default]
    Strict,
    /// Zip by column index: missing values are left out, extra values dropped.
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub database: String,
    pub collection: String,
}

impl UploadTarget {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportJob {
    pub source: PathBuf,
    pub file_type: FileType,
    pub target: UploadTarget,
    pub row_policy: RowPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub records_upserted: usize,
    pub units_total: u64,
    pub units_completed: u64,
}
