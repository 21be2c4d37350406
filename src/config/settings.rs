use crate::config::credentials::CredentialOptions;
use crate::utils::error::{CadetError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_API_VERSION: &str = "2018-12-31";

/// Optional settings file, e.g.
///
/// ```toml
/// [connection]
/// uri = "https://myaccount.documents.azure.com:443/"
/// primary_key = "..."
///
/// [http]
/// timeout_seconds = 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub connection: CredentialOptions,
    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            api_version: default_api_version(),
        }
    }
}

impl Settings {
    /// Loads and validates a TOML settings file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CadetError::config(format!(
                "cannot read settings file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 3600)?;
        validate_non_empty_string("http.api_version", &self.http.api_version)?;
        Ok(())
    }
}
