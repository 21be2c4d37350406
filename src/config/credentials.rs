use crate::utils::error::{CadetError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url};
use serde::{Deserialize, Serialize};
use url::Url;

const ENDPOINT_SEGMENT: &str = "AccountEndpoint";
const KEY_SEGMENT: &str = "AccountKey";

/// Resolved account endpoint and master key.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub endpoint: Url,
    pub key: String,
}

// Keep the key out of debug logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint.as_str())
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_uri_and_key(uri: &str, key: &str) -> Result<Self> {
        validate_url("uri", uri)?;
        validate_non_empty_string("primary-key", key)?;
        Ok(Self {
            endpoint: parse_endpoint(uri)?,
            key: key.to_string(),
        })
    }

    /// Parses `AccountEndpoint=...;AccountKey=...;` style strings.
    pub fn from_connection_string(connection_string: &str) -> Result<Self> {
        let mut endpoint = None;
        let mut key = None;

        for segment in connection_string.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (name, value) = segment.split_once('=').ok_or_else(|| {
                malformed(format!("segment '{}' is not a key=value pair", segment))
            })?;

            if name.trim().eq_ignore_ascii_case(ENDPOINT_SEGMENT) {
                endpoint = Some(value.trim());
            } else if name.trim().eq_ignore_ascii_case(KEY_SEGMENT) {
                key = Some(value.trim());
            }
        }

        let endpoint = endpoint
            .filter(|v| !v.is_empty())
            .ok_or_else(|| malformed(format!("missing {}=", ENDPOINT_SEGMENT)))?;
        let key = key
            .filter(|v| !v.is_empty())
            .ok_or_else(|| malformed(format!("missing {}=", KEY_SEGMENT)))?;

        validate_url(ENDPOINT_SEGMENT, endpoint)?;
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            key: key.to_string(),
        })
    }
}

/// The credential flags as supplied; at most one mode gets used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialOptions {
    pub uri: Option<String>,
    pub primary_key: Option<String>,
    pub connection_string: Option<String>,
}

impl CredentialOptions {
    /// URI + key wins when both modes are present.
    pub fn resolve(&self) -> Result<Credentials> {
        match (&self.uri, &self.primary_key, &self.connection_string) {
            (Some(uri), Some(key), _) => Credentials::from_uri_and_key(uri, key),
            (_, _, Some(connection_string)) => Credentials::from_connection_string(connection_string),
            _ => Err(CadetError::MissingConfigError {
                field: "credentials".to_string(),
            }),
        }
    }

    /// True when URI + key or a connection string is present.
    pub fn is_complete(&self) -> bool {
        (self.uri.is_some() && self.primary_key.is_some()) || self.connection_string.is_some()
    }

    /// A complete mode in `self` is kept whole; otherwise unset fields come from `fallback`.
    pub fn or(self, fallback: CredentialOptions) -> Self {
        if self.is_complete() {
            return self;
        }
        Self {
            uri: self.uri.or(fallback.uri),
            primary_key: self.primary_key.or(fallback.primary_key),
            connection_string: self.connection_string.or(fallback.connection_string),
        }
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw).map_err(|e| CadetError::InvalidConfigValueError {
        field: "uri".to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    // Resource paths are joined onto the endpoint, so it must end in '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn malformed(reason: String) -> CadetError {
    CadetError::config(format!(
        "The connection string is not properly formatted: {}",
        reason
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;

    #[test]
    fn test_parse_connection_string() {
        let creds = Credentials::from_connection_string(
            "AccountEndpoint=https://testinguri.com:443/;AccountKey=testing==;",
        )
        .unwrap();
        assert_eq!(creds.endpoint.as_str(), "https://testinguri.com/");
        assert_eq!(creds.key, "testing==");
    }

    #[test]
    fn test_connection_string_segment_names_ignore_case() {
        let creds =
            Credentials::from_connection_string("accountkey=abc=;accountendpoint=https://x/")
                .unwrap();
        assert_eq!(creds.endpoint.as_str(), "https://x/");
        assert_eq!(creds.key, "abc=");
    }

    #[test]
    fn test_connection_string_missing_key_is_config_error() {
        let err = Credentials::from_connection_string("AccountEndpoint=https://x/;").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("AccountKey"));
    }

    #[test]
    fn test_connection_string_garbage_is_config_error() {
        assert!(Credentials::from_connection_string("not a connection string").is_err());
        assert!(Credentials::from_connection_string("").is_err());
        assert!(Credentials::from_connection_string("AccountEndpoint=nope;AccountKey=k").is_err());
    }

    #[test]
    fn test_resolve_requires_one_mode() {
        let err = CredentialOptions::default().resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let only_uri = CredentialOptions {
            uri: Some("https://x/".to_string()),
            ..Default::default()
        };
        assert!(only_uri.resolve().is_err());
    }

    #[test]
    fn test_resolve_prefers_uri_and_key() {
        let options = CredentialOptions {
            uri: Some("https://from-uri/".to_string()),
            primary_key: Some("KEY".to_string()),
            connection_string: Some("AccountEndpoint=https://from-cs/;AccountKey=Y;".to_string()),
        };
        let creds = options.resolve().unwrap();
        assert_eq!(creds.endpoint.as_str(), "https://from-uri/");
        assert_eq!(creds.key, "KEY");
    }

    #[test]
    fn test_or_keeps_a_complete_mode_whole() {
        let cli = CredentialOptions {
            connection_string: Some("AccountEndpoint=https://from-cli/;AccountKey=CLIKEY;".to_string()),
            ..Default::default()
        };
        let file = CredentialOptions {
            uri: Some("https://from-file/".to_string()),
            primary_key: Some("FILEKEY".to_string()),
            connection_string: None,
        };

        let creds = cli.or(file).resolve().unwrap();
        assert_eq!(creds.endpoint.as_str(), "https://from-cli/");
        assert_eq!(creds.key, "CLIKEY");
    }

    #[test]
    fn test_or_fills_a_partial_mode() {
        let cli = CredentialOptions {
            primary_key: Some("CLIKEY".to_string()),
            ..Default::default()
        };
        let file = CredentialOptions {
            uri: Some("https://from-file/".to_string()),
            primary_key: Some("FILEKEY".to_string()),
            connection_string: None,
        };

        let creds = cli.or(file).resolve().unwrap();
        assert_eq!(creds.endpoint.as_str(), "https://from-file/");
        assert_eq!(creds.key, "CLIKEY");
    }

    #[test]
    fn test_endpoint_gets_trailing_slash() {
        let creds = Credentials::from_uri_and_key("https://acct.documents.azure.com:443", "k").unwrap();
        assert!(creds.endpoint.as_str().ends_with('/'));
    }

    #[test]
    fn test_debug_redacts_key() {
        let creds = Credentials::from_uri_and_key("https://x/", "secret").unwrap();
        assert!(!format!("{:?}", creds).contains("secret"));
    }
}
