use thiserror::Error;

#[derive(Error, Debug)]
pub enum CadetError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Settings file error: {0}")]
    SettingsError(#[from] toml::de::Error),

    #[error("Authentication failure to Azure Cosmos: {message}")]
    AuthError { message: String },

    #[error("Could not resolve {resource}: {message}")]
    ConnectionError { resource: String, message: String },

    #[error("Request rejected with status {status}: {message}")]
    RequestError { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Source file not found: {path}")]
    NotFoundError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Upload failed on record {record}: {message}")]
    UpsertError { record: usize, message: String },
}

/// Coarse classification used for exit codes and user-facing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Connection,
    NotFound,
    Parse,
    Upsert,
}

impl CadetError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::SettingsError(_) => ErrorKind::Configuration,
            Self::AuthError { .. }
            | Self::ConnectionError { .. }
            | Self::RequestError { .. }
            | Self::HttpError(_) => ErrorKind::Connection,
            Self::NotFoundError { .. } => ErrorKind::NotFound,
            Self::CsvError(_) | Self::JsonError(_) | Self::ParseError { .. } => ErrorKind::Parse,
            Self::UpsertError { .. } => ErrorKind::Upsert,
        }
    }

    /// Configuration problems exit like a usage error; everything else is a runtime failure.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Configuration => 2,
            _ => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingConfigError { field } if field == "credentials" => {
                "REQUIRED: Connection string OR *both* a URI and a key".to_string()
            }
            Self::NotFoundError { path, .. } => format!("Could not open file {}", path),
            Self::UpsertError { .. } => format!("Upload failed. {}", self),
            _ => self.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Configuration => {
                "Check the command options; run `cadet import --help` for usage"
            }
            ErrorKind::Connection => {
                "Verify the endpoint, the key and that the database and collection already exist"
            }
            ErrorKind::NotFound => "Make sure the source path exists and is readable",
            ErrorKind::Parse => "Check that the file content matches the declared --file-type",
            ErrorKind::Upsert => {
                "Records before the failing one were already written; fix the data and re-run"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, CadetError>;
