use crate::config::credentials::CredentialOptions;
use crate::config::settings::Settings;
use crate::domain::model::{FileType, ImportJob, RowPolicy, UploadTarget};
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, validate_non_empty_string, Validate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cadet", version)]
#[command(about = "Upload CSV, TSV and JSON files to an Azure Cosmos DB collection")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upsert every record of SOURCE into an existing collection
    Import(ImportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ImportArgs {
    /// Source file (.csv, .tsv or .json)
    pub source: PathBuf,

    #[arg(short = 's', long, env = "CADET_CONNECTION_STRING", hide_env_values = true)]
    #[arg(help = "The connection string for the database")]
    pub connection_string: Option<String>,

    #[arg(short = 'u', long, env = "CADET_URI")]
    #[arg(help = "The endpoint URI for the CosmosDB instance")]
    pub uri: Option<String>,

    #[arg(short = 'k', long, alias = "key", env = "CADET_PRIMARY_KEY", hide_env_values = true)]
    #[arg(help = "The key provided to access the CosmosDB database")]
    pub primary_key: Option<String>,

    #[arg(short = 'd', long, alias = "database")]
    #[arg(help = "The name of the database to connect to")]
    pub database_name: String,

    #[arg(short = 'c', long, aliases = ["collection", "container", "container-name"])]
    #[arg(help = "The collection/container to load the data into")]
    pub collection_name: String,

    #[arg(short = 't', long, alias = "type")]
    #[arg(help = "The source file's type (Options: csv, tsv, json)")]
    pub file_type: String,

    #[arg(long, help = "Zip ragged rows by column index instead of rejecting them")]
    pub allow_ragged_rows: bool,

    #[arg(long, help = "TOML settings file with connection and HTTP defaults")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Disable the progress bar")]
    pub no_progress: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl ImportArgs {
    pub fn load_settings(&self) -> Result<Settings> {
        match &self.config {
            Some(path) => Settings::from_file(path),
            None => Ok(Settings::default()),
        }
    }

    /// Command-line and environment values win over the settings file; a
    /// complete credential mode given here ignores the file's credentials.
    pub fn credential_options(&self, settings: &Settings) -> CredentialOptions {
        CredentialOptions {
            uri: self.uri.clone(),
            primary_key: self.primary_key.clone(),
            connection_string: self.connection_string.clone(),
        }
        .or(settings.connection.clone())
    }

    pub fn to_job(&self) -> Result<ImportJob> {
        self.validate()?;
        Ok(ImportJob {
            source: self.source.clone(),
            file_type: self.file_type.parse()?,
            target: UploadTarget::new(&self.database_name, &self.collection_name),
            row_policy: if self.allow_ragged_rows {
                RowPolicy::Lenient
            } else {
                RowPolicy::Strict
            },
        })
    }
}

impl Validate for ImportArgs {
    fn validate(&self) -> Result<()> {
        validate_file_extension("source", &self.source, &FileType::EXTENSIONS)?;
        validate_non_empty_string("database-name", &self.database_name)?;
        validate_non_empty_string("collection-name", &self.collection_name)?;
        self.file_type.parse::<FileType>()?;
        Ok(())
    }
}
