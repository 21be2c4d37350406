pub mod adapters;
#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{Cli, Commands, ImportArgs};

pub use adapters::{CosmosClient, CosmosConnector, InMemoryStore};
pub use config::{CredentialOptions, Credentials, HttpSettings, Settings};
pub use crate::core::pipeline::IngestionPipeline;
pub use crate::core::source::RecordSource;
pub use domain::model::{FileType, ImportJob, ImportSummary, Record, RowPolicy, UploadTarget};
pub use utils::error::{CadetError, ErrorKind, Result};
