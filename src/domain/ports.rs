use crate::config::credentials::Credentials;
use crate::domain::model::Record;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Builds a store handle from resolved credentials. Must not perform I/O.
pub trait Connector: Send + Sync {
    type Store: DocumentStore;

    fn connect(&self, credentials: &Credentials) -> Result<Self::Store>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    type Database: Database;

    async fn database(&self, name: &str) -> Result<Self::Database>;
}

#[async_trait]
pub trait Database: Send + Sync {
    type Collection: Collection;

    async fn collection(&self, name: &str) -> Result<Self::Collection>;
}

/// The upload sink: insert-or-replace by document identity.
#[async_trait]
pub trait Collection: Send + Sync {
    async fn upsert(&self, record: &Record) -> Result<()>;
}

/// Receives advisory progress. Implementations use interior mutability.
pub trait ProgressObserver: Send + Sync {
    fn start(&self, total: u64);
    fn advance(&self, units: u64);
    fn finish(&self);
}
