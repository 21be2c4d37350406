// Adapters layer: concrete document stores behind the domain ports.

pub mod cosmos;
pub mod memory;

pub use cosmos::{CosmosClient, CosmosConnector};
pub use memory::InMemoryStore;
