//! In-memory document store for exercising the pipeline without a network.

use crate::config::credentials::Credentials;
use crate::domain::model::Record;
use crate::domain::ports::{Collection, Connector, Database, DocumentStore};
use crate::utils::error::{CadetError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct State {
    databases: HashSet<String>,
    collections: HashMap<(String, String), HashMap<String, Record>>,
    upsert_calls: Vec<Record>,
    lookups: usize,
    connections: usize,
    fail_on_upsert: Option<usize>,
    rejected_key: Option<String>,
}

/// Cloning shares state, so a test can keep a handle and inspect what was written.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(database: &str, collection: &str) -> Self {
        let store = Self::new();
        store.add_collection(database, collection);
        store
    }

    pub fn add_collection(&self, database: &str, collection: &str) {
        let mut state = self.lock();
        state.databases.insert(database.to_string());
        state
            .collections
            .entry((database.to_string(), collection.to_string()))
            .or_default();
    }

    /// The `n`-th upsert call (1-based) is rejected.
    pub fn fail_on_upsert(self, n: usize) -> Self {
        self.lock().fail_on_upsert = Some(n);
        self
    }

    /// Connecting with this account key fails authentication.
    pub fn reject_key(self, key: &str) -> Self {
        self.lock().rejected_key = Some(key.to_string());
        self
    }

    /// Every record passed to `upsert`, in call order, including rejected ones.
    pub fn upsert_calls(&self) -> Vec<Record> {
        self.lock().upsert_calls.clone()
    }

    pub fn documents(&self, database: &str, collection: &str) -> Vec<Record> {
        self.lock()
            .collections
            .get(&(database.to_string(), collection.to_string()))
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of database and collection resolutions performed.
    pub fn lookups(&self) -> usize {
        self.lock().lookups
    }

    pub fn connections(&self) -> usize {
        self.lock().connections
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Connector for InMemoryStore {
    type Store = InMemoryStore;

    fn connect(&self, credentials: &Credentials) -> Result<Self::Store> {
        let mut state = self.lock();
        if state.rejected_key.as_deref() == Some(credentials.key.as_str()) {
            return Err(CadetError::AuthError {
                message: "the account key was rejected".to_string(),
            });
        }
        state.connections += 1;
        Ok(self.clone())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    type Database = InMemoryDatabase;

    async fn database(&self, name: &str) -> Result<Self::Database> {
        let mut state = self.lock();
        state.lookups += 1;
        if !state.databases.contains(name) {
            return Err(CadetError::ConnectionError {
                resource: format!("database '{}'", name),
                message: "Owner resource does not exist".to_string(),
            });
        }
        Ok(InMemoryDatabase {
            store: self.clone(),
            name: name.to_string(),
        })
    }
}

pub struct InMemoryDatabase {
    store: InMemoryStore,
    name: String,
}

#[async_trait]
impl Database for InMemoryDatabase {
    type Collection = InMemoryCollection;

    async fn collection(&self, name: &str) -> Result<Self::Collection> {
        let key = (self.name.clone(), name.to_string());
        let mut state = self.store.lock();
        state.lookups += 1;
        if !state.collections.contains_key(&key) {
            return Err(CadetError::ConnectionError {
                resource: format!("collection '{}' in database '{}'", name, self.name),
                message: "Resource Not Found".to_string(),
            });
        }
        Ok(InMemoryCollection {
            store: self.store.clone(),
            key,
        })
    }
}

pub struct InMemoryCollection {
    store: InMemoryStore,
    key: (String, String),
}

#[async_trait]
impl Collection for InMemoryCollection {
    async fn upsert(&self, record: &Record) -> Result<()> {
        let identity = document_identity(record)?;
        let mut state = self.store.lock();
        state.upsert_calls.push(record.clone());

        if state.fail_on_upsert == Some(state.upsert_calls.len()) {
            return Err(CadetError::RequestError {
                status: 503,
                message: "injected upsert failure".to_string(),
            });
        }

        state
            .collections
            .entry(self.key.clone())
            .or_default()
            .insert(identity, record.clone());
        Ok(())
    }
}

/// The `id` field when present, otherwise the document's canonical JSON.
fn document_identity(record: &Record) -> Result<String> {
    match record.get("id") {
        Some(serde_json::Value::String(id)) => Ok(id.clone()),
        Some(other) => Ok(other.to_string()),
        None => {
            let sorted: BTreeMap<&String, &serde_json::Value> = record.data.iter().collect();
            Ok(serde_json::to_string(&sorted)?)
        }
    }
}
