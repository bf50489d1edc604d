//! In-memory data store.
//!
//! Records are partitioned by owner, the user active on the session provider
//! at the time of each call, mirroring how the hosted store scopes a user's
//! data with access-control lists.

use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use pawlist_core::PawlistError;
use pawlist_core::error::Result;
use pawlist_core::favourite::{Collection, DataStore, Record};
use pawlist_core::user::SessionProvider;

/// Identifier of the user whose records a store call reads or writes.
pub(crate) fn active_owner(session: &dyn SessionProvider) -> Result<String> {
    session
        .active_user()
        .and_then(|record| record.id)
        .ok_or_else(|| PawlistError::Security("no active user".to_string()))
}

/// collection name -> owner id -> record id -> record
type Tables = HashMap<String, HashMap<String, BTreeMap<String, serde_json::Value>>>;

/// Data store holding every collection in memory.
///
/// Clones share the same data, so a test can keep one handle for inspection
/// while the service owns another.
#[derive(Clone)]
pub struct InMemoryDataStore {
    session: Arc<dyn SessionProvider>,
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDataStore {
    pub fn new(session: Arc<dyn SessionProvider>) -> Self {
        Self {
            session,
            tables: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of records `owner` has in `collection`.
    pub fn count(&self, collection: &str, owner: &str) -> usize {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(collection)
            .and_then(|owners| owners.get(owner))
            .map_or(0, BTreeMap::len)
    }
}

impl DataStore for InMemoryDataStore {
    fn collection<T: Record>(&self, name: &str) -> Arc<dyn Collection<T>> {
        Arc::new(InMemoryCollection::<T> {
            name: name.to_string(),
            session: self.session.clone(),
            tables: self.tables.clone(),
            _record: PhantomData,
        })
    }
}

/// Handle to one collection of an [`InMemoryDataStore`].
pub struct InMemoryCollection<T> {
    name: String,
    session: Arc<dyn SessionProvider>,
    tables: Arc<RwLock<Tables>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> InMemoryCollection<T> {
    fn snapshot(name: &str, session: &dyn SessionProvider, tables: &RwLock<Tables>) -> Result<Vec<T>> {
        let owner = active_owner(session)?;
        let tables = tables.read().unwrap_or_else(|e| e.into_inner());
        let Some(records) = tables.get(name).and_then(|owners| owners.get(&owner)) else {
            return Ok(Vec::new());
        };

        records
            .values()
            .map(|value| serde_json::from_value(value.clone()).map_err(PawlistError::from))
            .collect()
    }
}

#[async_trait]
impl<T: Record> Collection<T> for InMemoryCollection<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self) -> BoxStream<'static, Result<Vec<T>>> {
        let name = self.name.clone();
        let session = self.session.clone();
        let tables = self.tables.clone();

        // Evaluated when polled, not when the query is created.
        stream::once(async move { Self::snapshot(&name, session.as_ref(), &tables) }).boxed()
    }

    async fn save(&self, record: T) -> Result<T> {
        let owner = active_owner(self.session.as_ref())?;
        let value = serde_json::to_value(&record)?;

        self.tables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(self.name.clone())
            .or_default()
            .entry(owner)
            .or_default()
            .insert(record.id().to_string(), value);

        Ok(record)
    }

    async fn remove_by_id(&self, id: &str) -> Result<u64> {
        let owner = active_owner(self.session.as_ref())?;

        let removed = self
            .tables
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .get_mut(&self.name)
            .and_then(|owners| owners.get_mut(&owner))
            .and_then(|records| records.remove(id))
            .is_some();

        Ok(u64::from(removed))
    }
}
