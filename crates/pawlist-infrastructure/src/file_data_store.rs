//! File-backed data store.
//!
//! Each collection is one TOML file under the store root:
//!
//! ```text
//! {root}/
//! ├── pets.toml        # [<owner id>.<record id>] tables
//! └── shelters.toml
//! ```
//!
//! Records are scoped by owner like [`InMemoryDataStore`](crate::InMemoryDataStore).
//! File I/O runs on the blocking thread pool.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use pawlist_core::PawlistError;
use pawlist_core::error::Result;
use pawlist_core::favourite::{Collection, DataStore, Record};
use pawlist_core::user::SessionProvider;

use crate::memory_data_store::active_owner;
use crate::paths::PawlistPaths;
use crate::storage::AtomicTomlFile;

/// owner id -> record id -> record
type OwnerTables<T> = BTreeMap<String, BTreeMap<String, T>>;

/// Data store persisting each collection to a TOML file.
#[derive(Clone)]
pub struct FileDataStore {
    root: PathBuf,
    session: Arc<dyn SessionProvider>,
    /// Serialises read-modify-write cycles within this process.
    write_lock: Arc<Mutex<()>>,
}

impl FileDataStore {
    /// Creates a store rooted at the default data directory.
    pub fn new(session: Arc<dyn SessionProvider>) -> Result<Self> {
        let root = PawlistPaths::store_dir()?;
        Ok(Self::with_root(root, session))
    }

    /// Creates a store rooted at `root` (for testing or custom layouts).
    pub fn with_root(root: PathBuf, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            root,
            session,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.toml", name))
    }
}

impl DataStore for FileDataStore {
    fn collection<T: Record>(&self, name: &str) -> Arc<dyn Collection<T>> {
        Arc::new(FileCollection::<T> {
            name: name.to_string(),
            path: self.collection_path(name),
            session: self.session.clone(),
            write_lock: self.write_lock.clone(),
            _record: PhantomData,
        })
    }
}

/// Handle to one collection of a [`FileDataStore`].
pub struct FileCollection<T> {
    name: String,
    path: PathBuf,
    session: Arc<dyn SessionProvider>,
    write_lock: Arc<Mutex<()>>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> FileCollection<T> {
    /// Runs `f` against the collection file on the blocking pool.
    async fn with_file<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(AtomicTomlFile<OwnerTables<T>>) -> Result<R> + Send + 'static,
    {
        let path = self.path.clone();
        let write_lock = self.write_lock.clone();

        tokio::task::spawn_blocking(move || {
            let _guard = write_lock.lock().unwrap_or_else(|e| e.into_inner());
            f(AtomicTomlFile::new(path))
        })
        .await
        .map_err(|e| PawlistError::internal(format!("file store task failed: {}", e)))?
    }

    /// Records of the active user, read from `path`.
    async fn load_owned(path: PathBuf, session: Arc<dyn SessionProvider>) -> Result<Vec<T>> {
        let owner = active_owner(session.as_ref())?;

        tokio::task::spawn_blocking(move || -> Result<Vec<T>> {
            let tables: OwnerTables<T> = AtomicTomlFile::new(path).load()?.unwrap_or_default();
            Ok(tables
                .get(&owner)
                .map(|records| records.values().cloned().collect())
                .unwrap_or_default())
        })
        .await
        .map_err(|e| PawlistError::internal(format!("file store task failed: {}", e)))?
    }
}

#[async_trait]
impl<T: Record> Collection<T> for FileCollection<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn find(&self) -> BoxStream<'static, Result<Vec<T>>> {
        // Evaluated when polled, not when the query is created.
        stream::once(Self::load_owned(self.path.clone(), self.session.clone())).boxed()
    }

    async fn save(&self, record: T) -> Result<T> {
        let owner = active_owner(self.session.as_ref())?;
        let saved = record.clone();

        self.with_file(move |file| {
            file.update(OwnerTables::default(), |tables| {
                tables
                    .entry(owner)
                    .or_default()
                    .insert(record.id().to_string(), record);
                Ok(())
            })
        })
        .await?;

        tracing::debug!(collection = %self.name, id = %saved.id(), "record saved");
        Ok(saved)
    }

    async fn remove_by_id(&self, id: &str) -> Result<u64> {
        let owner = active_owner(self.session.as_ref())?;
        let id = id.to_string();

        self.with_file(move |file| {
            file.update(OwnerTables::default(), |tables| {
                let removed = tables
                    .get_mut(&owner)
                    .and_then(|records| records.remove(&id))
                    .is_some();
                Ok(u64::from(removed))
            })
        })
        .await
    }
}
