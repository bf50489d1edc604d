//! Data store traits.
//!
//! Defines the interface to the external cache/sync store holding the
//! favourites collections.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::Result;

/// A record that can live in a store collection, keyed by its identifier.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// A named collection in the data store.
///
/// # Implementation Notes
///
/// Implementations decide how records are scoped (per user, per device) and
/// how the local cache is reconciled with the remote copy. Callers only rely
/// on the contract below.
#[async_trait]
pub trait Collection<T: Record>: Send + Sync {
    /// Collection name, e.g. `"pets"`.
    fn name(&self) -> &str;

    /// Queries the current record list.
    ///
    /// The stream may emit more than once (cached copy, then synced copy) and
    /// then completes. Dropping it abandons the query.
    fn find(&self) -> BoxStream<'static, Result<Vec<T>>>;

    /// Inserts the record or replaces the one with the same identifier.
    async fn save(&self, record: T) -> Result<T>;

    /// Deletes the record with the given identifier.
    ///
    /// # Returns
    ///
    /// - `Ok(n)`: Number of records removed (0 if none matched)
    /// - `Err(_)`: Error occurred during deletion
    async fn remove_by_id(&self, id: &str) -> Result<u64>;
}

/// Hands out collection handles by name.
pub trait DataStore: Send + Sync {
    fn collection<T: Record>(&self, name: &str) -> Arc<dyn Collection<T>>;
}
