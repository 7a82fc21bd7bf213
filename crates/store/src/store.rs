//! Object store port.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::query::Query;
use crate::record::Record;

/// Persistence interface for console records.
///
/// The store is a black box: pages only build [`Query`] values and move
/// [`Record`]s in and out. All methods are object-safe so the store can be
/// shared as `Arc<dyn ObjectStore>`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Records matching `query`.
    async fn find(&self, query: &Query) -> Result<Vec<Record>, StoreError>;

    /// First record matching `query`.
    async fn first(&self, query: &Query) -> Result<Option<Record>, StoreError> {
        let query = query.clone().limit(1);
        Ok(self.find(&query).await?.into_iter().next())
    }

    /// Number of records matching `query`, ignoring paging.
    async fn count(&self, query: &Query) -> Result<usize, StoreError>;

    /// One record by id.
    async fn get(&self, class_name: &str, object_id: &str) -> Result<Record, StoreError>;

    /// Create or update a record and return the stored version.
    ///
    /// Records without an id are created. Records with an id are merged into
    /// the stored version; an unknown id is [`StoreError::NotFound`].
    async fn save(&self, record: Record) -> Result<Record, StoreError>;

    /// Atomically add `amount` to a numeric field and return the stored
    /// version. A missing field counts as zero; a non-numeric one is
    /// [`StoreError::Invalid`].
    async fn increment(
        &self,
        class_name: &str,
        object_id: &str,
        field: &str,
        amount: i64,
    ) -> Result<Record, StoreError>;

    /// Delete a record. Returns `true` if it existed.
    async fn destroy(&self, class_name: &str, object_id: &str) -> Result<bool, StoreError>;
}
