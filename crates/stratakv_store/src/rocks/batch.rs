//! Staged writes committed atomically as one unit.

use rocksdb::WriteBatch;

use super::RocksStore;
use crate::error::StoreResult;
use crate::kv::{CollectionHandle, KeyValueBatch};

/// An accumulator of pending writes against a [`RocksStore`].
///
/// Staged writes are invisible to all readers until [`commit`] succeeds,
/// at which point they become visible together, across collections. The
/// commit durability comes from the store's open mode: synchronous flush
/// in normal mode, write-ahead-log bypass under bulk load.
///
/// [`commit`]: KeyValueBatch::commit
pub struct RocksWriteBatch<'db> {
    store: &'db RocksStore,
    inner: WriteBatch,
}

impl<'db> RocksWriteBatch<'db> {
    pub(crate) fn new(store: &'db RocksStore) -> Self {
        Self {
            store,
            inner: WriteBatch::default(),
        }
    }

    /// Number of staged writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True when nothing has been staged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl KeyValueBatch for RocksWriteBatch<'_> {
    fn put(&mut self, collection: CollectionHandle, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let name = self.store.resolve(collection)?;
        let cf = self.store.cf(&name)?;
        self.inner.put_cf(&cf, key, value);
        Ok(())
    }

    fn commit(self) -> StoreResult<()> {
        self.store
            .db()
            .write_opt(self.inner, &self.store.policy().batch_options())?;
        Ok(())
    }
}
