//! Point-lookup and iterator-construction view over a store.

use super::{RocksIter, RocksStore};
use crate::error::StoreResult;
use crate::kv::{CollectionHandle, KeyValueReader};

/// A lightweight read view bound to a [`RocksStore`].
///
/// Readers are cheap to construct and do not block writes or other
/// readers. No snapshot is pinned: each call observes the latest
/// committed state at call time.
#[derive(Clone, Copy)]
pub struct RocksReader<'db> {
    store: &'db RocksStore,
}

impl<'db> RocksReader<'db> {
    pub(crate) fn new(store: &'db RocksStore) -> Self {
        Self { store }
    }
}

impl KeyValueReader for RocksReader<'_> {
    type Iter<'a>
        = RocksIter<'a>
    where
        Self: 'a;

    fn get(&self, collection: CollectionHandle, key: &[u8]) -> StoreResult<Vec<u8>> {
        self.store.get_value(collection, key)
    }

    fn iterator(&self, collection: CollectionHandle, from: &[u8]) -> StoreResult<RocksIter<'_>> {
        let name = self.store.resolve(collection)?;
        let cf = self.store.cf(&name)?;

        let mut raw = self.store.db().raw_iterator_cf(&cf);
        if from.is_empty() {
            raw.seek_to_first();
        } else {
            raw.seek(from);
        }
        raw.status()?;

        Ok(RocksIter::new(raw))
    }
}
