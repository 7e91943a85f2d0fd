//! Forward cursor over one collection.

use rocksdb::DBRawIteratorWithThreadMode;

use super::Db;
use crate::error::StoreResult;
use crate::kv::KeyValueIterator;

/// A forward cursor over one collection of a [`RocksStore`].
///
/// The current entry is buffered on construction and after every
/// successful advance, so `key`/`value` stay accessible without touching
/// the engine again. Only forward traversal is supported.
///
/// [`RocksStore`]: super::RocksStore
pub struct RocksIter<'db> {
    raw: DBRawIteratorWithThreadMode<'db, Db>,
    key: Vec<u8>,
    value: Vec<u8>,
}

impl<'db> RocksIter<'db> {
    pub(crate) fn new(raw: DBRawIteratorWithThreadMode<'db, Db>) -> Self {
        let mut it = Self {
            raw,
            key: Vec::new(),
            value: Vec::new(),
        };
        it.capture();
        it
    }

    /// Buffers the entry under the cursor, if any.
    fn capture(&mut self) {
        if !self.raw.valid() {
            return;
        }
        if let Some(k) = self.raw.key() {
            self.key.clear();
            self.key.extend_from_slice(k);
        }
        if let Some(v) = self.raw.value() {
            self.value.clear();
            self.value.extend_from_slice(v);
        }
    }
}

impl KeyValueIterator for RocksIter<'_> {
    fn valid(&self) -> bool {
        self.raw.valid()
    }

    fn key(&self) -> &[u8] {
        &self.key
    }

    fn value(&self) -> &[u8] {
        &self.value
    }

    fn next(&mut self) -> StoreResult<()> {
        // An engine error can surface either before or after advancing;
        // check both sides so no error is silently swallowed.
        self.raw.status()?;
        self.raw.next();
        self.raw.status()?;
        self.capture();
        Ok(())
    }
}
