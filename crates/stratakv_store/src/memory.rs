//! In-memory implementation of the key-value contract.
//!
//! Suitable for unit tests and ephemeral stores. Data lives in ordered
//! maps and is lost on drop; durability and compaction knobs do not
//! apply, so the store always behaves like a writable normal-mode store.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ops::Bound;

use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::kv::{
    CollectionHandle, KeyValueBatch, KeyValueIterator, KeyValueReader, KeyValueStore,
};

struct MemCollection {
    name: String,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

#[derive(Default)]
struct MemInner {
    collections: Vec<MemCollection>,
    index: HashMap<String, u32>,
}

/// An in-memory key-value store.
///
/// Thread-safe: readers and batch commits may run concurrently; a commit
/// applies all of its writes under one lock acquisition, so it is atomic
/// with respect to every reader.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<MemInner>,
}

impl InMemoryStore {
    /// Creates an empty store with no collections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn collection_name(&self, handle: CollectionHandle) -> StoreResult<String> {
        self.inner
            .read()
            .collections
            .get(handle.index() as usize)
            .map(|c| c.name.clone())
            .ok_or_else(|| StoreError::invalid(format!("unknown collection handle {handle}")))
    }
}

impl KeyValueStore for InMemoryStore {
    type Reader<'a> = MemReader<'a>;
    type Batch<'a> = MemWriteBatch<'a>;

    fn collection(&self, name: &str) -> StoreResult<CollectionHandle> {
        self.inner
            .read()
            .index
            .get(name)
            .map(|&i| CollectionHandle::new(i))
            .ok_or_else(|| StoreError::not_found(format!("collection {name}")))
    }

    fn create_collection(&self, name: &str) -> StoreResult<CollectionHandle> {
        let mut inner = self.inner.write();
        if inner.index.contains_key(name) {
            return Err(StoreError::exists(name));
        }
        let index = inner.collections.len() as u32;
        inner.collections.push(MemCollection {
            name: name.to_string(),
            entries: BTreeMap::new(),
        });
        inner.index.insert(name.to_string(), index);
        Ok(CollectionHandle::new(index))
    }

    fn collections(&self) -> Vec<String> {
        self.inner
            .read()
            .collections
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    fn reader(&self) -> MemReader<'_> {
        MemReader { store: self }
    }

    fn begin_writes(&self) -> StoreResult<MemWriteBatch<'_>> {
        Ok(MemWriteBatch {
            store: self,
            staged: Vec::new(),
        })
    }

    fn get(&self, collection: CollectionHandle, key: &[u8]) -> StoreResult<Vec<u8>> {
        let inner = self.inner.read();
        let coll = inner
            .collections
            .get(collection.index() as usize)
            .ok_or_else(|| StoreError::invalid(format!("unknown collection handle {collection}")))?;
        coll.entries
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(format!("key in collection {}", coll.name)))
    }

    fn put(&self, collection: CollectionHandle, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let coll = inner
            .collections
            .get_mut(collection.index() as usize)
            .ok_or_else(|| StoreError::invalid(format!("unknown collection handle {collection}")))?;
        coll.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }
}

/// Read view over an [`InMemoryStore`].
#[derive(Clone, Copy)]
pub struct MemReader<'s> {
    store: &'s InMemoryStore,
}

impl KeyValueReader for MemReader<'_> {
    type Iter<'a>
        = MemIter
    where
        Self: 'a;

    fn get(&self, collection: CollectionHandle, key: &[u8]) -> StoreResult<Vec<u8>> {
        self.store.get(collection, key)
    }

    fn iterator(&self, collection: CollectionHandle, from: &[u8]) -> StoreResult<MemIter> {
        let inner = self.store.inner.read();
        let coll = inner
            .collections
            .get(collection.index() as usize)
            .ok_or_else(|| StoreError::invalid(format!("unknown collection handle {collection}")))?;

        // The empty key is the smallest byte string, so a single inclusive
        // lower bound covers both the seek and scan-from-start cases. The
        // cursor walks a snapshot taken here.
        let pending: VecDeque<(Vec<u8>, Vec<u8>)> = coll
            .entries
            .range::<[u8], _>((Bound::Included(from), Bound::Unbounded))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(MemIter::new(pending))
    }
}

/// Forward cursor over a snapshot of one in-memory collection.
pub struct MemIter {
    pending: VecDeque<(Vec<u8>, Vec<u8>)>,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl MemIter {
    fn new(mut pending: VecDeque<(Vec<u8>, Vec<u8>)>) -> Self {
        let current = pending.pop_front();
        Self { pending, current }
    }
}

impl KeyValueIterator for MemIter {
    fn valid(&self) -> bool {
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map_or(&[], |(k, _)| k.as_slice())
    }

    fn value(&self) -> &[u8] {
        self.current.as_ref().map_or(&[], |(_, v)| v.as_slice())
    }

    fn next(&mut self) -> StoreResult<()> {
        self.current = self.pending.pop_front();
        Ok(())
    }
}

/// Staged writes against an [`InMemoryStore`].
pub struct MemWriteBatch<'s> {
    store: &'s InMemoryStore,
    staged: Vec<(CollectionHandle, Vec<u8>, Vec<u8>)>,
}

impl KeyValueBatch for MemWriteBatch<'_> {
    fn put(&mut self, collection: CollectionHandle, key: &[u8], value: &[u8]) -> StoreResult<()> {
        // Resolve now so a bogus handle surfaces at staging time, matching
        // the engine-backed batch.
        self.store.collection_name(collection)?;
        self.staged.push((collection, key.to_vec(), value.to_vec()));
        Ok(())
    }

    fn commit(self) -> StoreResult<()> {
        let mut inner = self.store.inner.write();
        for (handle, key, value) in self.staged {
            let coll = inner
                .collections
                .get_mut(handle.index() as usize)
                .ok_or_else(|| StoreError::invalid(format!("unknown collection handle {handle}")))?;
            coll.entries.insert(key, value);
        }
        Ok(())
    }
}
