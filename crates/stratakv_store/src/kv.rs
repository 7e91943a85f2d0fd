//! The engine-agnostic key-value contract.
//!
//! A store is a set of named collections (independent ordered keyspaces)
//! addressed by opaque handles. Keys and values are opaque byte strings;
//! ordering is byte-lexicographic. Readers, iterators and write batches
//! borrow the store that produced them, so they cannot outlive it.

use std::fmt;

use crate::error::StoreResult;

/// Opaque handle addressing one collection within its owning store.
///
/// A handle is an index into the owning store's registry and is valid only
/// for the store instance that produced it. Handles from another instance
/// are rejected with an invalid-argument error rather than reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionHandle(u32);

impl CollectionHandle {
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    pub(crate) const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "coll:{}", self.0)
    }
}

/// A store of named, independently ordered keyspaces.
pub trait KeyValueStore: Send + Sync {
    /// The point-lookup and iteration view for this store.
    type Reader<'a>: KeyValueReader
    where
        Self: 'a;

    /// The staged-write accumulator for this store.
    type Batch<'a>: KeyValueBatch
    where
        Self: 'a;

    /// Resolves a collection name to its handle.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no collection with this name exists.
    fn collection(&self, name: &str) -> StoreResult<CollectionHandle>;

    /// Creates a new collection and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns `Exists` if the name is already registered, and
    /// `NotImplemented` when the store is read-only.
    fn create_collection(&self, name: &str) -> StoreResult<CollectionHandle>;

    /// Names of all registered collections.
    fn collections(&self) -> Vec<String>;

    /// Returns a reader bound to the store's current state.
    fn reader(&self) -> Self::Reader<'_>;

    /// Begins a batch of writes to be committed atomically.
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` when the store is read-only.
    fn begin_writes(&self) -> StoreResult<Self::Batch<'_>>;

    /// Point lookup observing the latest committed state at call time.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key is absent.
    fn get(&self, collection: CollectionHandle, key: &[u8]) -> StoreResult<Vec<u8>>;

    /// Writes a single key outside of any batch.
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` when the store is read-only.
    fn put(&self, collection: CollectionHandle, key: &[u8], value: &[u8]) -> StoreResult<()>;
}

/// A point-lookup and iterator-construction view over a store.
///
/// Readers are cheap to construct and do not block writes or other
/// readers. Each call observes the latest committed state; no snapshot is
/// pinned at reader creation.
pub trait KeyValueReader {
    /// The cursor type produced by [`iterator`](Self::iterator).
    type Iter<'a>: KeyValueIterator
    where
        Self: 'a;

    /// Point lookup.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the key is absent.
    fn get(&self, collection: CollectionHandle, key: &[u8]) -> StoreResult<Vec<u8>>;

    /// Returns a forward cursor positioned at the first entry with key
    /// greater than or equal to `from`, or at the first entry of the
    /// collection when `from` is empty. The cursor is immediately invalid
    /// if no such entry exists.
    fn iterator(&self, collection: CollectionHandle, from: &[u8]) -> StoreResult<Self::Iter<'_>>;
}

/// A forward cursor over one collection.
///
/// Exactly one traversal direction is supported; there is no rewind and no
/// reverse. Cursors are not copyable, since copying would duplicate
/// engine-level cursor state ambiguously.
pub trait KeyValueIterator {
    /// True while the cursor is positioned on a real entry.
    fn valid(&self) -> bool;

    /// The key of the current entry. Meaningful only while [`valid`] is
    /// true.
    ///
    /// [`valid`]: Self::valid
    fn key(&self) -> &[u8];

    /// The value of the current entry. Meaningful only while [`valid`] is
    /// true.
    ///
    /// [`valid`]: Self::valid
    fn value(&self) -> &[u8];

    /// Advances one position forward.
    ///
    /// # Errors
    ///
    /// Propagates any engine error observed before or after advancing; the
    /// cursor is no longer reliably positioned afterwards.
    fn next(&mut self) -> StoreResult<()>;
}

/// An accumulator of pending writes committed atomically as one unit.
///
/// Staged writes are invisible to every reader until [`commit`] succeeds,
/// at which point they become visible together. A batch is single-use:
/// committing consumes it.
///
/// [`commit`]: Self::commit
pub trait KeyValueBatch {
    /// Stages a write. Failures surface at commit, not here.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` only if the handle cannot be resolved.
    fn put(&mut self, collection: CollectionHandle, key: &[u8], value: &[u8]) -> StoreResult<()>;

    /// Atomically applies all staged writes, across collections, with the
    /// store's mode-derived durability.
    ///
    /// # Errors
    ///
    /// Propagates the engine's commit outcome; on error nothing is visible.
    fn commit(self) -> StoreResult<()>;
}
