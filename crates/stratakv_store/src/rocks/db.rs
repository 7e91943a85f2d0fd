//! Store facade: lifecycle, collection registry and mode policy.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor};
use tracing::{debug, info, warn};

use super::{Db, RocksReader, RocksWriteBatch};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::kv::{CollectionHandle, KeyValueStore};
use crate::mode::{ModePolicy, OpenMode};
use crate::options::Tuning;

/// Name-to-handle registry, an exact mirror of the engine's column
/// families as discovered at open plus any created since.
#[derive(Default)]
struct Registry {
    names: Vec<Arc<str>>,
    index: HashMap<Arc<str>, u32>,
}

impl Registry {
    fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        let mut registry = Self::default();
        for name in names {
            registry.insert(&name);
        }
        registry
    }

    fn handle(&self, name: &str) -> Option<CollectionHandle> {
        self.index.get(name).map(|&i| CollectionHandle::new(i))
    }

    fn name(&self, handle: CollectionHandle) -> Option<Arc<str>> {
        self.names.get(handle.index() as usize).cloned()
    }

    fn insert(&mut self, name: &str) -> CollectionHandle {
        let name: Arc<str> = Arc::from(name);
        let index = self.names.len() as u32;
        self.names.push(Arc::clone(&name));
        self.index.insert(name, index);
        CollectionHandle::new(index)
    }

    fn names(&self) -> Vec<String> {
        self.names.iter().map(|n| n.to_string()).collect()
    }

    fn len(&self) -> usize {
        self.names.len()
    }
}

/// A key-value store backed by an on-disk RocksDB database.
///
/// Exactly one live store may exist per path at a time; the engine
/// enforces this with a file lock, so a second open attempt fails.
///
/// The open mode is fixed for the lifetime of the instance and determines
/// durability, ingestion policy and what runs at close. Dropping the store
/// performs the same finalization as [`close`] but can only log errors;
/// prefer the explicit call when the outcome matters.
///
/// Collection creation and store teardown must not race with in-flight
/// operations on the same store. Point lookups, iteration and batch
/// commits may run concurrently from multiple threads.
///
/// [`close`]: RocksStore::close
pub struct RocksStore {
    db: Db,
    registry: RwLock<Registry>,
    policy: ModePolicy,
    tuning: Tuning,
    path: PathBuf,
    finalized: bool,
}

impl RocksStore {
    /// Creates a brand-new store at `path` in [`OpenMode::Normal`].
    ///
    /// # Errors
    ///
    /// Fails if a store is already present at `path`, or on any engine
    /// error while creating it.
    pub fn initialize(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::initialize_with_config(path, StoreConfig::default())
    }

    /// Creates a brand-new store with explicit environment inputs.
    ///
    /// # Errors
    ///
    /// Fails if a store is already present at `path`, or on any engine
    /// error while creating it.
    pub fn initialize_with_config(
        path: impl AsRef<Path>,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        let path = path.as_ref();
        let policy = ModePolicy::for_mode(OpenMode::Normal);
        let tuning = Tuning::for_mode(OpenMode::Normal, &config);

        let mut opts = tuning.db_options();
        opts.create_if_missing(true);
        opts.set_error_if_exists(true);

        let db = Db::open(&opts, path)?;
        info!(path = %path.display(), "initialized fresh store");

        Ok(Self {
            db,
            registry: RwLock::new(Registry::default()),
            policy,
            tuning,
            path: path.to_path_buf(),
            finalized: false,
        })
    }

    /// Opens an existing store at `path` in the given mode.
    ///
    /// Existing collections are discovered from the engine and registered;
    /// their handles are stable until the store is dropped.
    ///
    /// # Errors
    ///
    /// Fails if no store exists at `path`, if another instance holds the
    /// store open, or on any engine error while opening.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> StoreResult<Self> {
        Self::open_with_config(path, mode, StoreConfig::default())
    }

    /// Opens an existing store with explicit environment inputs.
    ///
    /// # Errors
    ///
    /// Fails if no store exists at `path`, if another instance holds the
    /// store open, or on any engine error while opening.
    pub fn open_with_config(
        path: impl AsRef<Path>,
        mode: OpenMode,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        let path = path.as_ref();
        let policy = ModePolicy::for_mode(mode);
        let tuning = Tuning::for_mode(mode, &config);
        let opts = tuning.db_options();

        // Discover the store's column families before opening; every one
        // of them must be opened with policy-derived options.
        let names = Db::list_cf(&opts, path)?;
        let descriptors: Vec<ColumnFamilyDescriptor> = names
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(name.as_str(), tuning.column_family_options()))
            .collect();

        let db = if mode == OpenMode::ReadOnly {
            Db::open_cf_descriptors_read_only(&opts, path, descriptors, false)?
        } else {
            Db::open_cf_descriptors(&opts, path, descriptors)?
        };
        info!(
            path = %path.display(),
            mode = ?mode,
            collections = names.len(),
            "opened existing store"
        );

        Ok(Self {
            db,
            registry: RwLock::new(Registry::from_names(names)),
            policy,
            tuning,
            path: path.to_path_buf(),
            finalized: false,
        })
    }

    /// The mode this store was opened in.
    #[must_use]
    pub fn mode(&self) -> OpenMode {
        self.policy.mode
    }

    /// The filesystem path of the store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the store, reporting any finalization error.
    ///
    /// Finalization order: a full-range compaction of every collection
    /// when the store was opened for bulk load, then a write-ahead-log
    /// sync and a flush of every collection unless the store is
    /// read-only. Collection handles and the engine handle are released
    /// when the instance drops. Bulk-load compaction can take substantial
    /// time; callers should expect this call to block.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; later steps still run.
    pub fn close(mut self) -> StoreResult<()> {
        let result = self.finalize();
        self.finalized = true;
        result
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub(crate) fn policy(&self) -> &ModePolicy {
        &self.policy
    }

    /// Resolves a handle to its collection name, rejecting handles this
    /// store never issued.
    pub(crate) fn resolve(&self, handle: CollectionHandle) -> StoreResult<Arc<str>> {
        self.registry
            .read()
            .name(handle)
            .ok_or_else(|| StoreError::invalid(format!("unknown collection handle {handle}")))
    }

    pub(crate) fn cf(&self, name: &str) -> StoreResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::invalid(format!("collection {name} has no engine handle")))
    }

    pub(crate) fn get_value(
        &self,
        collection: CollectionHandle,
        key: &[u8],
    ) -> StoreResult<Vec<u8>> {
        let name = self.resolve(collection)?;
        let cf = self.cf(&name)?;
        // Fresh default read options per call: each lookup observes the
        // latest committed state, with no pinned snapshot.
        match self.db.get_cf(&cf, key)? {
            Some(value) => Ok(value),
            None => Err(StoreError::not_found(format!("key in collection {name}"))),
        }
    }

    /// Runs mode-specific finalization, attempting every step and
    /// reporting the first error.
    fn finalize(&self) -> StoreResult<()> {
        let names = self.registry.read().names();
        let mut first_error: Option<StoreError> = None;
        let mut record = |e: StoreError| {
            warn!(error = %e, "error during store finalization");
            if first_error.is_none() {
                first_error = Some(e);
            }
        };

        if self.policy.compact_on_close {
            // Bulk-loaded data pays its deferred compaction cost here.
            info!(collections = names.len(), "compacting collections before close");
            for name in &names {
                match self.cf(name) {
                    Ok(cf) => self.db.compact_range_cf(&cf, None::<&[u8]>, None::<&[u8]>),
                    Err(e) => record(e),
                }
            }
        }

        if self.policy.writable {
            if let Err(e) = self.db.flush_wal(true) {
                record(e.into());
            }
            for name in &names {
                match self.cf(name) {
                    Ok(cf) => {
                        if let Err(e) = self.db.flush_cf(&cf) {
                            record(e.into());
                        }
                    }
                    Err(e) => record(e),
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl KeyValueStore for RocksStore {
    type Reader<'a> = RocksReader<'a>;
    type Batch<'a> = RocksWriteBatch<'a>;

    fn collection(&self, name: &str) -> StoreResult<CollectionHandle> {
        self.registry
            .read()
            .handle(name)
            .ok_or_else(|| StoreError::not_found(format!("collection {name}")))
    }

    fn create_collection(&self, name: &str) -> StoreResult<CollectionHandle> {
        if !self.policy.writable {
            return Err(StoreError::not_implemented(
                "cannot create collections in read-only mode",
            ));
        }

        // Duplicate names are rejected here, before touching the engine,
        // so the caller gets a precise adapter-level error.
        let mut registry = self.registry.write();
        if registry.handle(name).is_some() {
            return Err(StoreError::exists(name));
        }

        let opts = self.tuning.column_family_options();
        self.db.create_cf(name, &opts)?;
        debug!(collection = name, "created collection");
        Ok(registry.insert(name))
    }

    fn collections(&self) -> Vec<String> {
        self.registry.read().names()
    }

    fn reader(&self) -> RocksReader<'_> {
        RocksReader::new(self)
    }

    fn begin_writes(&self) -> StoreResult<RocksWriteBatch<'_>> {
        if !self.policy.writable {
            return Err(StoreError::not_implemented(
                "cannot write in read-only mode",
            ));
        }
        Ok(RocksWriteBatch::new(self))
    }

    fn get(&self, collection: CollectionHandle, key: &[u8]) -> StoreResult<Vec<u8>> {
        self.get_value(collection, key)
    }

    fn put(&self, collection: CollectionHandle, key: &[u8], value: &[u8]) -> StoreResult<()> {
        if !self.policy.writable {
            return Err(StoreError::not_implemented(
                "cannot write in read-only mode",
            ));
        }
        let name = self.resolve(collection)?;
        let cf = self.cf(&name)?;
        self.db
            .put_cf_opt(&cf, key, value, &self.policy.put_options())?;
        Ok(())
    }
}

impl fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RocksStore")
            .field("path", &self.path)
            .field("mode", &self.policy.mode)
            .field("collections", &self.registry.read().len())
            .finish_non_exhaustive()
    }
}

impl Drop for RocksStore {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        if let Err(e) = self.finalize() {
            warn!(error = %e, "store finalization failed during drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{KeyValueBatch, KeyValueIterator, KeyValueReader};
    use tempfile::{tempdir, TempDir};

    /// Small budgets so tests do not reserve gigabytes of cache.
    fn test_config() -> StoreConfig {
        StoreConfig::new().host_memory(256 << 20).parallelism(2)
    }

    fn fresh_store(name: &str) -> (TempDir, PathBuf, RocksStore) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(name);
        let store = RocksStore::initialize_with_config(&path, test_config()).unwrap();
        (dir, path, store)
    }

    #[test]
    fn initialize_starts_with_empty_registry() {
        let (_dir, _path, store) = fresh_store("fresh");
        assert_eq!(store.mode(), OpenMode::Normal);
        assert!(store.collections().is_empty());
    }

    #[test]
    fn initialize_refuses_existing_store() {
        let (_dir, path, store) = fresh_store("taken");
        store.close().unwrap();

        let result = RocksStore::initialize_with_config(&path, test_config());
        assert!(result.is_err());
    }

    #[test]
    fn open_requires_existing_store() {
        let dir = tempdir().unwrap();
        let result = RocksStore::open_with_config(
            dir.path().join("missing"),
            OpenMode::Normal,
            test_config(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn second_open_fails_while_locked() {
        let (_dir, path, store) = fresh_store("locked");

        let second = RocksStore::open_with_config(&path, OpenMode::Normal, test_config());
        assert!(second.is_err());
        drop(store);
    }

    #[test]
    fn put_get_roundtrip() {
        let (_dir, _path, store) = fresh_store("roundtrip");
        let coll = store.create_collection("records").unwrap();

        store.put(coll, b"key", b"value").unwrap();
        assert_eq!(store.get(coll, b"key").unwrap(), b"value");
        assert_eq!(store.reader().get(coll, b"key").unwrap(), b"value");
    }

    #[test]
    fn get_missing_key_is_not_found() {
        let (_dir, _path, store) = fresh_store("misses");
        let coll = store.create_collection("records").unwrap();

        let result = store.get(coll, b"absent");
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn collection_lookup_not_found() {
        let (_dir, _path, store) = fresh_store("lookup");
        let result = store.collection("nothing");
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn duplicate_create_is_exists_and_preserves_contents() {
        let (_dir, _path, store) = fresh_store("dups");
        let coll = store.create_collection("records").unwrap();
        store.put(coll, b"key", b"value").unwrap();

        let result = store.create_collection("records");
        assert!(matches!(result, Err(StoreError::Exists { .. })));
        assert_eq!(store.get(coll, b"key").unwrap(), b"value");
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let (_dir, _path, store) = fresh_store("strict");
        let other_dir = tempdir().unwrap();
        let other =
            RocksStore::initialize_with_config(other_dir.path().join("other"), test_config())
                .unwrap();
        let foreign = other.create_collection("records").unwrap();

        // `store` has an empty registry, so the foreign index is out of
        // range and must be rejected rather than reinterpreted.
        let result = store.get(foreign, b"key");
        assert!(matches!(result, Err(StoreError::Invalid { .. })));
    }

    #[test]
    fn batch_commit_is_atomic_across_collections() {
        let (_dir, _path, store) = fresh_store("atomic");
        let calls = store.create_collection("calls").unwrap();
        let sites = store.create_collection("sites").unwrap();

        let mut batch = store.begin_writes().unwrap();
        batch.put(calls, b"c1", b"call-one").unwrap();
        batch.put(sites, b"s1", b"site-one").unwrap();

        // Staged writes are invisible until commit.
        assert!(matches!(
            store.get(calls, b"c1"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.get(sites, b"s1"),
            Err(StoreError::NotFound { .. })
        ));

        batch.commit().unwrap();

        assert_eq!(store.get(calls, b"c1").unwrap(), b"call-one");
        assert_eq!(store.get(sites, b"s1").unwrap(), b"site-one");
    }

    #[test]
    fn iteration_is_ordered_and_seek_is_inclusive() {
        let (_dir, _path, store) = fresh_store("iter");
        let coll = store.create_collection("fruit").unwrap();
        for (k, v) in [("banana", "1"), ("apple", "2"), ("cherry", "3")] {
            store.put(coll, k.as_bytes(), v.as_bytes()).unwrap();
        }
        let reader = store.reader();

        // Empty seek key positions at the first entry.
        let mut it = reader.iterator(coll, b"").unwrap();
        let mut visited = Vec::new();
        while it.valid() {
            visited.push(String::from_utf8(it.key().to_vec()).unwrap());
            it.next().unwrap();
        }
        assert_eq!(visited, ["apple", "banana", "cherry"]);

        // Advancing past the end stays invalid and is not an error.
        it.next().unwrap();
        assert!(!it.valid());

        // Seeking to an existing key includes it.
        let it = reader.iterator(coll, b"banana").unwrap();
        assert!(it.valid());
        assert_eq!(it.key(), b"banana");

        // Seeking between keys lands on the next one.
        let it = reader.iterator(coll, b"blueberry").unwrap();
        assert!(it.valid());
        assert_eq!(it.key(), b"cherry");

        // Seeking past every key yields an immediately invalid cursor.
        let it = reader.iterator(coll, b"zucchini").unwrap();
        assert!(!it.valid());
    }
}

/// Scenarios that exercise reopen and mode behavior across store
/// lifetimes.
#[cfg(test)]
mod persistence_tests {
    use super::*;
    use crate::kv::{KeyValueBatch, KeyValueIterator, KeyValueReader};
    use tempfile::tempdir;

    fn test_config() -> StoreConfig {
        StoreConfig::new().host_memory(256 << 20).parallelism(2)
    }

    #[test]
    fn collections_and_data_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persist");

        {
            let store = RocksStore::initialize_with_config(&path, test_config()).unwrap();
            let coll = store.create_collection("records").unwrap();
            store.put(coll, b"key", b"value").unwrap();
            store.close().unwrap();
        }

        {
            let store =
                RocksStore::open_with_config(&path, OpenMode::Normal, test_config()).unwrap();
            // Discovery registers the engine's default keyspace too.
            let names = store.collections();
            assert!(names.contains(&"default".to_string()));
            assert!(names.contains(&"records".to_string()));

            let coll = store.collection("records").unwrap();
            assert_eq!(store.get(coll, b"key").unwrap(), b"value");
            store.close().unwrap();
        }
    }

    #[test]
    fn read_only_mode_permits_reads_and_refuses_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frozen");

        {
            let store = RocksStore::initialize_with_config(&path, test_config()).unwrap();
            let coll = store.create_collection("records").unwrap();
            store.put(coll, b"key", b"value").unwrap();
            store.close().unwrap();
        }

        let store = RocksStore::open_with_config(&path, OpenMode::ReadOnly, test_config()).unwrap();
        let coll = store.collection("records").unwrap();

        assert_eq!(store.get(coll, b"key").unwrap(), b"value");
        let reader = store.reader();
        let it = reader.iterator(coll, b"").unwrap();
        assert!(it.valid());

        assert!(matches!(
            store.begin_writes(),
            Err(StoreError::NotImplemented { .. })
        ));
        assert!(matches!(
            store.put(coll, b"key", b"other"),
            Err(StoreError::NotImplemented { .. })
        ));
        assert!(matches!(
            store.create_collection("more"),
            Err(StoreError::NotImplemented { .. })
        ));

        drop(it);
        drop(reader);
        store.close().unwrap();
    }

    #[test]
    fn bulk_load_survives_reopen_in_normal_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bulk");

        {
            let store = RocksStore::initialize_with_config(&path, test_config()).unwrap();
            store.close().unwrap();
        }

        {
            let store =
                RocksStore::open_with_config(&path, OpenMode::BulkLoad, test_config()).unwrap();
            assert_eq!(store.mode(), OpenMode::BulkLoad);
            let coll = store.create_collection("A").unwrap();

            for chunk in 0..10u32 {
                let mut batch = store.begin_writes().unwrap();
                for i in 0..1000u32 {
                    let n = chunk * 1000 + i;
                    let key = format!("{n:08}");
                    let value = format!("value-{n}");
                    batch.put(coll, key.as_bytes(), value.as_bytes()).unwrap();
                }
                batch.commit().unwrap();
            }

            // Close runs the deferred full compaction and flush.
            store.close().unwrap();
        }

        {
            let store =
                RocksStore::open_with_config(&path, OpenMode::Normal, test_config()).unwrap();
            let coll = store.collection("A").unwrap();

            for n in 0..10_000u32 {
                let key = format!("{n:08}");
                let expected = format!("value-{n}");
                assert_eq!(store.get(coll, key.as_bytes()).unwrap(), expected.as_bytes());
            }

            let reader = store.reader();
            let mut it = reader.iterator(coll, b"").unwrap();
            let mut count = 0u32;
            let mut prev: Option<Vec<u8>> = None;
            while it.valid() {
                let key = it.key().to_vec();
                if let Some(p) = &prev {
                    assert!(*p < key, "iteration out of order");
                }
                prev = Some(key);
                count += 1;
                it.next().unwrap();
            }
            assert_eq!(count, 10_000);

            drop(it);
            drop(reader);
            store.close().unwrap();
        }
    }

    #[test]
    fn drop_without_close_still_persists_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dropped");

        {
            let store = RocksStore::initialize_with_config(&path, test_config()).unwrap();
            let coll = store.create_collection("records").unwrap();
            store.put(coll, b"key", b"value").unwrap();
            // Implicit drop: finalization runs best-effort.
        }

        let store = RocksStore::open_with_config(&path, OpenMode::Normal, test_config()).unwrap();
        let coll = store.collection("records").unwrap();
        assert_eq!(store.get(coll, b"key").unwrap(), b"value");
        store.close().unwrap();
    }
}
