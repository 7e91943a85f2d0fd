//! # StrataKV Store
//!
//! A uniform, engine-agnostic key-value storage contract over an embedded
//! ordered-key-value engine.
//!
//! The contract is small: named **collections** (independent ordered
//! keyspaces), point lookups, forward iteration in byte-lexicographic
//! order, and atomic batched writes. Keys and values are opaque byte
//! strings. The engine's internals (compaction, file format, caching)
//! stay behind the [`RocksStore`] adapter; what this crate owns is the
//! resource and lifecycle model around them.
//!
//! ## Open modes
//!
//! A store is opened in one of three modes, fixed for the instance's
//! lifetime:
//!
//! - [`OpenMode::Normal`] balances durability and read latency; batch
//!   commits sync to disk.
//! - [`OpenMode::BulkLoad`] trades durability and read latency for write
//!   throughput: the write-ahead log is off and compaction is deferred to
//!   an explicit full pass when the store closes.
//! - [`OpenMode::ReadOnly`] opens without write capability; every
//!   mutation path fails with `NotImplemented`.
//!
//! ## Example
//!
//! ```no_run
//! use stratakv_store::{KeyValueBatch, KeyValueStore, RocksStore};
//!
//! # fn main() -> Result<(), stratakv_store::StoreError> {
//! let store = RocksStore::initialize("/data/records")?;
//! let coll = store.create_collection("records")?;
//!
//! let mut writes = store.begin_writes()?;
//! writes.put(coll, b"key", b"value")?;
//! writes.commit()?;
//!
//! assert_eq!(store.get(coll, b"key")?, b"value");
//! store.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! For tests and ephemeral data, [`InMemoryStore`] implements the same
//! contract without touching disk.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod kv;
mod memory;
mod mode;
mod options;
mod rocks;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use kv::{
    CollectionHandle, KeyValueBatch, KeyValueIterator, KeyValueReader, KeyValueStore,
};
pub use memory::{InMemoryStore, MemIter, MemReader, MemWriteBatch};
pub use mode::{ModePolicy, OpenMode};
pub use rocks::{destroy, RocksIter, RocksReader, RocksStore, RocksWriteBatch};
