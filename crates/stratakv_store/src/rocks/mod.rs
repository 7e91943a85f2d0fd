//! RocksDB-backed implementation of the key-value contract.
//!
//! The engine owns compaction, the on-disk format and the block cache;
//! this module owns the lifecycle around it: how stores are initialized,
//! opened and torn down, how collections map to column families, and how
//! engine outcomes surface through the adapter's error taxonomy.

mod batch;
mod db;
mod iterator;
mod reader;

pub use batch::RocksWriteBatch;
pub use db::RocksStore;
pub use iterator::RocksIter;
pub use reader::RocksReader;

use std::path::Path;

use rocksdb::{DBWithThreadMode, MultiThreaded, Options};
use tracing::info;

use crate::error::{StoreError, StoreResult};

/// The engine handle type. Multi-threaded column family mode allows
/// collection creation through a shared reference.
pub(crate) type Db = DBWithThreadMode<MultiThreaded>;

/// Destroys the store at `path`, removing all of its data.
///
/// Destruction is best-effort: the engine's own teardown runs first, then
/// any residual files are removed. The first error encountered is
/// reported, but filesystem cleanup is still attempted.
///
/// # Errors
///
/// Returns the engine's error if teardown fails, otherwise any error from
/// removing leftover files.
pub fn destroy(path: impl AsRef<Path>) -> StoreResult<()> {
    let path = path.as_ref();
    info!(path = %path.display(), "destroying store");

    let result = Db::destroy(&Options::default(), path).map_err(StoreError::from);

    match std::fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            if result.is_ok() {
                return Err(StoreError::Io {
                    message: e.to_string(),
                });
            }
        }
    }

    result
}
