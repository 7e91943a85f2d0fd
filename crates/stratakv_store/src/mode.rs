//! Open modes and the write policy derived from them.

use rocksdb::WriteOptions;

/// Durability and throughput policy selected when a store is opened.
///
/// The mode is fixed for the lifetime of the store instance. It determines
/// whether the write-ahead log is used, how batch commits are synced, and
/// what finalization runs when the store is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Balanced durability and read latency. Batch commits sync to disk.
    Normal,
    /// Ingestion-optimized: WAL disabled, compaction deferred to close.
    ///
    /// Closing a bulk-load store runs a full compaction of every collection
    /// and may block for a long time.
    BulkLoad,
    /// No write capability; mutation operations fail with `NotImplemented`.
    ReadOnly,
}

/// Mode-derived behavior, decided once at open time.
///
/// Call sites consult these flags instead of re-matching on [`OpenMode`].
#[derive(Debug, Clone, Copy)]
pub struct ModePolicy {
    /// The mode this policy was derived from.
    pub mode: OpenMode,
    /// Whether mutation operations are permitted at all.
    pub writable: bool,
    /// Whether writes bypass the write-ahead log.
    pub disable_wal: bool,
    /// Whether batch commits request a synchronous flush to disk.
    pub sync_batches: bool,
    /// Whether closing the store runs a full-range compaction first.
    pub compact_on_close: bool,
}

impl ModePolicy {
    /// Derives the policy for a mode.
    #[must_use]
    pub const fn for_mode(mode: OpenMode) -> Self {
        match mode {
            OpenMode::Normal => Self {
                mode,
                writable: true,
                disable_wal: false,
                sync_batches: true,
                compact_on_close: false,
            },
            OpenMode::BulkLoad => Self {
                mode,
                writable: true,
                disable_wal: true,
                sync_batches: false,
                compact_on_close: true,
            },
            OpenMode::ReadOnly => Self {
                mode,
                writable: false,
                disable_wal: false,
                sync_batches: false,
                compact_on_close: false,
            },
        }
    }

    /// Write options for direct single-key puts.
    #[must_use]
    pub(crate) fn put_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.disable_wal(self.disable_wal);
        opts
    }

    /// Write options for committing a staged batch.
    #[must_use]
    pub(crate) fn batch_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.disable_wal(self.disable_wal);
        opts.set_sync(self.sync_batches);
        opts
    }
}
