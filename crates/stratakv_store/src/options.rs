//! Engine tuning derived from the open mode and host resources.
//!
//! Tuning is computed as plain data first so the derivation stays a pure
//! function of `(mode, host memory, parallelism)`, then applied to
//! `rocksdb::Options` when a store or collection is opened.
//!
//! Reference: <https://github.com/facebook/rocksdb/wiki/RocksDB-Tuning-Guide>

use rocksdb::{BlockBasedOptions, Cache, DBCompressionType, MemtableFactory, Options};

use crate::config::StoreConfig;
use crate::mode::OpenMode;

/// Level-style compaction memtable budget, all modes.
const MEMTABLE_BUDGET: usize = 1 << 30;

/// Block size for the block-based table format.
const BLOCK_SIZE: usize = 64 * 1024;

/// Effectively-infinite threshold used to keep level-0 from ever
/// throttling bulk ingestion.
const NEVER_TRIGGER: i32 = 1 << 30;

/// Concrete engine tuning for one open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tuning {
    pub memtable_budget: usize,
    pub num_levels: i32,
    pub block_size: usize,
    pub block_cache_bytes: usize,
    pub max_open_files: i32,
    pub background_compactions: i32,
    pub background_flushes: i32,
    /// Insertion-optimized memtable representation (bulk load only).
    pub vector_memtable: bool,
    pub write_buffer_size: Option<usize>,
    pub max_write_buffer_number: Option<i32>,
    pub min_write_buffer_number_to_merge: Option<i32>,
    /// Raise all level-0 triggers so ingestion never stalls.
    pub relax_level0_triggers: bool,
    pub disable_auto_compactions: bool,
}

impl Tuning {
    /// Derives the tuning for a mode from the host environment.
    pub(crate) fn for_mode(mode: OpenMode, config: &StoreConfig) -> Self {
        let cores = config.parallelism.max(1);
        let mut tuning = Self {
            memtable_budget: MEMTABLE_BUDGET,
            num_levels: 5,
            block_size: BLOCK_SIZE,
            block_cache_bytes: (config.host_memory / 4) as usize,
            max_open_files: -1,
            background_compactions: cores.min(16) as i32,
            background_flushes: cores.min(4) as i32,
            vector_memtable: false,
            write_buffer_size: None,
            max_write_buffer_number: None,
            min_write_buffer_number_to_merge: None,
            relax_level0_triggers: false,
            disable_auto_compactions: false,
        };

        if mode == OpenMode::BulkLoad {
            tuning.vector_memtable = true;
            tuning.write_buffer_size = Some((config.host_memory / 8) as usize);
            tuning.max_write_buffer_number = Some(6);
            tuning.min_write_buffer_number_to_merge = Some(1);
            tuning.relax_level0_triggers = true;
            tuning.disable_auto_compactions = true;
        }

        tuning
    }

    /// Options for one collection (column family).
    pub(crate) fn column_family_options(&self) -> Options {
        let mut opts = Options::default();
        opts.optimize_level_style_compaction(self.memtable_budget);
        opts.set_num_levels(self.num_levels);

        // Compress all blocks with LZ4 rather than varying by level.
        opts.set_compression_per_level(&[]);
        opts.set_compression_type(DBCompressionType::Lz4);

        let mut table = BlockBasedOptions::default();
        table.set_format_version(2);
        table.set_block_size(self.block_size);
        table.set_block_cache(&Cache::new_lru_cache(self.block_cache_bytes));
        opts.set_block_based_table_factory(&table);

        if self.vector_memtable {
            // Faster insertion, much slower lookup than the default skiplist.
            opts.set_memtable_factory(MemtableFactory::Vector);
        }
        if let Some(size) = self.write_buffer_size {
            opts.set_write_buffer_size(size);
        }
        if let Some(n) = self.max_write_buffer_number {
            opts.set_max_write_buffer_number(n);
        }
        if let Some(n) = self.min_write_buffer_number_to_merge {
            opts.set_min_write_buffer_number_to_merge(n);
        }
        if self.relax_level0_triggers {
            opts.set_level_zero_file_num_compaction_trigger(NEVER_TRIGGER);
            opts.set_level_zero_slowdown_writes_trigger(NEVER_TRIGGER);
            opts.set_level_zero_stop_writes_trigger(NEVER_TRIGGER);
        }

        opts
    }

    /// Options for the database itself. Includes the collection baseline,
    /// which RocksDB applies to the default column family.
    pub(crate) fn db_options(&self) -> Options {
        let mut opts = self.column_family_options();
        opts.set_max_open_files(self.max_open_files);
        opts.set_max_background_jobs(self.background_compactions + self.background_flushes);
        if self.disable_auto_compactions {
            opts.set_disable_auto_compactions(true);
        }
        opts
    }
}
