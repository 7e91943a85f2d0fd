//! Store configuration.

/// Fallback when physical memory cannot be determined.
const DEFAULT_HOST_MEMORY: u64 = 4 << 30;

/// Environment inputs for deriving engine tuning.
///
/// The defaults probe the host; tests and embedders can pin both values
/// through the builder setters.
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    /// Physical memory of the host in bytes. Sizes the block cache and,
    /// under bulk load, the write buffers.
    pub host_memory: u64,

    /// Available hardware concurrency. Caps background compaction and
    /// flush thread counts.
    pub parallelism: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host_memory: detect_host_memory(),
            parallelism: num_cpus::get() as u32,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with detected defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the host memory budget in bytes.
    #[must_use]
    pub const fn host_memory(mut self, bytes: u64) -> Self {
        self.host_memory = bytes;
        self
    }

    /// Sets the assumed hardware concurrency.
    #[must_use]
    pub const fn parallelism(mut self, threads: u32) -> Self {
        self.parallelism = threads;
        self
    }
}

/// Total physical memory of the host, with a 4 GiB fallback.
fn detect_host_memory() -> u64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(meminfo) = std::fs::read_to_string("/proc/meminfo") {
            for line in meminfo.lines() {
                if let Some(rest) = line.strip_prefix("MemTotal:") {
                    let kib = rest
                        .trim()
                        .trim_end_matches("kB")
                        .trim()
                        .parse::<u64>()
                        .unwrap_or(0);
                    if kib > 0 {
                        return kib * 1024;
                    }
                }
            }
        }
    }
    DEFAULT_HOST_MEMORY
}
