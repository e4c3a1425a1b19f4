//! I/O counters kept by every channel.

use serde::Serialize;

/// Counts of the disk traffic a channel has generated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Window refills from disk, including write-path re-fetches.
    pub refills: u64,
    /// Flushes that wrote at least one byte.
    pub flushes: u64,
    /// Buffer reallocations.
    pub reallocations: u64,
    /// Seeks requested by the caller.
    pub seeks: u64,
    /// Bytes fetched from disk.
    pub bytes_fetched: u64,
    /// Bytes written to disk.
    pub bytes_flushed: u64,
}
