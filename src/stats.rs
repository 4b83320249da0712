//! Raw block-device I/O counters and snapshots.
//!
//! Models the cumulative counters the kernel block layer exposes per device
//! in `/sys/block/<dev>/stat`. Field semantics follow the kernel
//! documentation:
//! <https://www.kernel.org/doc/Documentation/block/stat.rst>

use serde::{Deserialize, Serialize};

/// Block-layer addressing unit. Sector counts are in this unit regardless of
/// the device's physical sector size.
pub const SECTOR_SIZE: u64 = 512;

/// Cumulative I/O counters for one device at one instant.
///
/// Every field except `io_in_flight` is cumulative since device attach and
/// never resets during the device's lifetime. Discard counters are reported
/// by kernels >= 4.18 and flush counters by kernels >= 5.5; on older kernels
/// they stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoCounters {
    /// Read requests completed.
    pub reads_completed: u64,
    /// Read requests merged into an adjacent request before completion.
    pub reads_merged: u64,
    /// Sectors read.
    pub sectors_read: u64,
    /// Cumulative time spent reading (ms).
    pub time_reading_ms: u64,
    /// Write requests completed.
    pub writes_completed: u64,
    /// Write requests merged into an adjacent request before completion.
    pub writes_merged: u64,
    /// Sectors written.
    pub sectors_written: u64,
    /// Cumulative time spent writing (ms).
    pub time_writing_ms: u64,
    /// Discard requests completed.
    pub discards_completed: u64,
    /// Sectors discarded.
    pub sectors_discarded: u64,
    /// Cumulative time spent discarding (ms).
    pub time_discarding_ms: u64,
    /// Flush requests completed.
    pub flushes_completed: u64,
    /// Cumulative time spent flushing (ms).
    pub time_flushing_ms: u64,
    /// Requests outstanding at sample time. Instantaneous, not cumulative.
    pub io_in_flight: u64,
    /// Wall-clock time with at least one request outstanding (ms).
    pub time_io_ms: u64,
    /// Time-weighted queue length (ms); basis for average queue depth.
    pub weighted_time_io_ms: u64,
}

impl IoCounters {
    /// Total bytes read.
    pub fn bytes_read(&self) -> u64 {
        self.sectors_read * SECTOR_SIZE
    }

    /// Total bytes written.
    pub fn bytes_written(&self) -> u64 {
        self.sectors_written * SECTOR_SIZE
    }

    /// Total bytes discarded.
    pub fn bytes_discarded(&self) -> u64 {
        self.sectors_discarded * SECTOR_SIZE
    }

    /// Completed operations across all request classes.
    pub fn total_ops(&self) -> u64 {
        self.reads_completed + self.writes_completed + self.discards_completed
            + self.flushes_completed
    }
}

/// One observation of a device: its counters paired with a monotonic
/// timestamp. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoSnapshot {
    /// Device name (e.g. "sda", "nvme0n1").
    pub device: String,
    /// Counters at the time of the observation.
    pub counters: IoCounters,
    /// Monotonic clock reading in nanoseconds.
    pub timestamp_ns: u64,
}

impl IoSnapshot {
    /// Create a snapshot from already-collected values.
    pub fn new(device: impl Into<String>, counters: IoCounters, timestamp_ns: u64) -> Self {
        Self {
            device: device.into(),
            counters,
            timestamp_ns,
        }
    }

    /// True when a delta between `self` (earlier) and `after` is meaningful:
    /// same device, strictly advancing timestamp.
    pub fn comparable_with(&self, after: &IoSnapshot) -> bool {
        self.device == after.device && after.timestamp_ns > self.timestamp_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_calculation() {
        let counters = IoCounters {
            sectors_read: 2048,    // 2048 * 512 = 1 MB
            sectors_written: 4096, // 4096 * 512 = 2 MB
            sectors_discarded: 8,
            ..Default::default()
        };

        assert_eq!(counters.bytes_read(), 1_048_576);
        assert_eq!(counters.bytes_written(), 2_097_152);
        assert_eq!(counters.bytes_discarded(), 4096);
    }

    #[test]
    fn test_total_ops() {
        let counters = IoCounters {
            reads_completed: 100,
            writes_completed: 50,
            discards_completed: 10,
            flushes_completed: 5,
            ..Default::default()
        };

        assert_eq!(counters.total_ops(), 165);
    }

    #[test]
    fn test_comparable_requires_same_device_and_advancing_clock() {
        let a = IoSnapshot::new("sda", IoCounters::default(), 100);
        let b = IoSnapshot::new("sda", IoCounters::default(), 200);
        let c = IoSnapshot::new("sdb", IoCounters::default(), 300);

        assert!(a.comparable_with(&b));
        assert!(!b.comparable_with(&a)); // clock must advance
        assert!(!a.comparable_with(&c)); // device must match
        assert!(!a.comparable_with(&a)); // equal timestamps aren't comparable
    }

    #[test]
    fn test_serialization_roundtrip() {
        let snapshot = IoSnapshot::new(
            "nvme0n1",
            IoCounters {
                reads_completed: 12345,
                sectors_read: 1_000_000,
                time_io_ms: 30000,
                weighted_time_io_ms: 75000,
                ..Default::default()
            },
            1_000_000_000,
        );

        let json = serde_json::to_string(&snapshot).expect("serialization should succeed");
        let deser: IoSnapshot =
            serde_json::from_str(&json).expect("deserialization should succeed");

        assert_eq!(snapshot, deser);
    }
}
