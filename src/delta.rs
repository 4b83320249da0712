//! Delta engine: converts two time-separated counter snapshots into rates.
//!
//! The engine is a total function. Precondition failures (device mismatch,
//! non-advancing timestamp, a counter moving backwards after a device reset)
//! degrade to an all-zero result with `interval_secs == 0.0` instead of an
//! error, so it is safe to call in hot diagnostic loops.

use serde::{Deserialize, Serialize};

use crate::stats::{IoCounters, IoSnapshot, SECTOR_SIZE};

/// Utilization threshold above which a device counts as saturated.
pub const HIGH_UTILIZATION_PCT: f64 = 80.0;

/// Derived per-interval rates for one device.
///
/// Computed from exactly one comparable snapshot pair and never mutated
/// afterwards. An all-zero value with `interval_secs == 0.0` means the pair
/// was not comparable; a genuinely idle device still reports a nonzero
/// `interval_secs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IoDelta {
    /// Device name.
    pub device: String,
    /// Wall-clock seconds between the two snapshots. Zero means the pair
    /// was not comparable and every rate below is zero.
    pub interval_secs: f64,
    /// Completed reads per second.
    pub read_iops: f64,
    /// Completed writes per second.
    pub write_iops: f64,
    /// Completed discards per second.
    pub discard_iops: f64,
    /// Completed flushes per second.
    pub flush_iops: f64,
    /// Completed operations per second across all request classes.
    pub total_iops: f64,
    /// Read throughput in bytes per second.
    pub read_bytes_per_sec: f64,
    /// Write throughput in bytes per second.
    pub write_bytes_per_sec: f64,
    /// Discard throughput in bytes per second.
    pub discard_bytes_per_sec: f64,
    /// Average read service time (ms); zero when no reads completed.
    pub avg_read_latency_ms: f64,
    /// Average write service time (ms); zero when no writes completed.
    pub avg_write_latency_ms: f64,
    /// Average discard service time (ms); zero when no discards completed.
    pub avg_discard_latency_ms: f64,
    /// Average flush service time (ms); zero when no flushes completed.
    pub avg_flush_latency_ms: f64,
    /// Busy time as a percentage of wall time, clamped to [0, 100].
    /// Multi-queue devices can accumulate more busy time than wall time.
    pub utilization_pct: f64,
    /// Average number of outstanding requests. Not clamped; legitimately
    /// exceeds 1 under concurrent I/O.
    pub avg_queue_depth: f64,
    /// Reads merged as a percentage of merge candidates.
    pub read_merge_pct: f64,
    /// Writes merged as a percentage of merge candidates.
    pub write_merge_pct: f64,
}

impl IoDelta {
    fn not_comparable(device: &str) -> Self {
        Self {
            device: device.to_string(),
            ..Self::default()
        }
    }

    /// True when the interval saw no completed operations and no busy time.
    pub fn is_idle(&self) -> bool {
        self.total_iops == 0.0 && self.utilization_pct == 0.0
    }

    /// True when the device was busy for more than
    /// [`HIGH_UTILIZATION_PCT`] of the interval.
    pub fn is_high_utilization(&self) -> bool {
        self.utilization_pct > HIGH_UTILIZATION_PCT
    }
}

/// Convert two snapshots of the same device into per-second rates.
///
/// Total function: on device mismatch, a non-advancing timestamp, or any
/// cumulative counter moving backwards (device reset or replug between the
/// samples), the result is all-zero with `interval_secs == 0.0`. Deltas are
/// never silently wrapped.
pub fn compute_delta(before: &IoSnapshot, after: &IoSnapshot) -> IoDelta {
    if !before.comparable_with(after) {
        return IoDelta::not_comparable(&after.device);
    }
    if counters_regressed(&before.counters, &after.counters) {
        return IoDelta::not_comparable(&after.device);
    }

    let interval_secs = (after.timestamp_ns - before.timestamp_ns) as f64 / 1e9;
    let interval_ms = interval_secs * 1000.0;

    let b = &before.counters;
    let a = &after.counters;

    let reads = a.reads_completed - b.reads_completed;
    let writes = a.writes_completed - b.writes_completed;
    let discards = a.discards_completed - b.discards_completed;
    let flushes = a.flushes_completed - b.flushes_completed;
    let total_ops = reads + writes + discards + flushes;

    let utilization_pct =
        (100.0 * (a.time_io_ms - b.time_io_ms) as f64 / interval_ms).clamp(0.0, 100.0);
    let avg_queue_depth = (a.weighted_time_io_ms - b.weighted_time_io_ms) as f64 / interval_ms;

    IoDelta {
        device: after.device.clone(),
        interval_secs,
        read_iops: rate(reads, interval_secs),
        write_iops: rate(writes, interval_secs),
        discard_iops: rate(discards, interval_secs),
        flush_iops: rate(flushes, interval_secs),
        total_iops: rate(total_ops, interval_secs),
        read_bytes_per_sec: byte_rate(a.sectors_read - b.sectors_read, interval_secs),
        write_bytes_per_sec: byte_rate(a.sectors_written - b.sectors_written, interval_secs),
        discard_bytes_per_sec: byte_rate(a.sectors_discarded - b.sectors_discarded, interval_secs),
        avg_read_latency_ms: avg_latency_ms(a.time_reading_ms - b.time_reading_ms, reads),
        avg_write_latency_ms: avg_latency_ms(a.time_writing_ms - b.time_writing_ms, writes),
        avg_discard_latency_ms: avg_latency_ms(a.time_discarding_ms - b.time_discarding_ms, discards),
        avg_flush_latency_ms: avg_latency_ms(a.time_flushing_ms - b.time_flushing_ms, flushes),
        utilization_pct,
        avg_queue_depth,
        read_merge_pct: merge_pct(a.reads_merged - b.reads_merged, reads),
        write_merge_pct: merge_pct(a.writes_merged - b.writes_merged, writes),
    }
}

fn rate(count: u64, interval_secs: f64) -> f64 {
    count as f64 / interval_secs
}

fn byte_rate(sectors: u64, interval_secs: f64) -> f64 {
    sectors as f64 * SECTOR_SIZE as f64 / interval_secs
}

fn avg_latency_ms(time_ms: u64, ops: u64) -> f64 {
    if ops > 0 {
        time_ms as f64 / ops as f64
    } else {
        0.0
    }
}

fn merge_pct(merges: u64, ops: u64) -> f64 {
    let candidates = merges + ops;
    if candidates > 0 {
        100.0 * merges as f64 / candidates as f64
    } else {
        0.0
    }
}

/// True if any cumulative counter moved backwards between the snapshots.
/// `io_in_flight` is instantaneous and may legitimately decrease.
fn counters_regressed(before: &IoCounters, after: &IoCounters) -> bool {
    let pairs = [
        (before.reads_completed, after.reads_completed),
        (before.reads_merged, after.reads_merged),
        (before.sectors_read, after.sectors_read),
        (before.time_reading_ms, after.time_reading_ms),
        (before.writes_completed, after.writes_completed),
        (before.writes_merged, after.writes_merged),
        (before.sectors_written, after.sectors_written),
        (before.time_writing_ms, after.time_writing_ms),
        (before.discards_completed, after.discards_completed),
        (before.sectors_discarded, after.sectors_discarded),
        (before.time_discarding_ms, after.time_discarding_ms),
        (before.flushes_completed, after.flushes_completed),
        (before.time_flushing_ms, after.time_flushing_ms),
        (before.time_io_ms, after.time_io_ms),
        (before.weighted_time_io_ms, after.weighted_time_io_ms),
    ];
    pairs.iter().any(|&(b, a)| a < b)
}
