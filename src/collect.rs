//! Snapshot and tuning collection from /sys/block.
//!
//! The blocking half of the crate: bounded sysfs reads that feed the pure
//! delta and scoring functions. Nothing here is safe to call from a
//! real-time path; callers choose when and how often to sample.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

use crate::delta::{IoDelta, compute_delta};
use crate::rtscore::{MergePolicy, RtTuning};
use crate::scheduler::{MAX_SCHEDULER_TOKENS, SchedulerConfig, parse_scheduler};
use crate::stats::{IoCounters, IoSnapshot};

/// Errors from the sysfs collection layer.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("failed to read sysfs attribute: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse sysfs attribute: {0}")]
    Parse(String),

    #[error("block device '{0}' not found")]
    DeviceNotFound(String),
}

fn device_path(device: &str) -> PathBuf {
    PathBuf::from("/sys/block").join(device)
}

/// Monotonic nanoseconds relative to a process-wide epoch.
///
/// Snapshot timestamps only ever need to be subtracted from each other, so
/// the epoch is arbitrary; what matters is that the clock never goes
/// backwards within the process.
pub fn monotonic_ns() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = *EPOCH.get_or_init(Instant::now);
    Instant::now().duration_since(epoch).as_nanos() as u64
}

/// Parse the contents of `/sys/block/<dev>/stat`.
///
/// 11 fields through kernel 4.17, 15 with discard counters (>= 4.18), 17
/// with flush counters (>= 5.5). Absent fields stay zero.
pub fn parse_stat_content(device: &str, content: &str) -> Result<IoCounters, CollectError> {
    let fields: Vec<u64> = content
        .split_whitespace()
        .map(|field| {
            field.parse::<u64>().map_err(|_| {
                CollectError::Parse(format!("non-numeric stat field '{field}' for {device}"))
            })
        })
        .collect::<Result<_, _>>()?;

    if fields.len() < 11 {
        return Err(CollectError::Parse(format!(
            "stat line for {device} has {} fields, expected at least 11",
            fields.len()
        )));
    }

    let mut counters = IoCounters {
        reads_completed: fields[0],
        reads_merged: fields[1],
        sectors_read: fields[2],
        time_reading_ms: fields[3],
        writes_completed: fields[4],
        writes_merged: fields[5],
        sectors_written: fields[6],
        time_writing_ms: fields[7],
        io_in_flight: fields[8],
        time_io_ms: fields[9],
        weighted_time_io_ms: fields[10],
        ..IoCounters::default()
    };

    if fields.len() >= 15 {
        counters.discards_completed = fields[11];
        // fields[12] is discard merges; not tracked
        counters.sectors_discarded = fields[13];
        counters.time_discarding_ms = fields[14];
    }
    if fields.len() >= 17 {
        counters.flushes_completed = fields[15];
        counters.time_flushing_ms = fields[16];
    }

    Ok(counters)
}

/// Take one snapshot of a device: a single bounded stat read paired with a
/// monotonic timestamp.
pub fn read_snapshot(device: &str) -> Result<IoSnapshot, CollectError> {
    let path = device_path(device).join("stat");
    if !path.exists() {
        return Err(CollectError::DeviceNotFound(device.to_string()));
    }
    let content = std::fs::read_to_string(&path)?;
    let counters = parse_stat_content(device, &content)?;
    Ok(IoSnapshot::new(device, counters, monotonic_ns()))
}

fn read_queue_attr(device: &str, attr: &str) -> Option<String> {
    let path = device_path(device).join("queue").join(attr);
    match std::fs::read_to_string(&path) {
        Ok(raw) => Some(raw.trim().to_string()),
        Err(err) => {
            debug!(device, attr, %err, "queue attribute unreadable");
            None
        }
    }
}

/// Read and parse the scheduler attribute for a device.
pub fn read_scheduler_config(device: &str) -> Result<SchedulerConfig, CollectError> {
    if !device_path(device).exists() {
        return Err(CollectError::DeviceNotFound(device.to_string()));
    }
    let raw = std::fs::read_to_string(device_path(device).join("queue/scheduler"))?;
    Ok(parse_scheduler(&raw, MAX_SCHEDULER_TOKENS))
}

/// Read the queue tuning attributes that feed the RT assessment.
///
/// Individual attributes that cannot be read or parsed degrade to
/// Unknown/None; only a missing device is an error.
pub fn read_rt_tuning(device: &str) -> Result<RtTuning, CollectError> {
    let scheduler = read_scheduler_config(device)?.current;

    let read_ahead_kb = read_queue_attr(device, "read_ahead_kb").and_then(|raw| raw.parse().ok());
    let merge_policy = read_queue_attr(device, "nomerges")
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(MergePolicy::from_nomerges)
        .unwrap_or(MergePolicy::Unknown);
    let nr_requests = read_queue_attr(device, "nr_requests").and_then(|raw| raw.parse().ok());

    Ok(RtTuning {
        scheduler,
        read_ahead_kb,
        merge_policy,
        nr_requests,
    })
}

/// Sample a device over `interval` and return the derived rates.
///
/// Blocking: sleeps for the interval between the two snapshots.
pub fn sample_delta(device: &str, interval: Duration) -> Result<IoDelta, CollectError> {
    let before = read_snapshot(device)?;
    std::thread::sleep(interval);
    let after = read_snapshot(device)?;

    let delta = compute_delta(&before, &after);
    debug!(
        device,
        interval_secs = delta.interval_secs,
        total_iops = delta.total_iops,
        utilization_pct = delta.utilization_pct,
        "sampled device delta"
    );
    if delta.is_high_utilization() {
        warn!(device, utilization_pct = delta.utilization_pct, "device I/O saturated");
    }

    Ok(delta)
}

/// Tracks the previous snapshot per device for repeated delta collection.
#[derive(Default)]
pub struct DeltaTracker {
    prev: HashMap<String, IoSnapshot>,
}

impl DeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one snapshot; returns the delta against the previous snapshot of
    /// the same device, or `None` on the first observation of a device.
    pub fn observe(&mut self, snapshot: IoSnapshot) -> Option<IoDelta> {
        let delta = self
            .prev
            .get(&snapshot.device)
            .map(|prev| compute_delta(prev, &snapshot));
        if delta.is_none() {
            debug!(device = %snapshot.device, "first snapshot; delta available on next observation");
        }
        self.prev.insert(snapshot.device.clone(), snapshot);
        delta
    }
}

/// Enumerate whole block devices under /sys/block.
///
/// Loop and ram devices are skipped; partitions do not appear under
/// /sys/block at all.
pub fn list_devices() -> Result<Vec<String>, CollectError> {
    let mut devices = Vec::new();
    for entry in std::fs::read_dir("/sys/block")? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("loop") || name.starts_with("ram") {
            continue;
        }
        devices.push(name);
    }
    devices.sort();
    Ok(devices)
}
