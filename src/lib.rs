//! Block-device I/O telemetry core.
//!
//! Converts pairs of kernel block-layer counter snapshots into derived rates
//! (IOPS, throughput, latency, utilization, queue depth) and assesses a
//! device's queue configuration for real-time friendliness.
//!
//! ## Modules
//!
//! - [`stats`]: raw cumulative counters and timestamped snapshots
//! - [`delta`]: snapshot-pair delta engine
//! - [`scheduler`]: kernel scheduler attribute parsing
//! - [`rtscore`]: RT-friendliness scoring heuristic
//! - [`collect`]: blocking sysfs collection feeding the pure core
//! - [`logging`]: tracing initialization shared by the CLI and embedders

#![forbid(unsafe_code)]

pub mod collect;
pub mod delta;
pub mod logging;
#[cfg(test)]
mod proptest_tests;
pub mod rtscore;
pub mod scheduler;
pub mod stats;

pub use collect::{
    CollectError, DeltaTracker, list_devices, monotonic_ns, parse_stat_content, read_rt_tuning,
    read_scheduler_config, read_snapshot, sample_delta,
};
pub use delta::{HIGH_UTILIZATION_PCT, IoDelta, compute_delta};
pub use logging::{LogConfig, LogFormat, LoggingGuards, init_logging};
pub use rtscore::{MAX_RT_SCORE, MergePolicy, RtAssessment, RtTuning, assess};
pub use scheduler::{MAX_SCHEDULER_TOKENS, SchedulerConfig, parse_scheduler};
pub use stats::{IoCounters, IoSnapshot, SECTOR_SIZE};
