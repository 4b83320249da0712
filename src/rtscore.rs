//! Real-time friendliness scoring for block-device queue configuration.
//!
//! A deterministic rule table: four independent configuration axes each
//! contribute a bounded number of points and the total is their plain sum.
//! Each axis trades throughput for latency predictability; the per-axis caps
//! mean a single bad setting cannot be fully offset elsewhere and a single
//! good setting cannot dominate the total. Same input, same score, always.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Maximum achievable score.
pub const MAX_RT_SCORE: u32 = 100;

/// Scheduler identity points (max 50). Single source of truth for both the
/// score and the assessment text.
const SCHEDULER_POINTS: [(&str, u32); 4] = [
    ("none", 50),
    ("mq-deadline", 40),
    ("kyber", 25),
    ("bfq", 10),
];

/// Request-merge policy, from the queue `nomerges` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergePolicy {
    /// nomerges=0: the kernel merges adjacent requests freely.
    Merge,
    /// nomerges=1: complex merge lookups disabled.
    NoMerge,
    /// nomerges=2: all merging disabled.
    TryNoMerge,
    /// Attribute missing or unparsable.
    #[default]
    Unknown,
}

impl MergePolicy {
    /// Map the raw sysfs `nomerges` value.
    pub fn from_nomerges(raw: u64) -> Self {
        match raw {
            0 => Self::Merge,
            1 => Self::NoMerge,
            2 => Self::TryNoMerge,
            _ => Self::Unknown,
        }
    }
}

/// Queue configuration inputs for the RT assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RtTuning {
    /// Active scheduler name; empty when unknown.
    pub scheduler: String,
    /// `queue/read_ahead_kb`; None when unreadable.
    pub read_ahead_kb: Option<u64>,
    /// Request-merge policy.
    pub merge_policy: MergePolicy,
    /// `queue/nr_requests`; None when unreadable.
    pub nr_requests: Option<u64>,
}

impl RtTuning {
    pub fn is_none_scheduler(&self) -> bool {
        self.scheduler == "none"
    }

    pub fn is_mq_deadline(&self) -> bool {
        self.scheduler == "mq-deadline"
    }

    /// Schedulers with bounded, predictable latency behavior.
    pub fn is_rt_friendly(&self) -> bool {
        self.is_none_scheduler() || self.is_mq_deadline()
    }

    /// Read-ahead small enough not to inflate tail latency (<= 128 KB).
    pub fn is_read_ahead_low(&self) -> bool {
        matches!(self.read_ahead_kb, Some(kb) if kb <= 128)
    }
}

/// Full assessment: total score, per-axis points, and per-axis notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtAssessment {
    /// Total score in [0, 100].
    pub score: u32,
    /// Scheduler identity points (max 50).
    pub scheduler_points: u32,
    /// Read-ahead points (max 20).
    pub read_ahead_points: u32,
    /// Merge-policy points (max 15).
    pub merge_points: u32,
    /// Queue-depth points (max 15).
    pub queue_depth_points: u32,
    /// Per-factor human-readable notes.
    pub scheduler_note: String,
    pub read_ahead_note: String,
    pub merge_note: String,
    pub queue_depth_note: String,
}

impl RtAssessment {
    /// Categorical label for the total score.
    pub fn rating(&self) -> &'static str {
        match self.score {
            s if s >= 85 => "Excellent",
            s if s >= 65 => "Good",
            s if s >= 40 => "Moderate",
            s if s >= 20 => "Weak",
            _ => "Unsuitable",
        }
    }
}

/// Score a queue configuration for real-time friendliness.
pub fn assess(tuning: &RtTuning) -> RtAssessment {
    let scheduler_points = scheduler_points(&tuning.scheduler);
    let read_ahead_points = read_ahead_points(tuning.read_ahead_kb);
    let merge_points = merge_points(tuning.merge_policy);
    let queue_depth_points = nr_requests_points(tuning.nr_requests);
    let score = scheduler_points + read_ahead_points + merge_points + queue_depth_points;

    debug!(
        score,
        scheduler = %tuning.scheduler,
        scheduler_points,
        read_ahead_points,
        merge_points,
        queue_depth_points,
        "RT assessment computed"
    );

    RtAssessment {
        score,
        scheduler_points,
        read_ahead_points,
        merge_points,
        queue_depth_points,
        scheduler_note: scheduler_note(&tuning.scheduler),
        read_ahead_note: read_ahead_note(tuning.read_ahead_kb),
        merge_note: merge_note(tuning.merge_policy).to_string(),
        queue_depth_note: queue_depth_note(tuning.nr_requests),
    }
}

fn scheduler_points(name: &str) -> u32 {
    SCHEDULER_POINTS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|&(_, points)| points)
        .unwrap_or(0)
}

fn read_ahead_points(read_ahead_kb: Option<u64>) -> u32 {
    match read_ahead_kb {
        Some(0) => 20,
        Some(1..=128) => 15,
        Some(129..=512) => 5,
        _ => 0,
    }
}

fn merge_points(policy: MergePolicy) -> u32 {
    match policy {
        MergePolicy::TryNoMerge => 15,
        MergePolicy::NoMerge => 10,
        MergePolicy::Merge => 5,
        MergePolicy::Unknown => 0,
    }
}

fn nr_requests_points(nr_requests: Option<u64>) -> u32 {
    match nr_requests {
        Some(n) if n <= 32 => 15,
        Some(n) if n <= 128 => 10,
        Some(n) if n <= 256 => 5,
        _ => 0,
    }
}

fn scheduler_note(name: &str) -> String {
    match name {
        "none" => "none: requests pass through without kernel-side reordering".to_string(),
        "mq-deadline" => "mq-deadline: bounded reordering with expiry deadlines".to_string(),
        "kyber" => "kyber: latency-targeted but adaptive queueing".to_string(),
        "bfq" => "bfq: fairness-oriented, unpredictable tail latency".to_string(),
        "" => "scheduler unknown".to_string(),
        other => format!("{other}: not a recognized low-latency scheduler"),
    }
}

fn read_ahead_note(read_ahead_kb: Option<u64>) -> String {
    match read_ahead_kb {
        Some(0) => "read-ahead disabled".to_string(),
        Some(kb @ 1..=128) => format!("read-ahead low ({kb} KB)"),
        Some(kb @ 129..=512) => format!("read-ahead moderate ({kb} KB)"),
        Some(kb) => format!("read-ahead high ({kb} KB), speculative I/O competes with RT requests"),
        None => "read-ahead unknown".to_string(),
    }
}

fn merge_note(policy: MergePolicy) -> &'static str {
    match policy {
        MergePolicy::TryNoMerge => "all request merging disabled",
        MergePolicy::NoMerge => "complex merge lookups disabled",
        MergePolicy::Merge => "request merging enabled, completion times vary",
        MergePolicy::Unknown => "merge policy unknown",
    }
}

fn queue_depth_note(nr_requests: Option<u64>) -> String {
    match nr_requests {
        Some(n) if n <= 32 => format!("queue shallow (nr_requests={n})"),
        Some(n) if n <= 128 => format!("queue moderate (nr_requests={n})"),
        Some(n) if n <= 256 => format!("queue deep (nr_requests={n})"),
        Some(n) => format!("queue very deep (nr_requests={n}), long kernel-side backlog possible"),
        None => "queue depth unknown".to_string(),
    }
}
