//! End-to-end exercise of the public library surface: synthetic snapshots
//! through the delta engine, scheduler parsing, and RT assessment.

use std::time::Duration;

use blk_telemetry::{
    DeltaTracker, IoCounters, IoSnapshot, MAX_SCHEDULER_TOKENS, MergePolicy, RtTuning, assess,
    compute_delta, parse_scheduler, parse_stat_content, sample_delta,
};

const SECOND_NS: u64 = 1_000_000_000;

#[test]
fn snapshot_pair_to_rates() {
    let stat_before = "1000 0 100000 5000 500 0 50000 2500 0 6000 12000";
    let stat_after = "1100 0 200000 5500 550 0 60000 2750 0 7000 14000";

    let before = IoSnapshot::new(
        "sda",
        parse_stat_content("sda", stat_before).expect("valid stat line"),
        0,
    );
    let after = IoSnapshot::new(
        "sda",
        parse_stat_content("sda", stat_after).expect("valid stat line"),
        SECOND_NS,
    );

    let delta = compute_delta(&before, &after);

    assert!((delta.read_iops - 100.0).abs() < 1e-6);
    assert!((delta.write_iops - 50.0).abs() < 1e-6);
    // 100,000 sectors * 512 bytes over 1s
    assert!((delta.read_bytes_per_sec - 51_200_000.0).abs() < 1.0);
    assert!((delta.avg_read_latency_ms - 5.0).abs() < 1e-9);
    assert!((delta.utilization_pct - 100.0).abs() < 1e-9);
    assert!((delta.avg_queue_depth - 2.0).abs() < 1e-9);
    assert!(!delta.is_idle());
}

#[test]
fn tracker_accumulates_per_device() {
    let mut tracker = DeltaTracker::new();

    let counters = |reads| IoCounters {
        reads_completed: reads,
        ..Default::default()
    };

    assert!(tracker.observe(IoSnapshot::new("sda", counters(100), 0)).is_none());
    let delta = tracker
        .observe(IoSnapshot::new("sda", counters(300), 2 * SECOND_NS))
        .expect("second observation yields a delta");

    // 200 reads over 2 seconds
    assert!((delta.read_iops - 100.0).abs() < 1e-6);
}

#[test]
fn scheduler_string_to_assessment() {
    let config = parse_scheduler("mq-deadline kyber [bfq] none", MAX_SCHEDULER_TOKENS);
    assert_eq!(config.current, "bfq");
    assert_eq!(config.available.len(), 4);

    let tuning = RtTuning {
        scheduler: config.current,
        read_ahead_kb: Some(128),
        merge_policy: MergePolicy::Merge,
        nr_requests: Some(64),
    };
    let bfq_assessment = assess(&tuning);

    // bfq(10) + read-ahead 128(15) + merge(5) + nr_requests 64(10)
    assert_eq!(bfq_assessment.score, 40);
    assert!(!tuning.is_rt_friendly());

    let switched = RtTuning {
        scheduler: "none".to_string(),
        ..tuning
    };
    let none_assessment = assess(&switched);

    assert!(switched.is_rt_friendly());
    assert!(none_assessment.score > bfq_assessment.score);
    assert!(none_assessment.score <= 100);
}

#[test]
fn sample_delta_surfaces_missing_device() {
    let result = sample_delta("no-such-device-zzz", Duration::from_millis(1));
    assert!(result.is_err());
}

#[test]
fn delta_serializes_for_rendering() {
    let before = IoSnapshot::new("sda", IoCounters::default(), 0);
    let after = IoSnapshot::new(
        "sda",
        IoCounters {
            reads_completed: 10,
            ..Default::default()
        },
        SECOND_NS,
    );

    let delta = compute_delta(&before, &after);
    let json = serde_json::to_string(&delta).expect("delta serializes");

    assert!(json.contains("\"read_iops\":10.0"));
}
