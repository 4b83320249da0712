//! Property-based tests for parser robustness and scoring invariants.

#[cfg(test)]
mod tests {
    use crate::delta::compute_delta;
    use crate::rtscore::{MAX_RT_SCORE, MergePolicy, RtTuning, assess};
    use crate::scheduler::parse_scheduler;
    use crate::stats::{IoCounters, IoSnapshot};
    use proptest::prelude::*;

    fn merge_policy_strategy() -> impl Strategy<Value = MergePolicy> {
        prop_oneof![
            Just(MergePolicy::Merge),
            Just(MergePolicy::NoMerge),
            Just(MergePolicy::TryNoMerge),
            Just(MergePolicy::Unknown),
        ]
    }

    fn counters_from(fields: [u64; 16]) -> IoCounters {
        IoCounters {
            reads_completed: fields[0],
            reads_merged: fields[1],
            sectors_read: fields[2],
            time_reading_ms: fields[3],
            writes_completed: fields[4],
            writes_merged: fields[5],
            sectors_written: fields[6],
            time_writing_ms: fields[7],
            discards_completed: fields[8],
            sectors_discarded: fields[9],
            time_discarding_ms: fields[10],
            flushes_completed: fields[11],
            time_flushing_ms: fields[12],
            io_in_flight: fields[13],
            time_io_ms: fields[14],
            weighted_time_io_ms: fields[15],
        }
    }

    proptest! {
        /// The parser never panics, never exceeds its token cap, and keeps
        /// `current` a member of `available` whenever it is set.
        #[test]
        fn parser_never_panics(raw in ".*", cap in 0usize..32) {
            let config = parse_scheduler(&raw, cap);

            prop_assert!(config.available.len() <= cap);
            if !config.current.is_empty() {
                prop_assert!(config.available.contains(&config.current));
            }
        }

        /// The total score is the sum of its bounded axes and stays in
        /// [0, 100] for arbitrary tuning inputs.
        #[test]
        fn score_stays_bounded(
            scheduler in "[a-z-]{0,16}",
            read_ahead_kb in proptest::option::of(0u64..16_384),
            merge_policy in merge_policy_strategy(),
            nr_requests in proptest::option::of(0u64..1_000_000),
        ) {
            let tuning = RtTuning { scheduler, read_ahead_kb, merge_policy, nr_requests };
            let assessment = assess(&tuning);

            prop_assert!(assessment.score <= MAX_RT_SCORE);
            prop_assert_eq!(
                assessment.score,
                assessment.scheduler_points
                    + assessment.read_ahead_points
                    + assessment.merge_points
                    + assessment.queue_depth_points
            );
        }

        /// For any monotonically advancing counter pair, every rate is
        /// non-negative and utilization stays clamped to [0, 100].
        #[test]
        fn delta_stays_in_range(
            base in proptest::array::uniform16(0u64..1_000_000_000),
            increment in proptest::array::uniform16(0u64..1_000_000_000),
            interval_ns in 1u64..10_000_000_000,
        ) {
            let before = IoSnapshot::new("sda", counters_from(base), 0);
            let mut grown = base;
            for (field, inc) in grown.iter_mut().zip(increment.iter()) {
                *field += inc;
            }
            let after = IoSnapshot::new("sda", counters_from(grown), interval_ns);

            let delta = compute_delta(&before, &after);

            prop_assert!(delta.interval_secs > 0.0);
            prop_assert!(delta.read_iops >= 0.0);
            prop_assert!(delta.write_iops >= 0.0);
            prop_assert!(delta.total_iops >= 0.0);
            prop_assert!(delta.avg_read_latency_ms >= 0.0);
            prop_assert!((0.0..=100.0).contains(&delta.utilization_pct));
            prop_assert!((0.0..=100.0).contains(&delta.read_merge_pct));
            prop_assert!(delta.avg_queue_depth >= 0.0);
        }

        /// Any regressed cumulative counter invalidates the whole pair.
        #[test]
        fn regression_always_zeroes(
            base in proptest::array::uniform16(1u64..1_000_000_000),
            field_index in 0usize..16,
            interval_ns in 1u64..10_000_000_000,
        ) {
            // io_in_flight (index 13) is instantaneous; a decrease there is
            // legal, so skip it.
            prop_assume!(field_index != 13);

            let mut shrunk = base;
            shrunk[field_index] -= 1;

            let before = IoSnapshot::new("sda", counters_from(base), 0);
            let after = IoSnapshot::new("sda", counters_from(shrunk), interval_ns);

            let delta = compute_delta(&before, &after);

            prop_assert_eq!(delta.interval_secs, 0.0);
            prop_assert_eq!(delta.total_iops, 0.0);
        }
    }
}
