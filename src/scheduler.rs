//! Kernel I/O scheduler attribute parsing.
//!
//! The block layer exposes the scheduler list for a device as a single line,
//! e.g. `mq-deadline kyber [bfq] none`, where the bracketed token is the
//! active scheduler.

use serde::{Deserialize, Serialize};

/// Conventional cap on scheduler tokens accepted from one attribute line.
pub const MAX_SCHEDULER_TOKENS: usize = 16;

/// Parsed scheduler attribute: the active scheduler plus every scheduler the
/// kernel offers for the device, in the order listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Active scheduler name; empty when no token was bracketed.
    pub current: String,
    /// Every offered scheduler, brackets stripped, in input order.
    pub available: Vec<String>,
}

/// Parse a scheduler attribute line.
///
/// Tolerant of malformed input: an empty string yields an empty config, a
/// missing closing bracket is accepted, and at most `max_tokens` names are
/// collected so adversarial input cannot force unbounded allocation.
pub fn parse_scheduler(raw: &str, max_tokens: usize) -> SchedulerConfig {
    let mut config = SchedulerConfig::default();

    for token in raw.split_whitespace() {
        if config.available.len() >= max_tokens {
            break;
        }

        let (name, is_current) = match token.strip_prefix('[') {
            Some(rest) => (rest, true),
            None => (token, false),
        };
        let name = name.strip_suffix(']').unwrap_or(name);
        if name.is_empty() {
            continue;
        }

        if is_current {
            config.current = name.to_string();
        }
        config.available.push(name.to_string());
    }

    config
}
