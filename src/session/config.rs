//! Session tuning knobs.

use std::time::Duration;

use crate::channel::TimeBudget;

/// Default prompt marker: unlikely to occur in ordinary output, and the
/// `$` suffix keeps it shell-looking in interactive transcripts.
pub const DEFAULT_PROMPT_MARKER: &str = "[PEXPECT]$";

/// Configuration for a shell session.
///
/// The defaults reproduce long-observed field behavior. In particular
/// `stability_ratio` and `install_drain_scale` are empirical constants
/// with no principled derivation; override them rather than expecting a
/// "correct" value to exist.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Literal installed as the remote prompt and matched as the command
    /// boundary.
    pub prompt_marker: String,

    /// Poll tick for the read loop; no read waits longer than this.
    pub poll_tick: Duration,

    /// Budget for stability-probe and startup-flush reads.
    pub probe_budget: TimeBudget,

    /// Drain window between sending command text and the line break,
    /// absorbing the terminal echo of the raw text.
    pub settle_window: TimeBudget,

    /// Initial delay for stability probing; doubles on every failed
    /// attempt.
    pub sync_base_delay: Duration,

    /// Attempt ceiling for stability probing. Exhaustion is a soft
    /// failure: logged, and execution proceeds on best-effort timing.
    pub sync_attempts: u32,

    /// Edit-distance ratio above which two probe responses are judged
    /// unstable.
    pub stability_ratio: f32,

    /// Microseconds of post-install drain per millisecond of the last
    /// probe delay.
    pub install_drain_scale: i64,

    /// Capacity of the reusable read buffer. A single read larger than
    /// this is truncated and logged.
    pub read_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt_marker: DEFAULT_PROMPT_MARKER.to_string(),
            poll_tick: Duration::from_millis(10),
            probe_budget: TimeBudget::from_micros(100_000),
            settle_window: TimeBudget::from_micros(500_000),
            sync_base_delay: Duration::from_millis(5),
            sync_attempts: 10,
            stability_ratio: 0.4,
            install_drain_scale: 50_000,
            read_buffer_size: 0x4000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.prompt_marker, "[PEXPECT]$");
        assert_eq!(config.read_buffer_size, 16 * 1024);
        assert_eq!(config.sync_attempts, 10);
        assert!(!config.probe_budget.is_unbounded());
    }
}
