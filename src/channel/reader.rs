//! Incremental, time-budgeted channel read loop.
//!
//! One poll tick at a time: drain the transport without blocking, test the
//! tick's increment for the prompt boundary, dispatch the increment to the
//! capture accumulator and/or the output sink, then wait one tick. The
//! loop never blocks longer than a single tick and never returns while
//! bytes are known to be in flight for the tracked boundary, except on
//! budget expiry or transport failure.

use std::time::{Duration, Instant};

use log::{trace, warn};

use super::patterns::Matcher;
use crate::error::Result;
use crate::sink::OutputSink;
use crate::transport::{Transport, TryRead};

/// A read deadline denominated in microseconds.
///
/// Non-positive means unbounded: wait until the terminal condition occurs.
/// That is an explicit request, never "already expired".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBudget {
    micros: i64,
}

impl TimeBudget {
    /// Budget of `micros` microseconds; non-positive means unbounded.
    pub const fn from_micros(micros: i64) -> Self {
        Self { micros }
    }

    /// Budget of `secs` seconds; non-positive means unbounded.
    pub const fn from_secs(secs: i64) -> Self {
        Self {
            micros: secs.saturating_mul(1_000_000),
        }
    }

    /// Explicit wait-forever budget.
    pub const fn unbounded() -> Self {
        Self { micros: 0 }
    }

    pub const fn is_unbounded(&self) -> bool {
        self.micros <= 0
    }

    /// Whether `elapsed` has consumed the budget. Always false when
    /// unbounded.
    pub fn is_expired(&self, elapsed: Duration) -> bool {
        !self.is_unbounded() && elapsed.as_micros() >= self.micros as u128
    }
}

impl From<Duration> for TimeBudget {
    fn from(d: Duration) -> Self {
        Self::from_micros(d.as_micros().min(i64::MAX as u128) as i64)
    }
}

/// How a [`read_channel`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    /// The prompt boundary was recognized; the command is finished.
    PromptFound,

    /// The budget elapsed before the boundary appeared. Partial output is
    /// returned; the caller decides whether to retry.
    TimedOut,

    /// The transport reported end-of-stream or a hard read failure.
    /// Partial output is returned.
    Disconnected,
}

/// Result of a [`read_channel`] call: whatever was accumulated, plus how
/// the loop ended. Output is empty when capture was not requested.
#[derive(Debug)]
pub struct ReadOutcome {
    pub output: String,
    pub status: CompletionStatus,
}

/// Options for one [`read_channel`] call.
///
/// Command mode (a prompt matcher is present) enables boundary detection,
/// one-shot echo elision, and sink forwarding. Capture accumulates the
/// full output for the caller; without capture or a sink, increments are
/// consumed and discarded.
pub struct ReadOptions<'a> {
    budget: TimeBudget,
    tick: Duration,
    prompt: Option<&'a Matcher>,
    capture: bool,
    sink: Option<&'a mut dyn OutputSink>,
}

impl<'a> ReadOptions<'a> {
    /// Non-command read: drain the channel until the budget runs out.
    pub fn drain(budget: TimeBudget, tick: Duration) -> Self {
        Self {
            budget,
            tick,
            prompt: None,
            capture: false,
            sink: None,
        }
    }

    /// Command-mode read: stop when `prompt` matches the stream.
    pub fn command(budget: TimeBudget, tick: Duration, prompt: &'a Matcher) -> Self {
        Self {
            budget,
            tick,
            prompt: Some(prompt),
            capture: false,
            sink: None,
        }
    }

    /// Accumulate everything read and return it in the outcome.
    pub fn capture(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Forward each increment, in order, to `sink`. Only command-mode
    /// reads forward output.
    pub fn stream_to(mut self, sink: &'a mut dyn OutputSink) -> Self {
        self.sink = Some(sink);
        self
    }

    fn is_command_mode(&self) -> bool {
        self.prompt.is_some()
    }
}

/// Run the read loop until the boundary is found, the budget expires, or
/// the transport fails. See the module docs for the per-tick algorithm.
///
/// Transport failures are not `Err`: they end the call with
/// [`CompletionStatus::Disconnected`] and partial output. Only sink
/// delivery failures propagate as errors.
pub async fn read_channel<T: Transport>(
    transport: &mut T,
    scratch: &mut [u8],
    mut opts: ReadOptions<'_>,
) -> Result<ReadOutcome> {
    let start = Instant::now();
    let mut accumulated = String::new();
    let mut echo_pending = opts.is_command_mode();

    loop {
        // Budget check is the fallback; a boundary found after this point
        // on the same tick still wins.
        if opts.budget.is_expired(start.elapsed()) {
            trace!("budget expired after {:?}", start.elapsed());
            return Ok(ReadOutcome {
                output: accumulated,
                status: CompletionStatus::TimedOut,
            });
        }

        // Drain everything currently available into this tick's increment.
        // Raw bytes first: a multibyte character may straddle two reads,
        // so decoding happens once per increment, not per chunk.
        let mut raw = Vec::new();
        let mut closed = false;
        loop {
            match transport.try_read(scratch) {
                Ok(TryRead::Data(n)) => {
                    if n >= scratch.len() {
                        warn!(
                            "read chunk filled the {}-byte buffer; output may be truncated",
                            scratch.len()
                        );
                    }
                    raw.extend_from_slice(&scratch[..n]);
                }
                Ok(TryRead::WouldBlock) => break,
                Ok(TryRead::Eof) => {
                    closed = true;
                    break;
                }
                Err(e) => {
                    warn!("transport read failed: {e}");
                    closed = true;
                    break;
                }
            }
        }

        let mut increment = String::from_utf8_lossy(&raw).into_owned();

        // Elide the command's echoed newline once, on the first non-empty
        // increment of the call.
        if echo_pending && !increment.is_empty() {
            increment = increment.trim_start().to_string();
            echo_pending = false;
        }

        if let Some(matcher) = opts.prompt {
            if let Some(preceding) = matcher.apply(&increment) {
                trace!("prompt boundary found after {:?}", start.elapsed());
                if !preceding.is_empty() {
                    if let Some(sink) = opts.sink.as_mut() {
                        sink.publish(&preceding)?;
                    }
                    if opts.capture {
                        accumulated.push_str(&preceding);
                    }
                }
                return Ok(ReadOutcome {
                    output: accumulated,
                    status: CompletionStatus::PromptFound,
                });
            }
        }

        if !increment.is_empty() {
            if opts.capture {
                accumulated.push_str(&increment);
            }
            if opts.is_command_mode() {
                if let Some(sink) = opts.sink.as_mut() {
                    sink.publish(&increment)?;
                }
            }
        }

        if closed {
            return Ok(ReadOutcome {
                output: accumulated,
                status: CompletionStatus::Disconnected,
            });
        }

        if let Err(e) = transport.wait_ready(opts.tick).await {
            warn!("transport wait failed: {e}");
            return Ok(ReadOutcome {
                output: accumulated,
                status: CompletionStatus::Disconnected,
            });
        }
    }
}
