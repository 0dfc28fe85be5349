//! Shell session: prompt setup and command execution.
//!
//! A [`Session`] owns one transport, one reusable read buffer, and the
//! prompt marker for that shell. [`Session::prepare`] runs once per
//! session (stability probing, then marker installation); after that,
//! commands run serially through [`Session::execute_captured`] or
//! [`Session::execute_streaming`].

mod config;
mod install;
mod sync;

use std::time::{Duration, Instant};

use log::{debug, warn};

pub use config::{SessionConfig, DEFAULT_PROMPT_MARKER};
pub use sync::PromptStability;

use crate::channel::{read_channel, CompletionStatus, Matcher, ReadOptions, TimeBudget};
use crate::error::Result;
use crate::sink::OutputSink;
use crate::transport::Transport;

/// Line terminator sent as a separate write, decoupling text transmission
/// from the execution trigger.
pub(crate) const LINE_BREAK: &[u8] = b"\n";

/// Result of one command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// Captured output, trimmed, with any residual command echo removed.
    /// Empty for streaming executions (output went to the sink).
    pub output: String,

    /// How the read ended. Timeouts and disconnects still carry whatever
    /// output was accumulated before them.
    pub status: CompletionStatus,

    /// Time taken by the execution.
    pub elapsed: Duration,

    /// Whether prompt synchronization succeeded for this session. False
    /// means the session proceeded on best-effort timing.
    pub prompt_synced: bool,
}

impl Response {
    /// Whether the prompt boundary was seen, i.e. the command ran to
    /// completion.
    pub fn is_complete(&self) -> bool {
        self.status == CompletionStatus::PromptFound
    }

    /// Iterate over output lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines()
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output)
    }
}

/// One remote shell under automation.
///
/// Exclusively owned by its caller; `&mut self` on every operation keeps
/// command executions serial, and the read buffer is reused across calls.
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    scratch: Vec<u8>,
    prompt_matcher: Matcher,
    prompt_synced: bool,
}

impl<T: Transport> Session<T> {
    /// Create a session over a connected transport.
    ///
    /// Fails only if the configured prompt marker cannot be compiled into
    /// a matcher, which escaped literal input should never do.
    pub fn new(transport: T, config: SessionConfig) -> Result<Self> {
        let prompt_matcher = Matcher::prompt(&config.prompt_marker)?;
        let scratch = vec![0u8; config.read_buffer_size];
        Ok(Self {
            transport,
            config,
            scratch,
            prompt_matcher,
            prompt_synced: true,
        })
    }

    /// Create a session with default configuration.
    pub fn with_defaults(transport: T) -> Result<Self> {
        Self::new(transport, SessionConfig::default())
    }

    /// Synchronize the remote prompt and install the marker.
    ///
    /// Stability probing retries up to the configured ceiling, doubling
    /// the base delay each time. Exhausting the ceiling is a soft
    /// failure: it is logged, recorded on subsequent responses, and the
    /// marker is installed anyway using the last delay as the timing
    /// estimate.
    pub async fn prepare(&mut self) -> Result<()> {
        let mut base_delay = self.config.sync_base_delay;
        let mut synced = false;

        for attempt in 1..=self.config.sync_attempts {
            let verdict = sync::probe_prompt(
                &mut self.transport,
                &mut self.scratch,
                &self.config,
                base_delay,
            )
            .await?;
            if verdict == PromptStability::Stable {
                debug!("prompt stable on attempt {attempt}");
                synced = true;
                break;
            }
            debug!("prompt unstable on attempt {attempt}, doubling delay");
            base_delay *= 2;
        }

        if !synced {
            warn!(
                "prompt never stabilized after {} attempts; proceeding on best-effort timing",
                self.config.sync_attempts
            );
        }
        self.prompt_synced = synced;

        install::install_prompt(
            &mut self.transport,
            &mut self.scratch,
            &self.config,
            base_delay,
        )
        .await
    }

    /// Execute `command` and capture its output.
    ///
    /// Returns whatever was captured even when the budget fired or the
    /// transport dropped before the boundary appeared; check
    /// [`Response::status`] to tell the cases apart.
    pub async fn execute_captured(
        &mut self,
        command: &str,
        budget: TimeBudget,
    ) -> Result<Response> {
        let start = Instant::now();
        let echo_matcher = Matcher::command(command)?;

        self.send_command(command).await?;

        let outcome = read_channel(
            &mut self.transport,
            &mut self.scratch,
            ReadOptions::command(budget, self.config.poll_tick, &self.prompt_matcher).capture(),
        )
        .await?;

        let mut output = outcome.output.trim().to_string();
        // Echo that leaked past the settle window still starts the
        // capture; strip it with the command matcher.
        if let Some(remainder) = echo_matcher.apply(&output) {
            output = remainder.trim().to_string();
        }

        if outcome.status != CompletionStatus::PromptFound {
            debug!(
                "command {:?} ended with {:?} after {:?}",
                command,
                outcome.status,
                start.elapsed()
            );
        }

        Ok(Response {
            command: command.to_string(),
            output,
            status: outcome.status,
            elapsed: start.elapsed(),
            prompt_synced: self.prompt_synced,
        })
    }

    /// Execute `command`, forwarding every output increment to `sink` as
    /// it arrives. `Response::output` is empty; the increments already
    /// went to the sink.
    pub async fn execute_streaming(
        &mut self,
        command: &str,
        budget: TimeBudget,
        sink: &mut dyn OutputSink,
    ) -> Result<Response> {
        let start = Instant::now();

        self.send_command(command).await?;

        let outcome = read_channel(
            &mut self.transport,
            &mut self.scratch,
            ReadOptions::command(budget, self.config.poll_tick, &self.prompt_matcher)
                .stream_to(sink),
        )
        .await?;

        Ok(Response {
            command: command.to_string(),
            output: String::new(),
            status: outcome.status,
            elapsed: start.elapsed(),
            prompt_synced: self.prompt_synced,
        })
    }

    /// Send the command text, absorb its terminal echo during the settle
    /// window, then send the execution trigger.
    async fn send_command(&mut self, command: &str) -> Result<()> {
        self.transport.send(command.as_bytes()).await?;
        read_channel(
            &mut self.transport,
            &mut self.scratch,
            ReadOptions::drain(self.config.settle_window, self.config.poll_tick),
        )
        .await?;
        self.transport.send(LINE_BREAK).await?;
        Ok(())
    }

    /// Whether prompt synchronization succeeded during [`prepare`](Self::prepare).
    pub fn is_prompt_synced(&self) -> bool {
        self.prompt_synced
    }

    /// The marker this session installs and matches on.
    pub fn prompt_marker(&self) -> &str {
        &self.config.prompt_marker
    }

    /// Release the transport, disconnecting cleanly.
    pub async fn close(self) -> Result<()> {
        self.transport.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::tests::RecordingSink;
    use crate::transport::testing::MockTransport;

    /// Shrunk timing so busy-wait windows stay in the low milliseconds.
    fn test_config() -> SessionConfig {
        SessionConfig {
            poll_tick: Duration::from_micros(100),
            probe_budget: TimeBudget::from_micros(5_000),
            settle_window: TimeBudget::from_micros(2_000),
            sync_base_delay: Duration::from_millis(1),
            sync_attempts: 3,
            install_drain_scale: 100,
            ..SessionConfig::default()
        }
    }

    #[tokio::test]
    async fn test_execute_captured_end_to_end() {
        let transport = MockTransport::empty()
            .respond_to_line_break(vec![b"hi\n[PEXPECT]$ ".to_vec()]);
        let mut session = Session::new(transport, test_config()).unwrap();

        let response = session
            .execute_captured("echo hi", TimeBudget::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.output, "hi");
        assert!(response.is_complete());
        assert_eq!(response.command, "echo hi");
    }

    #[tokio::test]
    async fn test_execute_captured_strips_leaked_echo() {
        // Echo arrives after the settle window, interleaved with output.
        let transport = MockTransport::empty()
            .respond_to_line_break(vec![b"echo hi\r\nhi\r\n[PEXPECT]$ ".to_vec()]);
        let mut session = Session::new(transport, test_config()).unwrap();

        let response = session
            .execute_captured("echo hi", TimeBudget::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.output, "hi");
    }

    #[tokio::test]
    async fn test_execute_captured_timeout_keeps_partial_output() {
        let transport = MockTransport::empty()
            .respond_to_line_break(vec![b"still going".to_vec()]);
        let mut session = Session::new(transport, test_config()).unwrap();

        let response = session
            .execute_captured("sleep 100", TimeBudget::from_micros(10_000))
            .await
            .unwrap();

        assert_eq!(response.status, CompletionStatus::TimedOut);
        assert_eq!(response.output, "still going");
        assert!(!response.is_complete());
    }

    #[tokio::test]
    async fn test_execute_streaming_forwards_increments_in_order() {
        let transport = MockTransport::empty().respond_to_line_break(vec![
            b"one\n".to_vec(),
            b"two\n".to_vec(),
            b"[PEXPECT]$ ".to_vec(),
        ]);
        let mut session = Session::new(transport, test_config()).unwrap();
        let mut sink = RecordingSink::default();

        let response = session
            .execute_streaming("cat log", TimeBudget::from_secs(5), &mut sink)
            .await
            .unwrap();

        assert!(response.is_complete());
        assert!(response.output.is_empty());
        assert_eq!(sink.increments, vec!["one\n", "two\n"]);
    }

    #[tokio::test]
    async fn test_prepare_stable_first_attempt() {
        let transport = MockTransport::empty()
            .respond_to_line_break(vec![b"$ ".to_vec()])
            .respond_to_line_break(vec![b"$ ".to_vec()]);
        let mut session = Session::new(transport, test_config()).unwrap();

        session.prepare().await.unwrap();
        assert!(session.is_prompt_synced());
    }

    #[tokio::test]
    async fn test_prepare_exhaustion_is_soft_and_still_installs() {
        // No probe ever answers: every attempt is judged unstable, yet the
        // marker gets installed and the session stays usable.
        let transport = MockTransport::empty();
        let mut session = Session::new(transport, test_config()).unwrap();

        session.prepare().await.unwrap();
        assert!(!session.is_prompt_synced());

        let response = session
            .execute_captured("true", TimeBudget::from_micros(5_000))
            .await
            .unwrap();
        assert!(!response.prompt_synced);
    }

    #[tokio::test]
    async fn test_custom_marker_is_matched() {
        let config = SessionConfig {
            prompt_marker: "<<DONE>>".to_string(),
            ..test_config()
        };
        let transport = MockTransport::empty()
            .respond_to_line_break(vec![b"out\n<<DONE>> ".to_vec()]);
        let mut session = Session::new(transport, config).unwrap();

        let response = session
            .execute_captured("run", TimeBudget::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response.output, "out");
        assert!(response.is_complete());
    }
}

