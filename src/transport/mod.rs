//! Transport layer: the byte-channel seam the automation engine reads from.
//!
//! The engine only ever performs non-blocking reads, explicit writes, and
//! tick-bounded readiness waits, so those three operations are the whole
//! [`Transport`] contract. The production implementation wraps a russh
//! shell channel; tests substitute scripted mocks.

pub mod config;
mod ssh;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::time::Duration;

use crate::error::TransportError;

pub use config::{AuthMethod, SshConfig};
pub use ssh::SshTransport;

/// Outcome of a single non-blocking read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRead {
    /// `n` bytes were copied into the caller's buffer.
    Data(usize),

    /// No data currently available; wait and retry.
    WouldBlock,

    /// The peer closed the stream; no further data will arrive.
    Eof,
}

/// A connected byte channel supporting non-blocking reads.
pub trait Transport: Send {
    /// Non-blocking read into `buf`. Never waits: either copies available
    /// bytes, reports [`TryRead::WouldBlock`], or reports end-of-stream.
    fn try_read(&mut self, buf: &mut [u8]) -> Result<TryRead, TransportError>;

    /// Write `data` to the channel in full.
    fn send(&mut self, data: &[u8]) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Wait until the channel may have data to read, blocking at most one
    /// `tick`. Returning without data is normal; the caller loops.
    fn wait_ready(
        &mut self,
        tick: Duration,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Release the underlying connection. Consumes the transport so every
    /// exit path gives it up exactly once.
    fn close(self) -> impl Future<Output = Result<(), TransportError>> + Send
    where
        Self: Sized;
}
