//! # sshtap
//!
//! Expect-style command automation over an already-authenticated SSH
//! shell. sshtap detects when a fresh shell has reached a quiescent
//! prompt, overwrites the prompt with a recognizable marker, and then
//! runs commands, recognizing completion by the marker reappearing in
//! the byte stream. Every read carries an explicit time budget and never
//! blocks past its polling tick.
//!
//! ## Features
//!
//! - Async SSH shell channel via russh
//! - Prompt stability probing with edit-distance similarity
//! - Marker-based command/output boundary detection
//! - Tick-bounded non-blocking reads; budgets never block the caller
//! - Captured or streamed output (console or bus-style JSON records)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sshtap::{AuthMethod, Session, SshConfig, SshTransport, TimeBudget};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sshtap::Error> {
//!     let config = SshConfig::new(
//!         "192.168.1.10",
//!         "admin",
//!         AuthMethod::Password("secret".into()),
//!     );
//!     let transport = SshTransport::connect(config).await?;
//!
//!     let mut session = Session::with_defaults(transport)?;
//!     session.prepare().await?;
//!
//!     let response = session
//!         .execute_captured("uname -a", TimeBudget::from_secs(5))
//!         .await?;
//!     println!("{}", response.output);
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod session;
pub mod sink;
pub mod transport;

// Re-export main types for convenience
pub use channel::{edit_distance, escape, CompletionStatus, Matcher, TimeBudget};
pub use error::Error;
pub use session::{Response, Session, SessionConfig, DEFAULT_PROMPT_MARKER};
pub use sink::{BusSink, ConsoleSink, OutputSink};
pub use transport::{AuthMethod, SshConfig, SshTransport, Transport};
