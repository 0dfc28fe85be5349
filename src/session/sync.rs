//! Prompt stability probing.
//!
//! A freshly opened shell may still be printing banners, motd text, or a
//! slow login script. Before the prompt can be replaced it has to be
//! quiescent: two bare line breaks, sent after matching delays, should
//! produce near-identical output. Similarity is judged by edit distance.

use std::time::Duration;

use log::{debug, trace};

use super::config::SessionConfig;
use super::LINE_BREAK;
use crate::channel::{edit_distance, read_channel, ReadOptions};
use crate::error::Result;
use crate::transport::Transport;

/// Verdict of one probe cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStability {
    /// Two probes produced similar output; the shell is at a prompt.
    Stable,

    /// Probes were empty or too different; retry with a larger delay.
    Unstable,
}

/// One full probe cycle: drain stale startup bytes, then echo two bare
/// line breaks and compare the responses.
pub(crate) async fn probe_prompt<T: Transport>(
    transport: &mut T,
    scratch: &mut [u8],
    config: &SessionConfig,
    base_delay: Duration,
) -> Result<PromptStability> {
    let medium_delay = base_delay * 5;

    // Draining: flush whatever the shell printed on startup.
    read_channel(
        transport,
        scratch,
        ReadOptions::drain(config.probe_budget, config.poll_tick),
    )
    .await?;

    let a = probe_once(transport, scratch, config, base_delay, medium_delay).await?;
    let b = probe_once(transport, scratch, config, base_delay, medium_delay).await?;

    trace!("probe a: {a:?}, probe b: {b:?}");

    if a.is_empty() || b.is_empty() {
        debug!("empty probe response, prompt unstable");
        return Ok(PromptStability::Unstable);
    }

    let distance = edit_distance(&a, &b);
    let ratio = distance as f32 / a.len() as f32;
    debug!("probe distance {distance}, ratio {ratio:.2}");

    if ratio > config.stability_ratio {
        Ok(PromptStability::Unstable)
    } else {
        Ok(PromptStability::Stable)
    }
}

/// Sleep, send a bare line break, sleep five times as long, then read the
/// response within the probe budget.
async fn probe_once<T: Transport>(
    transport: &mut T,
    scratch: &mut [u8],
    config: &SessionConfig,
    base_delay: Duration,
    medium_delay: Duration,
) -> Result<String> {
    tokio::time::sleep(base_delay).await;
    transport.send(LINE_BREAK).await?;
    tokio::time::sleep(medium_delay).await;

    let outcome = read_channel(
        transport,
        scratch,
        ReadOptions::drain(config.probe_budget, config.poll_tick).capture(),
    )
    .await?;

    Ok(outcome.output.trim().to_string())
}
