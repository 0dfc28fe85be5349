//! Prompt marker installation.

use std::time::Duration;

use log::debug;

use super::config::SessionConfig;
use super::LINE_BREAK;
use crate::channel::{read_channel, ReadOptions, TimeBudget};
use crate::error::Result;
use crate::transport::Transport;

/// Shell command that disables hooks which could rewrite the prompt after
/// every command.
const UNSET_PROMPT_HOOK: &str = "unset PROMPT_COMMAND";

/// Overwrite the remote shell's prompt with the session's marker.
///
/// Each command is written as text followed by a separate line-break
/// write, so transmission and the execution trigger stay decoupled and
/// terminal echo cannot race the command text.
///
/// The drain that follows waits `estimated_delay × install_drain_scale`
/// microseconds, where `estimated_delay` is the last base delay the
/// stability probing used. The scale is empirical; it has no principled
/// derivation and is kept as a config default.
pub(crate) async fn install_prompt<T: Transport>(
    transport: &mut T,
    scratch: &mut [u8],
    config: &SessionConfig,
    estimated_delay: Duration,
) -> Result<()> {
    let set_prompt = format!("PS1='{} '", config.prompt_marker);
    debug!("installing prompt marker {:?}", config.prompt_marker);

    transport.send(UNSET_PROMPT_HOOK.as_bytes()).await?;
    transport.send(LINE_BREAK).await?;
    transport.send(set_prompt.as_bytes()).await?;
    transport.send(LINE_BREAK).await?;

    let drain_micros = (estimated_delay.as_millis() as i64)
        .saturating_mul(config.install_drain_scale)
        .max(1);
    read_channel(
        transport,
        scratch,
        ReadOptions::drain(TimeBudget::from_micros(drain_micros), config.poll_tick),
    )
    .await?;

    Ok(())
}
