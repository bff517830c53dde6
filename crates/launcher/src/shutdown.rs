//! Termination signals for the idle phase.

use std::thread;

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

/// Route SIGTERM and SIGINT onto a channel. Once installed, these signals no
/// longer terminate the process on their own.
pub fn install() -> Result<Receiver<i32>> {
    let (tx, rx) = bounded(1);
    let mut signals = Signals::new([SIGTERM, SIGINT]).context("registering signal handlers")?;
    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                tracing::info!(signal, "termination signal received");
                // A full channel means a wake-up is already pending.
                let _ = tx.try_send(signal);
            }
        })
        .context("spawning signal thread")?;
    Ok(rx)
}
