//! The terminal idle phase.

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

/// Why the keep-alive ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wake {
    Elapsed,
    Signal(i32),
}

/// Block for `duration` or until a signal number arrives on `shutdown`.
///
/// A disconnected channel does not end the wait early; the rest of the
/// duration is slept out.
pub fn wait(duration: Duration, shutdown: &Receiver<i32>) -> Wake {
    let deadline = Instant::now() + duration;
    match shutdown.recv_timeout(duration) {
        Ok(signal) => Wake::Signal(signal),
        Err(RecvTimeoutError::Timeout) => Wake::Elapsed,
        Err(RecvTimeoutError::Disconnected) => {
            std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
            Wake::Elapsed
        }
    }
}
