//! Debug launcher for a JVM that is expected to die of an out-of-memory error.
//!
//! One run moves forward through three phases and never back:
//! - Launching: announce the invocation.
//! - Waiting: run the Java binary to completion with the forwarded arguments.
//! - Idling: report the outcome, optionally answer health probes, then stay
//!   resident so the heap dump can be copied out of the container.
//!
//! Idling is reached whatever happened to the child. Failures along the way are
//! logged, never propagated.

pub mod config;
pub mod exec;
pub mod health;
pub mod keepalive;
pub mod report;
pub mod shutdown;

use std::ffi::OsString;
use std::fmt;
use std::io::Write;
use std::net::SocketAddr;

use crossbeam_channel::Receiver;

pub use config::{ConfigError, LaunchCfg};
pub use exec::{CaptureMode, LaunchError, RunOutcome};
pub use keepalive::Wake;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Launching,
    Waiting,
    Idling,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Launching => "launching",
            Phase::Waiting => "waiting",
            Phase::Idling => "idling",
        })
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct Session {
    pub outcome: RunOutcome,
    /// Where health probes were answered, if the listener came up.
    pub health_addr: Option<SocketAddr>,
    pub wake: Wake,
}

pub struct Launcher {
    cfg: LaunchCfg,
}

impl Launcher {
    pub fn new(cfg: LaunchCfg) -> Self {
        Self { cfg }
    }

    /// Run the full sequence for the process argv (program name included).
    ///
    /// `shutdown` is called once Idling begins; if it fails the idle wait runs
    /// to its full length.
    pub fn run<W, F>(&self, argv: Vec<OsString>, out: &mut W, shutdown: F) -> Session
    where
        W: Write,
        F: FnOnce() -> anyhow::Result<Receiver<i32>>,
    {
        let cfg = &self.cfg;

        tracing::info!(
            phase = %Phase::Launching,
            java = %cfg.java_bin.display(),
            capture = %cfg.capture
        );
        if let Err(err) = report::announce(out, &argv, cfg.echo_args) {
            tracing::warn!(%err, "failed to write startup line");
        }

        let args = exec::forwarded_args(argv);
        tracing::info!(phase = %Phase::Waiting, args = args.len());
        let outcome = exec::execute(cfg, &args);
        match &outcome.error {
            Some(err) => tracing::warn!(%err, "java did not finish cleanly"),
            None => tracing::info!("java exited successfully"),
        }
        if let Err(err) = report::write_outcome(out, &outcome) {
            tracing::warn!(%err, "failed to write java outcome");
        }

        tracing::info!(phase = %Phase::Idling, keep_alive_secs = cfg.keep_alive.as_secs());
        // The JVM served this port while it ran, so the listener only starts now.
        let responder = cfg.health_addr.and_then(start_health);
        let health_addr = responder.as_ref().map(health::HealthHandle::local_addr);

        let signals = shutdown().unwrap_or_else(|err| {
            tracing::error!("signal handling unavailable, idling uninterruptibly: {err:#}");
            crossbeam_channel::never()
        });

        if let Err(err) = report::dump_notice(out, &cfg.dump_path, cfg.keep_alive.as_secs()) {
            tracing::warn!(%err, "failed to write dump notice");
        }
        let wake = keepalive::wait(cfg.keep_alive, &signals);
        match wake {
            Wake::Elapsed => tracing::info!("keep-alive elapsed"),
            Wake::Signal(signal) => tracing::info!(signal, "keep-alive interrupted"),
        }
        drop(responder);

        Session {
            outcome,
            health_addr,
            wake,
        }
    }
}

fn start_health(addr: SocketAddr) -> Option<health::HealthHandle> {
    match health::HealthServer::bind(addr).and_then(health::HealthServer::spawn) {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::error!(%err, "health endpoints unavailable");
            None
        }
    }
}
