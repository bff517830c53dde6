//! Launch configuration.
//!
//! The compiled-in values match the container image the launcher ships in.
//! Paths, capture mode, health listener and argv echo can be overridden
//! through `JAVA_DEBUG_*` environment variables; the keep-alive duration
//! cannot. There are no command-line flags because argv belongs to the Java
//! process. A bad value never stops the launch: it is logged and the default
//! stays in place.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::exec::CaptureMode;

pub const DEFAULT_JAVA_BIN: &str = "/usr/local/openjdk-15/bin/java";
pub const DEFAULT_DUMP_PATH: &str = "/oom-dump.hprof";
pub const DEFAULT_HEALTH_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60 * 60);

pub const ENV_JAVA_BIN: &str = "JAVA_DEBUG_JAVA_BIN";
pub const ENV_DUMP_PATH: &str = "JAVA_DEBUG_DUMP_PATH";
pub const ENV_CAPTURE: &str = "JAVA_DEBUG_CAPTURE";
pub const ENV_HEALTH_ADDR: &str = "JAVA_DEBUG_HEALTH_ADDR";
pub const ENV_ECHO_ARGS: &str = "JAVA_DEBUG_ECHO_ARGS";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the launcher needs for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchCfg {
    /// Java runtime binary the forwarded arguments are handed to.
    pub java_bin: PathBuf,
    /// Where the JVM is expected to leave its heap dump (`-XX:HeapDumpPath`).
    pub dump_path: PathBuf,
    pub capture: CaptureMode,
    /// `None` disables the liveness/readiness responder.
    pub health_addr: Option<SocketAddr>,
    /// Fixed at one hour outside tests.
    pub keep_alive: Duration,
    /// Echo the full process argv in the startup line.
    pub echo_args: bool,
}

impl Default for LaunchCfg {
    fn default() -> Self {
        Self {
            java_bin: PathBuf::from(DEFAULT_JAVA_BIN),
            dump_path: PathBuf::from(DEFAULT_DUMP_PATH),
            capture: CaptureMode::Stdout,
            health_addr: Some(SocketAddr::from(([0, 0, 0, 0], 8080))),
            keep_alive: DEFAULT_KEEP_ALIVE,
            echo_args: true,
        }
    }
}

impl LaunchCfg {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset and empty values keep the
    /// default; so does any value that fails to parse, after it is logged.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get(ENV_JAVA_BIN) {
            cfg.java_bin = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_DUMP_PATH) {
            cfg.dump_path = PathBuf::from(v);
        }
        if let Some(v) = get(ENV_CAPTURE) {
            let parsed = v
                .parse()
                .map_err(|reason: String| invalid(ENV_CAPTURE, &v, reason));
            if let Some(capture) = keep_default_on_error(parsed) {
                cfg.capture = capture;
            }
        }
        if let Some(v) = get(ENV_HEALTH_ADDR) {
            if let Some(addr) = keep_default_on_error(parse_health_addr(&v)) {
                cfg.health_addr = addr;
            }
        }
        if let Some(v) = get(ENV_ECHO_ARGS) {
            let parsed = parse_bool(&v).ok_or_else(|| {
                invalid(ENV_ECHO_ARGS, &v, "expected true/false, 1/0 or yes/no".to_string())
            });
            if let Some(echo) = keep_default_on_error(parsed) {
                cfg.echo_args = echo;
            }
        }
        cfg
    }
}

fn keep_default_on_error<T>(parsed: Result<T, ConfigError>) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::error!(%err, "ignoring setting, using default");
            None
        }
    }
}

fn parse_health_addr(value: &str) -> Result<Option<SocketAddr>, ConfigError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("off") {
        return Ok(None);
    }
    trimmed
        .parse()
        .map(Some)
        .map_err(|e: std::net::AddrParseError| invalid(ENV_HEALTH_ADDR, value, e.to_string()))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn invalid(key: &'static str, value: &str, reason: String) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason,
    }
}
