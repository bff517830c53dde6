//! Running the Java process.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Output, Stdio};
use std::str::FromStr;

use crate::config::LaunchCfg;

/// Which child streams are piped back to the launcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CaptureMode {
    /// Child writes straight to the launcher's stdout/stderr.
    Inherit,
    /// Capture stdout; stderr passes through.
    #[default]
    Stdout,
    /// Capture stdout and stderr as separate buffers.
    All,
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "inherit" => Ok(Self::Inherit),
            "stdout" => Ok(Self::Stdout),
            "all" => Ok(Self::All),
            other => Err(format!("unknown capture mode `{other}` (none, stdout, all)")),
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inherit => "none",
            Self::Stdout => "stdout",
            Self::All => "all",
        })
    }
}

/// Spawn failure and unsuccessful exit are reported the same way: as an error value.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("failed to start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("java exited unsuccessfully: {0}")]
    Exit(ExitStatus),
}

/// What one run of the child left behind.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub error: Option<LaunchError>,
    pub stdout: Option<Vec<u8>>,
    pub stderr: Option<Vec<u8>>,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Drop the program name from a process argv.
pub fn forwarded_args<I>(argv: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    argv.into_iter().skip(1).collect()
}

/// Build the child command. Arguments are passed through untouched.
pub fn command<I, S>(cfg: &LaunchCfg, args: I) -> Command
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(&cfg.java_bin);
    cmd.args(args).stdin(Stdio::null());
    match cfg.capture {
        CaptureMode::Inherit => {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        CaptureMode::Stdout => {
            cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
        }
        CaptureMode::All => {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
    }
    cmd
}

/// Run the child to completion. Blocks for as long as the child lives.
pub fn execute<I, S>(cfg: &LaunchCfg, args: I) -> RunOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = command(cfg, args);
    let spawned = match cfg.capture {
        CaptureMode::Inherit => cmd.status().map(|status| Output {
            status,
            stdout: Vec::new(),
            stderr: Vec::new(),
        }),
        CaptureMode::Stdout | CaptureMode::All => cmd.output(),
    };

    let output = match spawned {
        Ok(output) => output,
        Err(source) => {
            return RunOutcome {
                error: Some(LaunchError::Spawn {
                    program: cfg.java_bin.clone(),
                    source,
                }),
                ..RunOutcome::default()
            };
        }
    };

    let error = (!output.status.success()).then_some(LaunchError::Exit(output.status));
    let (stdout, stderr) = match cfg.capture {
        CaptureMode::Inherit => (None, None),
        CaptureMode::Stdout => (Some(output.stdout), None),
        CaptureMode::All => (Some(output.stdout), Some(output.stderr)),
    };
    RunOutcome {
        error,
        stdout,
        stderr,
    }
}
