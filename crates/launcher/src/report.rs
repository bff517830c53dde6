//! Human-readable diagnostics on stdout.
//!
//! Captured child output is written as raw bytes between marker lines so the
//! operator sees exactly what the JVM printed before it died.

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::Path;

use crate::exec::RunOutcome;

pub fn announce<W: Write>(out: &mut W, argv: &[OsString], echo_args: bool) -> io::Result<()> {
    if echo_args {
        writeln!(out, "Starting up JAVA project, arguments: {argv:?}")?;
    } else {
        writeln!(out, "Starting up JAVA project")?;
    }
    out.flush()
}

pub fn write_outcome<W: Write>(out: &mut W, outcome: &RunOutcome) -> io::Result<()> {
    match &outcome.error {
        Some(err) => writeln!(out, "Java application exit: err={err}")?,
        None => writeln!(out, "Java application exit: ok")?,
    }
    if let Some(bytes) = &outcome.stdout {
        write_stream(out, "stdout", bytes)?;
    }
    if let Some(bytes) = &outcome.stderr {
        write_stream(out, "stderr", bytes)?;
    }
    out.flush()
}

fn write_stream<W: Write>(out: &mut W, name: &str, bytes: &[u8]) -> io::Result<()> {
    writeln!(out, "--- {name} ({} bytes) ---", bytes.len())?;
    out.write_all(bytes)?;
    if !bytes.ends_with(b"\n") && !bytes.is_empty() {
        out.write_all(b"\n")?;
    }
    writeln!(out, "--- end {name} ---")
}

pub fn dump_notice<W: Write>(
    out: &mut W,
    dump_path: &Path,
    keep_alive_secs: u64,
) -> io::Result<()> {
    writeln!(
        out,
        "Sleeping for {keep_alive_secs}s to allow you to collect the output: {}",
        dump_path.display()
    )?;
    out.flush()?;

    // Metadata only: the dump is never opened.
    match std::fs::metadata(dump_path) {
        Ok(meta) => tracing::info!(
            path = %dump_path.display(),
            bytes = meta.len(),
            "heap dump present"
        ),
        Err(err) => tracing::info!(path = %dump_path.display(), %err, "no heap dump found"),
    }
    Ok(())
}
