use std::ffi::OsString;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::bounded;
use launcher::{CaptureMode, LaunchCfg, LaunchError, Launcher, Wake};

fn argv(args: &[&str]) -> Vec<OsString> {
    std::iter::once("run-java-debug")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

fn quiet_cfg(java_bin: PathBuf) -> LaunchCfg {
    LaunchCfg {
        java_bin,
        health_addr: None,
        keep_alive: Duration::ZERO,
        ..LaunchCfg::default()
    }
}

fn no_signals() -> anyhow::Result<crossbeam_channel::Receiver<i32>> {
    Ok(crossbeam_channel::never())
}

#[test]
fn missing_java_still_reaches_keep_alive() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("openjdk-15/bin/java");
    let launcher = Launcher::new(quiet_cfg(missing));
    let mut out = Vec::new();

    let session = launcher.run(argv(&["-jar", "app.jar"]), &mut out, no_signals);

    assert!(matches!(session.outcome.error, Some(LaunchError::Spawn { .. })));
    assert_eq!(session.wake, Wake::Elapsed);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("\"-jar\", \"app.jar\""), "{text}");
    assert!(text.contains("Java application exit: err=failed to start"), "{text}");
    assert!(text.contains("collect the output: /oom-dump.hprof"), "{text}");
}

#[test]
fn no_arguments_behaves_the_same() {
    let dir = tempfile::tempdir().unwrap();
    let launcher = Launcher::new(quiet_cfg(dir.path().join("java")));
    let mut out = Vec::new();

    let session = launcher.run(argv(&[]), &mut out, no_signals);

    assert!(matches!(session.outcome.error, Some(LaunchError::Spawn { .. })));
    assert_eq!(session.wake, Wake::Elapsed);
}

#[test]
fn failing_signal_setup_does_not_skip_idle() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = LaunchCfg {
        keep_alive: Duration::from_millis(100),
        ..quiet_cfg(dir.path().join("java"))
    };
    let started = Instant::now();
    let session = Launcher::new(cfg).run(argv(&[]), &mut Vec::new(), || {
        anyhow::bail!("no signals in this sandbox")
    });
    assert_eq!(session.wake, Wake::Elapsed);
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[cfg(unix)]
#[test]
fn non_zero_exit_reaches_keep_alive_with_output() {
    let cfg = LaunchCfg {
        capture: CaptureMode::Stdout,
        ..quiet_cfg(PathBuf::from("/bin/sh"))
    };
    let mut out = Vec::new();
    let session = Launcher::new(cfg).run(
        argv(&["-c", "echo 'java.lang.OutOfMemoryError: Java heap space'; exit 1"]),
        &mut out,
        no_signals,
    );

    assert!(matches!(session.outcome.error, Some(LaunchError::Exit(_))));
    assert_eq!(session.wake, Wake::Elapsed);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("java.lang.OutOfMemoryError: Java heap space\n--- end stdout ---"));
}

fn free_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn get(url: &str) -> Result<(u16, String), ureq::Error> {
    let resp = ureq::get(url).call()?;
    let status = resp.status();
    Ok((status, resp.into_string().unwrap()))
}

#[test]
fn health_endpoints_answer_while_idling() {
    let dir = tempfile::tempdir().unwrap();
    let addr = free_port();
    let cfg = LaunchCfg {
        health_addr: Some(addr),
        keep_alive: Duration::from_secs(60),
        ..quiet_cfg(dir.path().join("java"))
    };
    let (tx, rx) = bounded(1);

    let prober = thread::spawn(move || {
        let base = format!("http://{addr}");
        let deadline = Instant::now() + Duration::from_secs(10);
        while get(&format!("{base}/isalive")).is_err() {
            assert!(Instant::now() < deadline, "health listener never came up");
            thread::sleep(Duration::from_millis(20));
        }
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(get(&format!("{base}/isready")).unwrap());
            seen.push(get(&format!("{base}/isalive")).unwrap());
        }
        let missing = match ureq::get(&format!("{base}/metrics")).call() {
            Err(ureq::Error::Status(code, _)) => code,
            other => panic!("expected 404, got {other:?}"),
        };
        tx.send(15).unwrap();
        (seen, missing)
    });

    let session =
        Launcher::new(cfg).run(argv(&["-jar", "app.jar"]), &mut Vec::new(), move || Ok(rx));
    let (seen, missing) = prober.join().unwrap();

    assert_eq!(session.wake, Wake::Signal(15));
    assert_eq!(session.health_addr, Some(addr));
    for pair in seen.chunks(2) {
        assert_eq!(pair[0], (200, "READY".to_string()));
        assert_eq!(pair[1], (200, "ALIVE".to_string()));
    }
    assert_eq!(missing, 404);
}

#[test]
fn busy_health_port_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let squatter = TcpListener::bind("127.0.0.1:0").unwrap();
    let cfg = LaunchCfg {
        health_addr: Some(squatter.local_addr().unwrap()),
        ..quiet_cfg(dir.path().join("java"))
    };
    let session = Launcher::new(cfg).run(argv(&[]), &mut Vec::new(), no_signals);
    assert_eq!(session.health_addr, None);
    assert_eq!(session.wake, Wake::Elapsed);
}

#[cfg(unix)]
#[test]
fn unparsable_settings_still_launch_and_idle() {
    let cfg = LaunchCfg::from_lookup(|key| match key {
        "JAVA_DEBUG_JAVA_BIN" => Some("/bin/sh".to_string()),
        "JAVA_DEBUG_CAPTURE" => Some("everything".to_string()),
        "JAVA_DEBUG_HEALTH_ADDR" => Some("off".to_string()),
        "JAVA_DEBUG_KEEP_ALIVE_SECS" => Some("an hour".to_string()),
        _ => None,
    });
    assert_eq!(cfg.keep_alive, Duration::from_secs(3600));
    assert_eq!(cfg.capture, CaptureMode::Stdout);

    // Signal straight away so the hour-long wait ends once reached.
    let (tx, rx) = bounded(1);
    tx.send(15).unwrap();
    let session =
        Launcher::new(cfg).run(argv(&["-c", "printf launched"]), &mut Vec::new(), move || Ok(rx));

    assert!(session.outcome.succeeded());
    assert_eq!(session.outcome.stdout.as_deref(), Some(&b"launched"[..]));
    assert_eq!(session.wake, Wake::Signal(15));
}
