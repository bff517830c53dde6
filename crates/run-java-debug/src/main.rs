//! Launch the JVM, report how it ended, then stay up long enough to fetch the heap dump.
//!
//! Every argument after the program name goes to `java` unchanged. Settings
//! come from `JAVA_DEBUG_*` environment variables (see `launcher::config`).

use launcher::{LaunchCfg, Launcher};
use tracing_subscriber::fmt::SubscriberBuilder;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    SubscriberBuilder::default()
        .with_target(false)
        .with_env_filter(filter)
        .init();

    // Bad settings are logged and replaced by defaults; the launch always happens.
    let cfg = LaunchCfg::from_env();
    let argv: Vec<_> = std::env::args_os().collect();

    let mut stdout = std::io::stdout();
    let session = Launcher::new(cfg).run(argv, &mut stdout, launcher::shutdown::install);
    tracing::info!(
        java_ok = session.outcome.succeeded(),
        wake = ?session.wake,
        "exiting"
    );
}
