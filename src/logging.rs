use tracing_subscriber::EnvFilter;

/// Environment variable checked before `RUST_LOG`.
const LOG_ENV: &str = "WHENCE_LOG";

/// Log to stderr, keeping stdout for command output.
///
/// `WHENCE_LOG` (or `RUST_LOG`) takes precedence over `verbosity`, which
/// raises the default `warn` level to `info` and then `debug`.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    // A subscriber may already be installed, e.g. by a test harness.
    _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).try_init();
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
