//! Diagnostics setup.
//!
//! Hosts usually capture a plugin's stderr, so that is where the fmt subscriber
//! writes. If the host process already installed a subscriber, it is left alone.

/// Environment variable selecting the maximum log level (`error` .. `trace`).
pub const LOG_LEVEL_ENV: &str = "TUTTI_DSSI_LOG";

pub fn init() {
    let level = level_from(std::env::var(LOG_LEVEL_ENV).ok().as_deref());

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn level_from(value: Option<&str>) -> tracing::Level {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(tracing::Level::INFO)
}
