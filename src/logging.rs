use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. `--debug` wins over `RUST_LOG`, which wins over `LOG_LEVEL`.
pub fn init(debug: bool, log_level: &str) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::try_new(log_level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"))
        })
    };

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
