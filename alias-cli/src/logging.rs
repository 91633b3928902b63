// alias-cli/src/logging.rs
use alias_sync::Config;
use tracing_subscriber::EnvFilter;

const DEFAULT_LEVEL: &str = "warn";

/// Install the stderr subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: Option<&Config>) {
    let level = config
        .and_then(|c| c.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // A second call (e.g. setup followed by a command in tests) is a no-op
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
