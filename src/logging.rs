use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Install a console subscriber for the process.
///
/// `RUST_LOG` takes precedence over `default_filter`. Fails if a global
/// subscriber has already been installed.
pub fn init(default_filter: &str) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .try_init()
}

/// Filter directives for a `-d` count: 0 keeps `configured`, 1 is debug,
/// anything above is trace
pub fn filter_for_verbosity(configured: &str, debug: u8) -> String {
    match debug {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}
