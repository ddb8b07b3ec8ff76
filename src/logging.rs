use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Initializes tracing for an embedding process.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies
/// globally. Safe to call more than once: later calls are no-ops instead of
/// panicking, so test binaries can init freely.
pub fn init(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.clone()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    let result = if settings.format == "pretty" {
        subscriber.pretty().try_init()
    } else {
        subscriber.try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
