use std::sync::Once;
use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

static INIT: Once = Once::new();

/// Install the global tracing subscriber: compact console output filtered by
/// `RUST_LOG`, defaulting to `vitrine=debug,tower_http=debug`.
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_telemetry() {
    INIT.call_once(|| {
        let console_fmt = tracing_subscriber::fmt::layer().event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        );
        let result = tracing_subscriber::registry()
            .with(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "vitrine=debug,tower_http=debug".into()),
            )
            .with(console_fmt)
            .try_init();

        if result.is_ok() {
            tracing::info!("Tracing initialized");
        }
    });
}

pub async fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown");
}
