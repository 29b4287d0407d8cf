use std::str::FromStr;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. A bare level such as `debug` also quiets the
/// HTTP stack; directive strings containing `,` or `=` are used unchanged.
pub fn setup_logging(log_level: &str, json_format: bool) {
    let normalized = log_level.trim();
    let filter_spec = if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("{},hyper=info,tower_http=info,axum=info", normalized)
    };
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).init();
    }

    tracing::info!(
        filter=%filter_spec,
        format=if json_format { "json" } else { "compact" },
        "Logging initialized"
    );
}
