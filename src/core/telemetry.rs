use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

/// Installs the global subscriber. `RUST_LOG` wins over `LANEXAM_LOG_LEVEL`.
pub(crate) fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let telemetry = settings.telemetry();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&telemetry.log_level)));

    let events = fmt::layer().with_target(false).with_span_events(FmtSpan::CLOSE);
    let registry = tracing_subscriber::registry().with(filter);

    if telemetry.json {
        registry.with(events.json().flatten_event(true)).try_init()?;
    } else {
        registry.with(events).try_init()?;
    }

    Ok(())
}

// sqlx logs every statement at info.
fn default_directives(level: &str) -> String {
    format!("{level},sqlx=warn,tower_http=info")
}
