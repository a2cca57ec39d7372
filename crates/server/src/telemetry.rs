//! Error reporting and structured logging setup.
//!
//! Sentry has to be initialised before the subscriber is installed so the
//! `sentry_tracing` layer finds a live client.

use std::borrow::Cow;

use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tracing::{Level, Metadata};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, ServerConfig};

const DEFAULT_DIRECTIVES: &str = "plated_server=info,tower_http=debug";

/// Keeps the Sentry client flushing until dropped.
#[must_use = "dropping the guard stops error reporting"]
pub struct Telemetry {
    _sentry: Option<sentry::ClientInitGuard>,
}

/// Start Sentry (when a DSN is configured) and install the global subscriber.
pub fn init(config: &ServerConfig) -> Telemetry {
    let sentry = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: config.sentry_environment.clone().map(Cow::Owned),
                attach_stacktrace: true,
                ..Default::default()
            },
        ))
    });

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let sentry_layer = sentry_tracing::layer().event_filter(sentry_filter);
    let registry = tracing_subscriber::registry().with(filter).with(sentry_layer);

    match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    if sentry.is_some() {
        tracing::info!(environment = ?config.sentry_environment, "Sentry enabled");
    }

    Telemetry { _sentry: sentry }
}

/// Warnings and errors become Sentry events, info and debug become breadcrumbs.
fn sentry_filter(metadata: &Metadata<'_>) -> EventFilter {
    match *metadata.level() {
        Level::ERROR | Level::WARN => EventFilter::Event,
        Level::INFO | Level::DEBUG => EventFilter::Breadcrumb,
        Level::TRACE => EventFilter::Ignore,
    }
}
