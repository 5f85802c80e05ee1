use std::borrow::Cow;
use std::time::Instant;

use sentry::integrations::tracing::EventFilter;
use sentry::{ClientInitGuard, ClientOptions};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::prelude::*;

/// Target of the prediction fallback warnings.
const FALLBACK_TARGET: &str = "streaming_mf::model";

/// Installs the console output and, when a DSN is given, the Sentry reporting.
///
/// Console verbosity is read from `STREAMING_MF_LOG`, and Sentry verbosity from `STREAMING_MF_SENTRY_LOG`.
pub fn init(sentry_dsn: Option<String>, traces_sample_rate: f32) -> Result<ClientInitGuard> {
    let options = ClientOptions {
        release: Some(Cow::Borrowed(env!("CARGO_PKG_VERSION"))),
        traces_sample_rate,
        ..Default::default()
    };
    let guard = sentry::init((sentry_dsn, options));

    tracing_subscriber::Registry::default()
        .with(
            sentry::integrations::tracing::layer()
                .event_filter(|metadata| sentry_event_filter(metadata.level(), metadata.target()))
                .span_filter(|metadata| metadata.level() <= &Level::DEBUG)
                .with_filter(env_filter("STREAMING_MF_SENTRY_LOG", "streaming_mf=debug")?),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr)
                .with_filter(env_filter("STREAMING_MF_LOG", "streaming_mf=info")?),
        )
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(guard)
}

fn env_filter(variable: &str, default: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_env(variable)
        .or_else(|_| EnvFilter::try_new(default))
        .with_context(|| format!("invalid log filter in `{}`", variable))
}

/// Errors and warnings become Sentry events, except for the prediction fallbacks.
fn sentry_event_filter(level: &Level, target: &str) -> EventFilter {
    match *level {
        Level::ERROR => EventFilter::Event,
        Level::WARN if target.starts_with(FALLBACK_TARGET) => EventFilter::Breadcrumb,
        Level::WARN => EventFilter::Event,
        _ => EventFilter::Breadcrumb,
    }
}

pub fn format_duration(duration: StdDuration) -> String {
    humantime::format_duration(duration).to_string()
}

pub fn format_elapsed(instant: Instant) -> String {
    format_duration(instant.elapsed())
}
