use anyhow::Context;

use tracing::{subscriber::set_global_default, Subscriber};

use tracing_log::LogTracer;

use tracing_subscriber::fmt::{self, format::FmtSpan, MakeWriter};
use tracing_subscriber::EnvFilter;

use crate::settings::{LogFormat, LogSettings};

/// Build the service's subscriber, writing to `sink`.
/// A non-empty `rust_log` (the `RUST_LOG` variable) overrides the configured filter
pub fn create_subscriber<Sink>(
    settings: &LogSettings,
    rust_log: Option<String>,
    sink: Sink,
) -> anyhow::Result<Box<dyn Subscriber + Send + Sync>>
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let directives = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .unwrap_or_else(|| settings.filter.clone());
    let env_filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter `{}`", directives))?;

    let builder = fmt::fmt()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(sink);

    Ok(match settings.format {
        LogFormat::Pretty => Box::new(builder.finish()),
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
    })
}

/// Install the subscriber globally, routing `log` records through it as well
pub fn set_subscriber(subscriber: impl Subscriber + Send + Sync) -> anyhow::Result<()> {
    LogTracer::init().context("Failed to initalize logging")?;

    set_global_default(subscriber).context("Failed to set global subscriber")
}
