//! Tracing subscriber and optional OTLP export.

use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::{runtime, trace::TracerProvider};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log filter variable; defaults to `info`.
pub const ENV_LOG: &str = "RUST_LOG";

/// Spans are exported over OTLP/gRPC only when this is set.
pub const ENV_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

const TRACER_NAME: &str = "ditto-edge";

/// Keeps the span exporter alive until [`Telemetry::shutdown`].
pub struct Telemetry {
    provider: Option<TracerProvider>,
}

impl Telemetry {
    /// Installs the global subscriber. Logs go to stderr so command output on
    /// stdout stays machine-readable.
    pub fn init(json: bool) -> anyhow::Result<Self> {
        let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("info"));

        let provider = match std::env::var_os(ENV_OTLP_ENDPOINT) {
            Some(_) => Some(otlp_provider()?),
            None => None,
        };

        let (json_layer, plain_layer) = if json {
            (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
        } else {
            (None, Some(fmt::layer().with_writer(std::io::stderr)))
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .with(plain_layer)
            .with(
                provider
                    .as_ref()
                    .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(TRACER_NAME))),
            )
            .try_init()
            .context("failed to install tracing subscriber")?;

        Ok(Self { provider })
    }

    /// Flushes pending spans.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                eprintln!("failed to flush spans: {e}");
            }
        }
    }
}

fn otlp_provider() -> anyhow::Result<TracerProvider> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .build()
        .context("failed to build OTLP span exporter")?;
    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .build())
}
