//! Log output and optional OTLP span export.

use anyhow::Result;
use opentelemetry::{KeyValue, global, trace::TracerProvider as _};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    trace::{SdkTracerProvider, Tracer},
};
use std::{sync::OnceLock, time::Duration};
use tracing::{Level, Subscriber, debug};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, registry::LookupSpan,
};
use ulid::Ulid;

static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One line per event, for terminals.
    #[default]
    Compact,
    /// Newline-delimited JSON, for log shippers.
    Json,
}

impl LogFormat {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Logging settings resolved from the command line.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    level: Option<Level>,
    format: LogFormat,
    otlp_endpoint: Option<String>,
}

impl Telemetry {
    #[must_use]
    pub fn new(level: Option<Level>) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_otlp_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.otlp_endpoint = endpoint;
        self
    }

    // RUST_LOG= overrides the verbosity flag
    fn filter(&self) -> Result<EnvFilter> {
        Ok(EnvFilter::builder()
            .with_default_directive(self.level.unwrap_or(Level::ERROR).into())
            .from_env_lossy()
            .add_directive("hyper=error".parse()?)
            .add_directive("tokio=error".parse()?)
            .add_directive("sqlx=warn".parse()?)
            .add_directive("opentelemetry_sdk=warn".parse()?))
    }

    fn subscriber(&self) -> Result<impl Subscriber + Send + Sync + 'static> {
        let otel_layer = match &self.otlp_endpoint {
            Some(endpoint) => {
                Some(tracing_opentelemetry::layer().with_tracer(otlp_tracer(endpoint)?))
            }
            None => None,
        };

        Ok(Registry::default()
            .with(fmt_layer::<Registry>(self.format))
            .with(otel_layer)
            .with(self.filter()?))
    }

    /// Install the global subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if the exporter cannot be built or a subscriber is
    /// already installed.
    pub fn init(&self) -> Result<()> {
        tracing::subscriber::set_global_default(self.subscriber()?)?;
        Ok(())
    }
}

fn fmt_layer<S>(format: LogFormat) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer().with_target(false).with_thread_ids(false);
    match format {
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

fn otlp_tracer(endpoint: &str) -> Result<Tracer> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(normalize_endpoint(endpoint))
        .with_timeout(Duration::from_secs(3))
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder_empty()
                .with_attributes([
                    KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                    KeyValue::new("service.instance.id", Ulid::new().to_string()),
                ])
                .build(),
        )
        .build();

    let _ = TRACER_PROVIDER.set(provider.clone());
    global::set_tracer_provider(provider.clone());
    global::set_text_map_propagator(TraceContextPropagator::new());

    Ok(provider.tracer(env!("CARGO_PKG_NAME")))
}

/// Flush and shut down the tracer provider (noop if not initialized)
pub fn shutdown_tracer() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        debug!("shutting down tracer provider");
        let _ = provider.shutdown();
    }
}
