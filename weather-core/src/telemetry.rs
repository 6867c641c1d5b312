//! Logging and distributed tracing setup.
//!
//! [`Telemetry::init`] installs the process `tracing` subscriber (env filter
//! plus a compact console layer) and an OpenTelemetry pipeline: always-on
//! sampling, a resource carrying `service.name` and, when a collector endpoint
//! is given, a batched OTLP span exporter. Without an exporter spans still get
//! real trace ids, so inbound trace context keeps flowing to outbound calls.
//! The returned [`Telemetry`] owns the tracer provider and must be shut down
//! explicitly during graceful shutdown.

use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    trace::{Sampler, SdkTracerProvider},
};
use std::time::Duration;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::propagation::TracePropagation;

/// OTLP/gRPC collector used when none is configured.
pub const DEFAULT_COLLECTOR_ENDPOINT: &str = "http://otel-collector:4317";

/// Upper bound on flushing pending spans at shutdown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid telemetry configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid log filter '{filter}': {source}")]
    Filter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("Failed to build OTLP span exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("Tracing subscriber error: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Logical service name, exported as the `service.name` resource attribute.
    pub service_name: String,
    /// OTLP collector endpoint. `None` disables span export; propagation stays on.
    pub collector_endpoint: Option<String>,
    /// Log filter directives (`RUST_LOG` syntax). Falls back to `RUST_LOG`, then `info`.
    pub log_filter: Option<String>,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            collector_endpoint: Some(DEFAULT_COLLECTOR_ENDPOINT.to_owned()),
            log_filter: None,
        }
    }
}

/// Process-wide telemetry handle.
#[must_use = "Dropping this handle without calling `shutdown` may lose buffered spans."]
#[derive(Debug)]
pub struct Telemetry {
    provider: SdkTracerProvider,
    propagation: TracePropagation,
}

impl Telemetry {
    /// Install the subscriber and the tracer provider. Call once, from inside
    /// the Tokio runtime.
    pub fn init(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        if config.service_name.trim().is_empty() {
            return Err(TelemetryError::InvalidConfiguration(
                "service_name cannot be empty".into(),
            ));
        }

        let env_filter = build_env_filter(config.log_filter.as_deref())?;

        let mut layers = Vec::new();
        layers.push(tracing_subscriber::fmt::layer().compact().with_ansi(true).boxed());

        let provider =
            build_provider(&config.service_name, config.collector_endpoint.as_deref())?;
        let tracer = provider.tracer(config.service_name.clone());
        layers.push(tracing_opentelemetry::layer().with_tracer(tracer).boxed());

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;

        match config.collector_endpoint.as_deref() {
            Some(endpoint) => {
                tracing::info!(service = %config.service_name, %endpoint, "span export enabled")
            }
            None => tracing::info!(service = %config.service_name, "span export disabled"),
        }

        Ok(Self { provider, propagation: TracePropagation::new() })
    }

    /// Propagation handle to pass into router state and partner clients.
    pub fn propagation(&self) -> TracePropagation {
        self.propagation.clone()
    }

    /// Flush and close the exporter within `timeout`. Failures are logged,
    /// never retried.
    pub fn shutdown(self, timeout: Duration) {
        match self.provider.shutdown_with_timeout(timeout) {
            Ok(()) => tracing::info!("tracer provider shut down"),
            Err(e) => tracing::warn!(error = %e, "failed to shut down tracer provider"),
        }
    }
}

fn build_resource(service_name: &str) -> Resource {
    Resource::builder_empty()
        .with_attributes([KeyValue::new("service.name", service_name.to_owned())])
        .build()
}

fn build_provider(
    service_name: &str,
    endpoint: Option<&str>,
) -> Result<SdkTracerProvider, TelemetryError> {
    let builder = SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(build_resource(service_name));

    let builder = match endpoint {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()?;
            builder.with_batch_exporter(exporter)
        }
        None => builder,
    };

    Ok(builder.build())
}

fn build_env_filter(filter: Option<&str>) -> Result<EnvFilter, TelemetryError> {
    let builder = EnvFilter::builder().with_default_directive(LevelFilter::INFO.into());
    match filter {
        Some(filter) => builder.parse(filter).map_err(|source| TelemetryError::Filter {
            filter: filter.to_owned(),
            source,
        }),
        None => Ok(builder.from_env_lossy()),
    }
}
