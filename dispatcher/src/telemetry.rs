//! Logging and optional `OpenTelemetry` trace export.
//!
//! [`Telemetry`] installs a `tracing` subscriber with an [`EnvFilter`] and a
//! console formatter. With the `telemetry` feature and any
//! `OTEL_EXPORTER_OTLP_*` variable set, spans (including the per-request
//! spans of traced RPC handles) are also exported over OTLP.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "telemetry")]
use otlp::OtlpProtocol;

/// Service identity and log filter for the subscriber.
///
/// Name and version can be overridden via `OTEL_SERVICE_NAME` and
/// `OTEL_SERVICE_VERSION`.
#[derive(Debug, Default)]
pub struct Telemetry {
    #[cfg_attr(not(feature = "telemetry"), allow(dead_code))]
    name: Option<String>,
    #[cfg_attr(not(feature = "telemetry"), allow(dead_code))]
    version: Option<String>,
    log_level: Option<String>,
}

impl Telemetry {
    /// Creates a new, empty [`Telemetry`] instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the service version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the log level filter used when `RUST_LOG` is not set.
    ///
    /// Accepts any valid [`EnvFilter`] directive string (e.g. `"debug"`,
    /// `"faucet_dispatcher=debug,alloy_transport_http=trace"`).
    #[must_use]
    pub fn with_log_level(mut self, level: Option<impl Into<String>>) -> Self {
        self.log_level = level.map(Into::into);
        self
    }

    fn filter(&self) -> EnvFilter {
        let fallback = self.log_level.as_deref().unwrap_or("info");
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into())
    }

    /// Installs the global subscriber.
    ///
    /// Returns a [`TelemetryGuard`] that flushes exporters on drop.
    pub fn register(self) -> TelemetryGuard {
        #[cfg(feature = "telemetry")]
        {
            let protocol = otlp::detect_protocol();
            let tracer_provider = protocol.and_then(|p| self.init_tracer(p));
            let otel_layer = tracer_provider.as_ref().map(|tp| {
                use opentelemetry::trace::TracerProvider;
                tracing_opentelemetry::OpenTelemetryLayer::new(tp.tracer("faucet-dispatcher"))
            });

            tracing_subscriber::registry()
                .with(self.filter())
                .with(tracing_subscriber::fmt::layer())
                .with(otel_layer)
                .init();

            if tracer_provider.is_some() {
                tracing::info!("OpenTelemetry exporter registered");
            } else {
                tracing::debug!("OpenTelemetry is not configured, console logging only");
            }
            TelemetryGuard { tracer_provider }
        }

        #[cfg(not(feature = "telemetry"))]
        {
            tracing_subscriber::registry()
                .with(self.filter())
                .with(tracing_subscriber::fmt::layer())
                .init();
            TelemetryGuard {}
        }
    }

    #[cfg(feature = "telemetry")]
    fn init_tracer(
        &self,
        protocol: OtlpProtocol,
    ) -> Option<opentelemetry_sdk::trace::SdkTracerProvider> {
        use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};

        let exporter = match protocol {
            OtlpProtocol::Http => opentelemetry_otlp::SpanExporter::builder()
                .with_http()
                .build(),
            OtlpProtocol::Grpc => opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .build(),
        };
        let exporter = exporter
            .inspect_err(|err| tracing::error!(?err, "failed to build OTLP span exporter"))
            .ok()?;

        Some(
            SdkTracerProvider::builder()
                .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(otlp::resource(self.name.as_deref(), self.version.as_deref()))
                .with_batch_exporter(exporter)
                .build(),
        )
    }
}

/// Owns the tracer provider; performs graceful shutdown on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        if let Some(ref tp) = self.tracer_provider
            && let Err(err) = tp.shutdown()
        {
            tracing::error!(?err, "tracer provider shutdown error");
        }
    }
}

#[cfg(feature = "telemetry")]
mod otlp {
    use std::env;

    use opentelemetry::KeyValue;
    use opentelemetry_sdk::Resource;
    use opentelemetry_semantic_conventions::{SCHEMA_URL, attribute::SERVICE_VERSION};

    /// Supported OTLP transport protocols.
    #[derive(Debug, Clone, Copy)]
    pub(super) enum OtlpProtocol {
        Http,
        Grpc,
    }

    /// Detects OTLP protocol from environment. Returns `None` if OTEL is not configured.
    pub(super) fn detect_protocol() -> Option<OtlpProtocol> {
        let is_enabled = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
            || env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
            || env::var("OTEL_EXPORTER_OTLP_PROTOCOL").is_ok();
        is_enabled.then(|| match env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
            Ok("grpc") => OtlpProtocol::Grpc,
            _ => OtlpProtocol::Http,
        })
    }

    fn env_or(key: &str, fallback: Option<&str>) -> Option<String> {
        env::var(key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| fallback.map(ToOwned::to_owned))
    }

    pub(super) fn resource(name: Option<&str>, version: Option<&str>) -> Resource {
        let mut builder = Resource::builder();
        if let Some(name) = env_or("OTEL_SERVICE_NAME", name) {
            builder = builder.with_service_name(name);
        }
        if let Some(version) = env_or("OTEL_SERVICE_VERSION", version) {
            builder =
                builder.with_schema_url([KeyValue::new(SERVICE_VERSION, version)], SCHEMA_URL);
        }
        builder.build()
    }
}
