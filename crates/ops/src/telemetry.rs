use anyhow::Context;
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{RandomIdGenerator, Sampler, TracerProvider as SdkTracerProvider},
    Resource,
};
use std::time::Duration;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::Registry;

/// TracerGuard owns the process-wide tracer provider.
/// Dropping it without calling `shutdown` may lose buffered spans.
pub struct TracerGuard(SdkTracerProvider);

impl TracerGuard {
    /// Flush buffered spans and tear the provider down.
    pub fn shutdown(self) {
        for result in self.0.force_flush() {
            if let Err(err) = result {
                eprintln!("failed to flush tracer spans: {err}");
            }
        }
        _ = self.0.shutdown();
    }
}

fn create_resource(service_name: &str) -> Resource {
    Resource::new(vec![
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ])
}

/// Initialize the process-wide OTLP tracer and return a tracing-subscriber
/// layer which exports spans through it. Call once at startup.
pub fn init_tracer_layer(
    endpoint: &str,
    service_name: &str,
) -> anyhow::Result<(
    OpenTelemetryLayer<Registry, opentelemetry_sdk::trace::Tracer>,
    TracerGuard,
)> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .with_timeout(Duration::from_secs(10))
        .build()
        .context("failed to build OTLP span exporter")?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(create_resource(service_name))
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .build();

    let tracer = tracer_provider.tracer(service_name.to_string());
    global::set_tracer_provider(tracer_provider.clone());

    Ok((
        OpenTelemetryLayer::new(tracer),
        TracerGuard(tracer_provider),
    ))
}

/// new_remote_log_handler returns a log handler that forwards canonical JSON
/// log serializations to a remote collector, plus the forwarding task.
/// Shipping is best-effort: failed posts are dropped after one report.
pub fn new_remote_log_handler(
    endpoint: url::Url,
) -> (
    impl Fn(super::Log) + Send + Sync + 'static,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<super::Log>();

    let forwarder = tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut reported = false;

        while let Some(log) = rx.recv().await {
            let result = client.post(endpoint.clone()).json(&log).send().await;

            match result.and_then(|resp| resp.error_for_status()) {
                Ok(_) => reported = false,
                Err(err) if !reported => {
                    // Report once per outage, not once per log line.
                    eprintln!("failed to ship log to {endpoint}: {err}");
                    reported = true;
                }
                Err(_) => (),
            }
        }
    });

    let handler = move |log: super::Log| {
        _ = tx.send(log); // Best-effort.
    };

    (handler, forwarder)
}
