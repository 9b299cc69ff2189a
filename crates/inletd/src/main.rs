mod config;

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::Layer as _;

/// Inlet ingests files dropped into object-storage buckets: each upload
/// becomes a task which is downloaded, recognized, and indexed.
#[derive(Debug, Parser)]
#[command(name = "inletd", about, version)]
struct Cli {
    /// Path of the TOML configuration file.
    #[arg(long, default_value = "config/inlet.toml", env = "INLET_CONFIG")]
    config: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load(&cli.config)?;

    let tracer_guard = install_telemetry(&config.telemetry)?;
    tracing::info!(config = %cli.config.display(), "starting inlet");

    let registry = Arc::new(
        registry::RedisRegistry::connect(&config.registry)
            .await
            .context("failed to connect to task registry")?,
    );
    let (bridge, deliveries) = queue::AmqpBridge::connect(config.queue.clone())
        .await
        .context("failed to connect to task queue broker")?;
    let bridge = Arc::new(bridge);
    let objects = Arc::new(cloud::S3Store::new(&config.object.s3));
    let index = Arc::new(
        indexer::HttpIndexer::new(&config.indexer).context("failed to build indexer client")?,
    );
    let recognizer = Arc::new(
        recognizer::HttpRecognizer::new(&config.recognizer)
            .context("failed to build recognizer client")?,
    );

    let coordinator = pipeline::Coordinator::new(
        &config.pipeline,
        registry,
        bridge.clone() as Arc<dyn queue::TaskQueue>,
        objects.clone() as Arc<dyn cloud::ObjectStore>,
        index,
        recognizer,
    );

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    bridge.consume().await.context("failed to start consumer")?;
    let listener = coordinator.launch_listener(deliveries, shutdown.clone());

    let router = api::build_router(api::ApiContext {
        coordinator,
        objects,
    });
    let tcp = tokio::net::TcpListener::bind(&config.api.address)
        .await
        .with_context(|| format!("failed to bind {}", config.api.address))?;
    tracing::info!(address = %config.api.address, "serving intake api");

    let serve_shutdown = shutdown.clone();
    axum::serve(tcp, router)
        .with_graceful_shutdown(async move { serve_shutdown.cancelled().await })
        .await
        .context("intake api server failed")?;

    // The server only returns once shutdown is signaled. Drain the
    // listener's in-flight workers, then close the broker cleanly.
    _ = listener.await;
    if let Err(err) = bridge.stop_consuming().await {
        tracing::warn!(error = %err, "failed to stop consuming cleanly");
    }
    if let Some(guard) = tracer_guard {
        guard.shutdown();
    }

    tracing::info!("inlet stopped");
    Ok(())
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let interrupted = async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for SIGINT");
        };

        #[cfg(unix)]
        let terminated = async {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to listen for SIGTERM");
            sigterm.recv().await;
        };
        #[cfg(not(unix))]
        let terminated = std::future::pending::<()>();

        tokio::select! {
            () = interrupted => tracing::info!("received SIGINT, initiating shutdown"),
            () = terminated => tracing::info!("received SIGTERM, initiating shutdown"),
        }
        shutdown.cancel();
    });
}

fn install_telemetry(config: &ops::TelemetryConfig) -> anyhow::Result<Option<ops::TracerGuard>> {
    let level: tracing_subscriber::filter::LevelFilter = config.logger_level.into();

    let handler: Box<dyn Fn(ops::Log) + Send + Sync> = if config.enable_remote_log {
        let endpoint = url::Url::parse(&config.logger_address)
            .with_context(|| format!("invalid logger address {}", config.logger_address))?;
        let (remote, _forwarder) = ops::new_remote_log_handler(endpoint);
        Box::new(move |log: ops::Log| {
            ops::stderr_log_handler(log.clone());
            remote(log);
        })
    } else {
        Box::new(ops::stderr_log_handler)
    };

    let (otel_layer, tracer_guard) = if config.enable_tracer {
        let (layer, guard) = ops::init_tracer_layer(&config.tracer_address, "inlet")?;
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(otel_layer)
        .with(
            ops::logging::Layer::new(handler, std::time::SystemTime::now).with_filter(level),
        )
        .init();

    Ok(tracer_guard)
}
