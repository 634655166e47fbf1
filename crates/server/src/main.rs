mod api;
mod metrics;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use framewatch_core::{
    config::{LogFormat, LoggingConfig},
    inventory::MediaLiveInventory,
    load_config, load_config_from_env,
    publisher::CloudWatchPublisher,
    queue::SqsEventQueue,
    sampler::MediaLiveSampler,
    scorer::RekognitionScorer,
    validate_config, Config, DispatcherConfig, FleetEventDispatcher, WorkerAdapters,
    WorkerConfig, WorkerRegistry,
};

use api::create_router;
use state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the optional TOML config file
const CONFIG_PATH_VAR: &str = "FRAMEWATCH_CONFIG";

/// How long workers get to finish their current iteration at shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = load()?;
    validate_config(&config).context("Configuration validation failed")?;

    init_logging(&config.logging);
    info!(version = VERSION, "Starting framewatch");
    info!(
        namespace = %config.monitor.namespace,
        interval_secs = config.monitor.interval_secs,
        queue = %config.queue.name,
        "Configuration loaded"
    );

    let sdk_config = load_aws_config(&config).await;
    let medialive = aws_sdk_medialive::Client::new(&sdk_config);

    let adapters = WorkerAdapters {
        sampler: Arc::new(MediaLiveSampler::new(medialive.clone())),
        scorer: Arc::new(RekognitionScorer::new(aws_sdk_rekognition::Client::new(
            &sdk_config,
        ))),
        publisher: Arc::new(CloudWatchPublisher::new(
            aws_sdk_cloudwatch::Client::new(&sdk_config),
            config.monitor.namespace.clone(),
        )),
    };
    let registry = Arc::new(WorkerRegistry::new(
        adapters,
        WorkerConfig::from(&config.monitor),
    ));

    let dispatcher = Arc::new(FleetEventDispatcher::new(
        Arc::clone(&registry),
        Arc::new(SqsEventQueue::new(
            aws_sdk_sqs::Client::new(&sdk_config),
            config.queue.clone(),
        )),
        Arc::new(MediaLiveInventory::new(medialive)),
        DispatcherConfig::from(&config),
    ));

    let shutdown = CancellationToken::new();

    // Bind before dispatching so a bad address fails startup
    let server_task = if config.server.enabled {
        let addr = SocketAddr::new(config.server.host, config.server.port);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind status server to {}", addr))?;
        info!("Status server listening on {}", addr);

        let app = create_router(Arc::new(AppState::new(config.clone(), Arc::clone(&registry))));
        let server_shutdown = shutdown.clone();
        Some(tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(server_shutdown.cancelled_owned())
                .await
        }))
    } else {
        None
    };

    let dispatcher_task = {
        let dispatcher = Arc::clone(&dispatcher);
        let shutdown = shutdown.clone();
        let reconcile = config.reconcile.enabled;
        tokio::spawn(async move {
            if reconcile {
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    started = dispatcher.reconcile() => {
                        info!(started, "Monitoring pipelines found at startup");
                    }
                }
            }
            dispatcher.run(shutdown).await;
        })
    };

    shutdown_signal().await;
    info!("Shutdown signal received");
    shutdown.cancel();

    if let Err(e) = dispatcher_task.await {
        warn!("Dispatcher task ended abnormally: {}", e);
    }
    registry.shutdown(SHUTDOWN_GRACE).await;

    if let Some(task) = server_task {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Status server error: {}", e),
            Err(e) => warn!("Status server task ended abnormally: {}", e),
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from the file named by `FRAMEWATCH_CONFIG`, or from the
/// environment alone when it is unset.
fn load() -> Result<Config> {
    match std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from) {
        Some(path) => load_config(&path)
            .with_context(|| format!("Failed to load config from {:?}", path)),
        None => load_config_from_env().context("Failed to load config from environment"),
    }
}

fn init_logging(logging: &LoggingConfig) {
    let default_filter = if logging.debug {
        "debug,aws_smithy_runtime=info,aws_config=info,hyper=info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let subscriber = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Text => subscriber.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

async fn load_aws_config(config: &Config) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.aws.region {
        loader = loader.region(Region::new(region.clone()));
    }
    loader.load().await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
