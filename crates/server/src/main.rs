use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::signal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cta_pipeline_core::{
    checkpoint::ParameterStore,
    config::LogFormat,
    create_notifier, load_config, previous_utc_day, spawn_job, validate_config, CheckpointStore,
    Config, CronSchedule, CtaTrainTrackerApi, ExpectedScheduleTask, FsObjectStore, GtfsFetchTask,
    HttpFeedSource, Notifier, ObjectStore, PipelineOrchestrator, SqliteParameterStore,
    TrainLocationFetcher, TrainLocationProcessor,
};
use cta_pipeline_server::api::create_router;
use cta_pipeline_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Logging may not be initialized yet when config loading fails.
        error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path
    let config_path = std::env::var("CTA_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    init_logging(config.logging.format);
    info!("CTA pipeline v{} starting", VERSION);
    info!("Configuration loaded from {:?}", config_path);

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Object store root: {:?}", config.storage.root);
    info!("Checkpoint database: {:?}", config.checkpoint.path);

    // Storage
    let store: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::new(config.storage.root.clone()));
    let parameters: Arc<dyn ParameterStore> = Arc::new(
        SqliteParameterStore::new(&config.checkpoint.path)
            .context("Failed to open checkpoint database")?,
    );
    let checkpoints = CheckpointStore::new(parameters, config.checkpoint.parameter_name.clone());

    // GTFS pipeline
    let source = HttpFeedSource::new(&config.gtfs).context("Failed to create GTFS feed source")?;
    let fetch = GtfsFetchTask::new(
        Arc::new(source),
        Arc::clone(&store),
        checkpoints,
        config.storage.raw_prefix.clone(),
    );
    let transform =
        ExpectedScheduleTask::new(Arc::clone(&store), config.storage.derived_prefix.clone());
    let notifier = create_notifier(&config.notifier).context("Failed to create notifier")?;
    info!("Using notifier: {}", notifier.name());

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        config.orchestrator.clone(),
        Arc::new(fetch),
        Arc::new(transform),
        notifier,
    ));

    // Train locations (optional)
    let (train_fetcher, train_processor) = if config.train_locations.enabled {
        let api = CtaTrainTrackerApi::new(&config.train_locations)
            .context("Failed to create Train Tracker client")?;
        let fetcher = TrainLocationFetcher::new(
            config.train_locations.clone(),
            Arc::new(api),
            Arc::clone(&store),
        );
        let processor = TrainLocationProcessor::new(
            Arc::clone(&store),
            config.train_locations.raw_prefix.clone(),
            config.storage.derived_prefix.clone(),
        );
        info!(
            "Train location ingestion enabled for {} lines",
            config.train_locations.lines.len()
        );
        (Some(Arc::new(fetcher)), Some(Arc::new(processor)))
    } else {
        info!("Train location ingestion disabled");
        (None, None)
    };

    // Scheduled jobs
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let jobs = spawn_scheduled_jobs(
        &config,
        &orchestrator,
        train_fetcher.as_ref(),
        train_processor.as_ref(),
        &shutdown_tx,
    )?;

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        orchestrator,
        train_fetcher,
        train_processor,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped, waiting for scheduled jobs");
    let _ = shutdown_tx.send(());
    for result in futures::future::join_all(jobs).await {
        if let Err(e) = result {
            warn!(error = %e, "Scheduled job ended abnormally");
        }
    }
    info!("Shutdown complete");

    Ok(())
}

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn spawn_scheduled_jobs(
    config: &Config,
    orchestrator: &Arc<PipelineOrchestrator>,
    train_fetcher: Option<&Arc<TrainLocationFetcher>>,
    train_processor: Option<&Arc<TrainLocationProcessor>>,
    shutdown_tx: &broadcast::Sender<()>,
) -> Result<Vec<JoinHandle<()>>> {
    let mut jobs = Vec::new();

    if config.orchestrator.enabled {
        let schedule = CronSchedule::parse(&config.orchestrator.schedule)
            .context("Invalid orchestrator.schedule")?;
        let orchestrator = Arc::clone(orchestrator);
        jobs.push(spawn_job(
            "gtfs_pipeline",
            schedule,
            move || {
                let orchestrator = Arc::clone(&orchestrator);
                async move {
                    if let Err(e) = orchestrator.trigger().await {
                        warn!(error = %e, "Scheduled pipeline run did not complete");
                    }
                }
            },
            shutdown_tx.subscribe(),
        ));
    } else {
        info!("Orchestrator schedule disabled; runs only start via the API");
    }

    if let Some(fetcher) = train_fetcher {
        let schedule = CronSchedule::parse(&config.train_locations.fetch_schedule)
            .context("Invalid train_locations.fetch_schedule")?;
        let fetcher = Arc::clone(fetcher);
        jobs.push(spawn_job(
            "train_location_fetch",
            schedule,
            move || {
                let fetcher = Arc::clone(&fetcher);
                async move {
                    if let Err(e) = fetcher.fetch().await {
                        error!(error = %e, "Scheduled train location fetch failed");
                    }
                }
            },
            shutdown_tx.subscribe(),
        ));
    }

    if let Some(processor) = train_processor {
        let schedule = CronSchedule::parse(&config.train_locations.process_schedule)
            .context("Invalid train_locations.process_schedule")?;
        let processor = Arc::clone(processor);
        jobs.push(spawn_job(
            "train_location_process",
            schedule,
            move || {
                let processor = Arc::clone(&processor);
                async move {
                    let date = previous_utc_day(Utc::now());
                    if let Err(e) = processor.process_date(date).await {
                        error!(
                            date = %date,
                            error = %e,
                            "Scheduled train location processing failed"
                        );
                    }
                }
            },
            shutdown_tx.subscribe(),
        ));
    }

    Ok(jobs)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received");
}
