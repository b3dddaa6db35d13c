use indexer_api::{ApiConfig, ApiContext, ApiServer};
use indexer_core::{CurveConfig, EventDecoder, IndexerConfig};
use indexer_db::{DatabaseConfig, DatabasePool, PgStore};
use indexer_metrics::{MetricsConfig, MetricsServer};
use indexer_notifier::{Notifier, NotifierConfig};
use indexer_processor::{CompositeSink, EventProcessor, NotifierSink};
use indexer_store::{InMemoryStore, MirrorStore};
use indexer_sync::{Reconciler, RpcChainClient};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("indexer_sync=info".parse()?)
                .add_directive("indexer_processor=info".parse()?)
                .add_directive("indexer_notifier=info".parse()?),
        )
        .init();

    info!("Launchpad indexer starting...");

    // Metrics recorder must be installed before anything records
    let metrics_config = MetricsConfig::from_env();
    if metrics_config.enabled {
        let handle = indexer_metrics::init()?;
        let metrics_server = MetricsServer::new(metrics_config, handle);
        tokio::spawn(async move {
            if let Err(e) = metrics_server.run().await {
                error!(error = %e, "Metrics server error");
            }
        });
    } else {
        info!("Metrics disabled");
    }

    // Postgres when DATABASE_URL is set, in-memory otherwise
    let (store, db_pool): (Arc<dyn MirrorStore>, Option<DatabasePool>) = match DatabaseConfig::from_env() {
        Some(db_config) => {
            let pool = DatabasePool::connect(&db_config).await?;
            pool.migrate().await?;
            info!("Database connected and migrations applied");
            let store: Arc<dyn MirrorStore> = Arc::new(PgStore::new(pool.clone()));
            (store, Some(pool))
        }
        None => {
            warn!("DATABASE_URL not set, running with in-memory store");
            let store: Arc<dyn MirrorStore> = Arc::new(InMemoryStore::new());
            (store, None)
        }
    };

    let notifier = Notifier::new(store.clone(), NotifierConfig::from_env());
    let heartbeat = notifier.start_heartbeat();

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Handle Ctrl+C
    let shutdown_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received (Ctrl+C)");
        shutdown_signal.send(()).ok();
    });

    let mut api_ctx =
        ApiContext::new(store.clone(), notifier.clone()).with_curve(CurveConfig::from_env());

    // Missing or malformed chain configuration disables the reconciler
    // but keeps serving
    let chain_setup = IndexerConfig::load().and_then(|config| {
        let chain = RpcChainClient::new(&config.chain)?;
        Ok((config, chain))
    });

    let reconciler_task = match chain_setup {
        Ok((config, chain)) => {
            info!(
                chain_id = config.chain.chain_id,
                factory = ?config.chain.factory,
                poll_ms = config.reconciler.poll_interval_ms,
                lookback = config.reconciler.lookback_blocks,
                window = config.reconciler.window_blocks,
                "Indexer configuration loaded"
            );

            let processor = Arc::new(EventProcessor::new(store.clone()));
            processor
                .set_sinks(CompositeSink::new().with_sink(Arc::new(NotifierSink::new(notifier.clone()))))
                .await;

            let reconciler = Arc::new(Reconciler::new(
                Arc::new(chain),
                EventDecoder::new(config.chain.factory),
                processor,
                config.reconciler.clone(),
            ));
            api_ctx = api_ctx.with_reconciler(reconciler.clone(), config.chain.chain_id);

            Some(tokio::spawn(reconciler.start(shutdown_tx.subscribe())))
        }
        Err(e) => {
            error!(error = %e, "Indexer disabled: chain configuration missing or invalid");
            None
        }
    };

    let api_server = ApiServer::new(ApiConfig::from_env(), api_ctx);
    let api_shutdown = shutdown_tx.subscribe();
    let api_task = tokio::spawn(async move {
        if let Err(e) = api_server.run(api_shutdown).await {
            error!(error = %e, "API server error");
        }
    });

    // Serve until Ctrl+C
    let mut shutdown_rx = shutdown_tx.subscribe();
    let _ = shutdown_rx.recv().await;

    info!("Shutting down...");

    if let Some(task) = reconciler_task {
        if let Err(e) = task.await {
            warn!(error = %e, "Reconciler task ended abnormally");
        }
    }
    if let Err(e) = api_task.await {
        warn!(error = %e, "API task ended abnormally");
    }
    heartbeat.abort();

    if let Some(db) = db_pool {
        db.close().await;
        info!("Database connections closed");
    }

    info!("Launchpad indexer shutdown complete");
    Ok(())
}
