use anyhow::Context;
use fundwatch::engine::{Clock, SystemClock};
use fundwatch::{
    api, config::Config, db::init_db, DataSource, FundingService, HttpDataSource, ParameterCache,
    Repository,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let pool = init_db(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    let repo = Arc::new(Repository::new(pool));

    let datasource: Arc<dyn DataSource> = Arc::new(
        HttpDataSource::new(config.funding_api_url.clone(), config.http_timeout)
            .context("Failed to build HTTP client")?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let shutdown = CancellationToken::new();

    let params = Arc::new(ParameterCache::new(
        datasource.clone(),
        clock.clone(),
        config.params_max_age,
    ));
    let _refresher = params.spawn_refresher(config.params_refresh_interval, &shutdown);

    let funding = Arc::new(
        FundingService::new(datasource, clock, params, repo)
            .with_intervals(config.poll_interval, config.countdown_tick)
            .with_monitor_retention(config.monitor_retention),
    );
    let _pruner = funding.spawn_monitor_pruner(config.monitor_prune_interval, &shutdown);

    let app = api::create_router(api::AppState::new(funding.clone()));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    let signal_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown signal received");
            signal_token.cancel();
        })
        .await
        .context("Server error")?;

    shutdown.cancel();
    funding.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
