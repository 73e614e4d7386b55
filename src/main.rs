use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use subscription_ledger::adapters::http::{billing_router, with_request_timeout, BillingAppState};
use subscription_ledger::adapters::{
    HttpPaymentGateway, PostgresSubscriptionLedger, SystemClock, ThreadRngSource,
};
use subscription_ledger::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    init_tracing(&config);

    config.validate().context("Invalid configuration")?;
    let addr = config.server.socket_addr()?;

    tracing::info!(
        environment = ?config.server.environment,
        gateway = %config.gateway.base_url,
        "Starting subscription ledger"
    );

    // Ledger store
    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    if config.database.run_migrations {
        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    // Gateway client
    let gateway = HttpPaymentGateway::new(config.gateway.http_config())
        .context("Failed to build gateway client")?;

    let state = BillingAppState {
        gateway: Arc::new(gateway),
        ledger: Arc::new(PostgresSubscriptionLedger::new(pool)),
        clock: Arc::new(SystemClock),
        random: Arc::new(ThreadRngSource),
    };

    let app = with_request_timeout(
        billing_router().with_state(state),
        config.server.request_timeout(),
    )
    .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
