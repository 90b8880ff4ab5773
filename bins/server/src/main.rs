//! walletd API Server
//!
//! Main entry point for the wallet ledger service.

use std::sync::Arc;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use walletd_api::{AppState, create_router};
use walletd_core::{RetryPolicy, WalletCacheStore, WalletService};
use walletd_db::migration::Migrator;
use walletd_db::{LayeredBalanceCache, LocalBalanceCache, PgWalletStoreTxFactory, RedisBalanceCache};
use walletd_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(config.log.json);

    // Connect to database and bring the schema up to date
    let db = walletd_db::connect(&config.database).await?;
    info!("Connected to database");
    Migrator::up(&db, None).await?;
    info!("Migrations applied");

    // Local cache, with Redis behind it when configured
    let local = Arc::new(LocalBalanceCache::from_config(&config.cache));
    let cache: Arc<dyn WalletCacheStore> = match &config.redis {
        Some(redis) => {
            let shared =
                RedisBalanceCache::connect(&redis.url, config.cache.shared_ttl_secs).await?;
            info!("Connected to Redis");
            Arc::new(LayeredBalanceCache::new(local, Arc::new(shared)))
        }
        None => {
            warn!("No Redis configured, using local cache only");
            local
        }
    };

    let policy = RetryPolicy::from(&config.retry);
    info!(scope = ?policy.scope, "Retry policy configured");
    let wallets = WalletService::new(Arc::new(PgWalletStoreTxFactory::new(db)), cache, policy)
        .with_load_timeout(config.cache.load_timeout())
        .with_cache_timeout(config.cache.op_timeout());

    let jwt_service = JwtService::new(&config.jwt.secret);
    if config.jwt.secret.is_empty() {
        warn!("JWT secret is empty, every protected request will be rejected");
    }

    let state = AppState {
        wallets: Arc::new(wallets),
        jwt_service: Arc::new(jwt_service),
    };
    let app = create_router(state, config.server.request_timeout());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "walletd=debug,walletd_core=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}
