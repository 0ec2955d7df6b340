//! bruteguard server binary: wire configuration, stores, services and the
//! HTTP listener together, then run until told to stop.

mod telemetry;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use bruteguard_api::{build_router, ApiState};
use bruteguard_config::{AppConfig, ConfigError, RATE_WINDOW};
use bruteguard_core::{AccessService, ManagementService, RateLimits};
use bruteguard_persistence::{
    Database, RateLimitStore, RedisHandle, SubnetCache, SubnetProvider, SubnetRepository,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(ConfigError::InvalidKeys { keys }) => {
            // The subscriber is not up yet; this has to reach the operator
            // regardless.
            eprintln!("configuration error, offending keys: {}", keys.join(", "));
            std::process::exit(2);
        }
    };

    telemetry::init(config.log_level)?;
    info!(port = config.http_port, "starting bruteguard");

    let database = Database::connect(&config.pgsql_connection_string)
        .await
        .context("postgres connection failed")?;
    database.migrate().await.context("database migration failed")?;
    database.health_check().await.context("postgres health check failed")?;

    let redis = RedisHandle::connect(&config.redis_connection_string)
        .await
        .context("redis connection failed")?;

    let repository = SubnetRepository::new(database.pool().clone());
    let cache = SubnetCache::new(redis.manager());
    let provider = Arc::new(SubnetProvider::new(repository.clone(), cache));

    if let Err(err) = provider.refresh_lists().await {
        warn!(error = %err, "failed to warm subnet snapshots");
    }

    let counters = Arc::new(RateLimitStore::new(redis.manager(), RATE_WINDOW));
    let limits = RateLimits {
        ip: config.ip_rate_limit,
        login: config.login_rate_limit,
        password: config.password_rate_limit,
    };

    let access = Arc::new(AccessService::new(provider.clone(), counters.clone(), limits));
    let management = Arc::new(ManagementService::new(provider, Arc::new(repository), counters));

    let router = build_router(ApiState::new(access, management));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped, draining connections");
    database.close().await;

    Ok(())
}

/// Resolves on SIGINT or SIGTERM; in-flight requests then get to finish.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = match signal(SignalKind::terminate()) {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
                info!("received shutdown signal");
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("received shutdown signal");
}
