//! Serve command implementation
//!
//! Resolves the effective configuration (flags over file over defaults),
//! constructs the service with its injected fetcher, and runs the axum
//! server until a shutdown signal arrives.

use crate::cli::ServeArgs;
use anyhow::{Context, Result};
use imgd_core::config::ServiceConfig;
use imgd_core::fetch::ReqwestFetcher;
use imgd_core::service::TransformService;
use std::sync::Arc;
use tracing::info;

/// Execute the serve command
pub async fn execute_serve(args: ServeArgs) -> Result<()> {
    let config = resolve_config(&args)?;

    let fetcher = Arc::new(ReqwestFetcher::new().context("failed to build HTTP client")?);
    let service = Arc::new(TransformService::new(config.clone(), fetcher));
    let app = crate::server::router(service);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(
        bind = %listener.local_addr()?,
        cache_root = %config.cache_root.display(),
        static_origin = %config.static_origin,
        generated_origin = %config.generated_origin,
        "imgd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

/// Merge CLI flags over the optional configuration file, then validate
fn resolve_config(args: &ServeArgs) -> Result<ServiceConfig> {
    let mut config = match &args.config {
        Some(path) => ServiceConfig::load_from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ServiceConfig::default(),
    };

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(cache_root) = &args.cache_root {
        config.cache_root = cache_root.clone();
    }
    if let Some(static_origin) = &args.static_origin {
        config.static_origin = static_origin.clone();
    }
    if let Some(generated_origin) = &args.generated_origin {
        config.generated_origin = generated_origin.clone();
    }
    if let Some(cache_max_age) = args.cache_max_age {
        config.cache_max_age = cache_max_age;
    }

    config.validate()?;
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to install shutdown signal handler");
        return;
    }
    info!("shutdown signal received");
}
