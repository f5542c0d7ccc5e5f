use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use componentry_catalog_server::catalog::{
    builtin_snapshot, ComponentStore, DirComponentStore, ExtractionSource, StaticSource,
};
use componentry_catalog_server::rate_limit::RateLimitConfig;
use componentry_catalog_server::server::{run_server, RequestsLoggingLevel, ServerConfig};
use componentry_catalog_server::service::{CatalogDataService, DataServiceConfig};
use componentry_catalog_server::tools::{register_all_tools, ToolRegistry};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s).canonicalize()?;
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the catalog directory. Without it the built-in component set
    /// is served.
    #[clap(value_parser = parse_path)]
    pub catalog_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Result cache TTL in seconds.
    #[clap(long, default_value_t = 300)]
    pub cache_ttl_sec: u64,

    /// Result cache capacity in entries.
    #[clap(long, default_value_t = 256)]
    pub cache_capacity: usize,

    /// Requests allowed per caller per window.
    #[clap(long, default_value_t = 60)]
    pub rate_limit_max_requests: u32,

    /// Rate limit window in seconds.
    #[clap(long, default_value_t = 60)]
    pub rate_limit_window_sec: u64,

    /// Seconds after which the snapshot is considered stale.
    #[clap(long, default_value_t = 3600)]
    pub refresh_expiry_sec: u64,

    /// Interval in seconds between staleness checks and cache sweeps.
    #[clap(long, default_value_t = 60)]
    pub sweep_interval_sec: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let (source, store): (Arc<dyn ExtractionSource>, Option<Arc<dyn ComponentStore>>) =
        match &cli_args.catalog_dir {
            Some(dir) => {
                info!("Serving catalog directory at {:?}", dir);
                let store = Arc::new(DirComponentStore::new(dir)?);
                (store.clone(), Some(store))
            }
            None => {
                info!("No catalog directory given, serving the built-in component set");
                (Arc::new(StaticSource::new(builtin_snapshot())), None)
            }
        };

    let service_config = DataServiceConfig {
        cache_capacity: cli_args.cache_capacity,
        cache_ttl: Duration::from_secs(cli_args.cache_ttl_sec),
        rate_limit: RateLimitConfig {
            max_requests: cli_args.rate_limit_max_requests,
            window: Duration::from_secs(cli_args.rate_limit_window_sec),
        },
        refresh_expiry: Duration::from_secs(cli_args.refresh_expiry_sec),
        ..DataServiceConfig::default()
    };
    let service = Arc::new(CatalogDataService::new(source, store, service_config)?);

    info!("Loading initial snapshot...");
    service.ensure_initialized().await?;

    let sweeping_service = service.clone();
    let sweep_interval = Duration::from_secs(cli_args.sweep_interval_sec.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);

        // Skip the first immediate tick, wait for the first interval
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweeping_service.cleanup();
            if let Err(e) = sweeping_service.refresh_if_stale().await {
                error!("Failed to refresh catalog snapshot: {}", e);
            }
        }
    });

    let mut registry = ToolRegistry::new();
    register_all_tools(&mut registry);
    info!("Registered {} tools", registry.tool_count());

    let server_config = ServerConfig {
        requests_logging_level: cli_args.logging_level,
        port: cli_args.port,
    };

    info!("Starting server on port {}", cli_args.port);
    run_server(service, Arc::new(registry), server_config).await
}
