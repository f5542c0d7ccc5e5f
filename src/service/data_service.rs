use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::CacheStats;
use crate::catalog::{
    is_valid_component_id, Category, CatalogSnapshot, Component, ComponentStore, ExtractionSource,
};
use crate::error::{CatalogError, Result};
use crate::metrics::{MetricSample, MetricsCollector, MetricsSummary};
use crate::rate_limit::{RateLimitConfig, SlidingWindowLimiter};
use crate::search::{CatalogSearchEngine, SearchFilters, SearchPage};

use super::RetryPolicy;

pub const MAX_QUERY_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct DataServiceConfig {
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub rate_limit: RateLimitConfig,
    pub metrics_capacity: usize,
    /// A snapshot younger than this is considered fresh; `refresh_if_stale`
    /// no-ops while it holds.
    pub refresh_expiry: Duration,
    pub retry: RetryPolicy,
}

impl Default for DataServiceConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 256,
            cache_ttl: Duration::from_secs(300),
            rate_limit: RateLimitConfig::default(),
            metrics_capacity: 1024,
            refresh_expiry: Duration::from_secs(3600),
            retry: RetryPolicy::default(),
        }
    }
}

/// Point-in-time service health view for the home route.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub components: usize,
    pub snapshot_fetched_at: Option<chrono::DateTime<chrono::Utc>>,
    pub page_cache: CacheStats,
    pub component_cache: CacheStats,
    pub tracked_callers: usize,
    pub metrics: MetricsSummary,
}

/// Owns the whole query path: snapshot lifecycle, result caches, rate
/// limiting and metrics. Tool handlers only ever talk to this type.
///
/// The inner mutexes are `std::sync`; no lock is held across an await. The
/// refresh cycle is serialized by a separate `tokio::sync::Mutex` so that
/// concurrent callers share one in-flight load.
pub struct CatalogDataService {
    source: Arc<dyn ExtractionSource>,
    engine: Mutex<CatalogSearchEngine>,
    limiter: Mutex<SlidingWindowLimiter>,
    metrics: Mutex<MetricsCollector>,
    refresh_lock: tokio::sync::Mutex<()>,
    last_refresh: Mutex<Option<Instant>>,
    config: DataServiceConfig,
}

impl CatalogDataService {
    pub fn new(
        source: Arc<dyn ExtractionSource>,
        store: Option<Arc<dyn ComponentStore>>,
        config: DataServiceConfig,
    ) -> Result<Self> {
        let engine = CatalogSearchEngine::new(config.cache_capacity, config.cache_ttl, store)?;
        Ok(Self {
            source,
            engine: Mutex::new(engine),
            limiter: Mutex::new(SlidingWindowLimiter::new(config.rate_limit.clone())),
            metrics: Mutex::new(MetricsCollector::new(config.metrics_capacity)),
            refresh_lock: tokio::sync::Mutex::new(()),
            last_refresh: Mutex::new(None),
            config,
        })
    }

    /// Admit or reject a caller before any work happens. Rejection carries
    /// the delay after which the caller's oldest slot frees up.
    pub fn check_rate_limit(&self, identifier: &str) -> Result<()> {
        let mut limiter = self.limiter.lock().unwrap();
        if limiter.is_allowed(identifier) {
            Ok(())
        } else {
            Err(CatalogError::RateLimitExceeded {
                retry_after: limiter.reset_time(identifier),
            })
        }
    }

    /// First caller triggers the load; concurrent callers await the same
    /// in-flight operation. With no prior good snapshot a failed load is a
    /// hard error.
    pub async fn ensure_initialized(&self) -> Result<()> {
        if self.engine.lock().unwrap().is_ready() {
            return Ok(());
        }
        let _guard = self.refresh_lock.lock().await;
        if self.engine.lock().unwrap().is_ready() {
            return Ok(());
        }
        let snapshot = self.load_with_retry().await?;
        self.install(snapshot);
        Ok(())
    }

    /// Refresh the snapshot unless the current one is still fresh. A failed
    /// refresh keeps the last good snapshot.
    pub async fn refresh_if_stale(&self) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        if self.is_fresh() {
            return Ok(());
        }
        match self.load_with_retry().await {
            Ok(snapshot) => {
                self.install(snapshot);
                Ok(())
            }
            Err(err) => {
                if self.engine.lock().unwrap().is_ready() {
                    warn!("refresh failed, keeping last good snapshot: {err}");
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }

    pub async fn search_components(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<(SearchPage, bool)> {
        if query.trim().is_empty() {
            return Err(CatalogError::InvalidSearchQuery(
                "query must not be empty".to_string(),
            ));
        }
        if query.chars().count() > MAX_QUERY_LEN {
            return Err(CatalogError::InvalidSearchQuery(format!(
                "query exceeds {MAX_QUERY_LEN} characters"
            )));
        }
        self.ensure_initialized().await?;

        let started = Instant::now();
        let (page, cached) = self.engine.lock().unwrap().search(query, filters)?;
        self.record("search_components", started, cached);
        Ok((page, cached))
    }

    pub async fn get_component(&self, id: &str) -> Result<(Component, bool)> {
        if !is_valid_component_id(id) {
            return Err(CatalogError::InvalidComponentId(id.to_string()));
        }
        self.ensure_initialized().await?;

        let started = Instant::now();
        let (found, cached) = self.engine.lock().unwrap().get_by_id(id)?;
        self.record("get_component", started, cached);
        found
            .map(|component| (component, cached))
            .ok_or_else(|| CatalogError::ComponentNotFound(id.to_string()))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.ensure_initialized().await?;
        let started = Instant::now();
        let categories = self.engine.lock().unwrap().list_categories();
        self.record("list_categories", started, false);
        Ok(categories)
    }

    pub async fn browse_category(
        &self,
        category_id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<(SearchPage, bool)> {
        if !is_valid_component_id(category_id) {
            return Err(CatalogError::InvalidCategory(category_id.to_string()));
        }
        self.ensure_initialized().await?;

        let started = Instant::now();
        let (page, cached) = self
            .engine
            .lock()
            .unwrap()
            .browse_category(category_id, limit, offset)?;
        self.record("browse_category", started, cached);
        Ok((page, cached))
    }

    pub async fn get_random_component(&self) -> Result<Component> {
        self.ensure_initialized().await?;
        let started = Instant::now();
        let component = self.engine.lock().unwrap().get_random(&mut rand::rng());
        self.record("get_random_component", started, false);
        component.ok_or_else(|| CatalogError::Cache("catalog is empty".to_string()))
    }

    pub fn status(&self) -> ServiceStatus {
        let engine = self.engine.lock().unwrap();
        let (page_cache, component_cache) = engine.cache_stats();
        ServiceStatus {
            components: engine.component_count(),
            snapshot_fetched_at: engine.snapshot_fetched_at(),
            page_cache,
            component_cache,
            tracked_callers: self.limiter.lock().unwrap().tracked_identifiers(),
            metrics: self.metrics.lock().unwrap().summary(),
        }
    }

    /// Background sweep: expired cache entries plus aged-out rate windows.
    pub fn cleanup(&self) {
        let removed = self.engine.lock().unwrap().cleanup_caches();
        self.limiter.lock().unwrap().cleanup();
        if removed > 0 {
            info!("swept {removed} expired cache entries");
        }
    }

    fn is_fresh(&self) -> bool {
        let last_refresh = self.last_refresh.lock().unwrap();
        match *last_refresh {
            Some(at) => at.elapsed() < self.config.refresh_expiry,
            None => false,
        }
    }

    fn install(&self, snapshot: CatalogSnapshot) {
        info!("installing snapshot with {} components", snapshot.component_count());
        self.engine.lock().unwrap().install_snapshot(snapshot);
        *self.last_refresh.lock().unwrap() = Some(Instant::now());
    }

    async fn load_with_retry(&self) -> Result<CatalogSnapshot> {
        let mut retry_count = 0u32;
        loop {
            match self.source.refresh().await {
                Ok(snapshot) => return Ok(snapshot),
                Err(err) => {
                    if !self.config.retry.should_retry(&err, retry_count) {
                        return Err(err);
                    }
                    let backoff = self.config.retry.backoff(retry_count);
                    warn!("snapshot load failed (retry {retry_count}): {err}; backing off {backoff:?}");
                    tokio::time::sleep(backoff).await;
                    retry_count += 1;
                }
            }
        }
    }

    fn record(&self, operation: &str, started: Instant, cache_hit: bool) {
        self.metrics
            .lock()
            .unwrap()
            .record(MetricSample::new(operation, started.elapsed(), cache_hit));
    }
}
