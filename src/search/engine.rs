use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{CacheStats, TtlCache};
use crate::catalog::{CatalogSnapshot, Category, Component, ComponentStore, Difficulty};
use crate::error::Result;

pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 50;
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    Name,
    Updated,
    Difficulty,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Conjunctive search filters. All present filters must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub has_demo: Option<bool>,
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
    #[serde(default)]
    pub updated_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub sort_by: Option<SortBy>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

impl SearchFilters {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(MIN_LIMIT, MAX_LIMIT)
    }

    fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    fn matches(&self, component: &Component) -> bool {
        if let Some(category) = &self.category {
            if &component.category != category {
                return false;
            }
        }
        if !self.tags.is_empty() && self.tags.is_disjoint(&component.tags) {
            return false;
        }
        if let Some(difficulty) = self.difficulty {
            if component.difficulty != difficulty {
                return false;
            }
        }
        if let Some(has_demo) = self.has_demo {
            if component.has_demo() != has_demo {
                return false;
            }
        }
        if !self.dependencies.is_empty()
            && !component
                .dependencies
                .iter()
                .any(|d| self.dependencies.contains(d))
        {
            return false;
        }
        if let Some(threshold) = self.updated_after {
            if component.last_updated <= threshold {
                return false;
            }
        }
        true
    }
}

/// One page of components plus enough context to page further.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub components: Vec<Component>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

impl SearchPage {
    fn slice(mut matched: Vec<Component>, limit: usize, offset: usize) -> SearchPage {
        let total = matched.len();
        let components: Vec<Component> = if offset >= total {
            Vec::new()
        } else {
            matched.drain(offset..(offset + limit).min(total)).collect()
        };
        let has_more = offset + components.len() < total;
        SearchPage {
            components,
            total,
            limit,
            offset,
            has_more,
        }
    }
}

/// Filter, sort and paginate one catalog snapshot, caching result pages.
///
/// Holds no synchronization of its own; the data service wraps it in a
/// `Mutex` together with the caches it owns.
pub struct CatalogSearchEngine {
    snapshot: Option<CatalogSnapshot>,
    pages: TtlCache<SearchPage>,
    components: TtlCache<Component>,
    store: Option<Arc<dyn ComponentStore>>,
}

impl CatalogSearchEngine {
    pub fn new(
        cache_capacity: usize,
        cache_ttl: Duration,
        store: Option<Arc<dyn ComponentStore>>,
    ) -> Result<Self> {
        Ok(Self {
            snapshot: None,
            pages: TtlCache::new(cache_capacity, cache_ttl)?,
            components: TtlCache::new(cache_capacity, cache_ttl)?,
            store,
        })
    }

    /// Swap in a fresh snapshot. Cached pages belong to the old snapshot and
    /// are dropped.
    pub fn install_snapshot(&mut self, snapshot: CatalogSnapshot) {
        self.snapshot = Some(snapshot);
        self.pages.clear();
        self.components.clear();
    }

    pub fn is_ready(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn snapshot_fetched_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.as_ref().map(|s| s.fetched_at())
    }

    pub fn component_count(&self) -> usize {
        self.snapshot.as_ref().map_or(0, |s| s.component_count())
    }

    /// Text search plus conjunctive filters. Returns the page and whether it
    /// came from the page cache.
    pub fn search(&mut self, query: &str, filters: &SearchFilters) -> Result<(SearchPage, bool)> {
        let normalized = query.trim().to_lowercase();
        let key = search_cache_key(&normalized, filters);
        if let Some(page) = self.pages.get(&key) {
            return Ok((page, true));
        }

        let mut matched: Vec<Component> = self
            .snapshot
            .as_ref()
            .map(|s| {
                s.components()
                    .iter()
                    .filter(|c| matches_query(c, &normalized))
                    .filter(|c| filters.matches(c))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort_by) = filters.sort_by {
            sort_components(&mut matched, sort_by, filters.sort_order.unwrap_or(SortOrder::Desc));
        }

        let page = SearchPage::slice(matched, filters.limit(), filters.offset());
        self.pages.set(&key, page.clone(), None)?;
        Ok((page, false))
    }

    /// All components of one category, paginated. An unknown category is an
    /// empty page, not an error.
    pub fn browse_category(
        &mut self,
        category: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<(SearchPage, bool)> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(MIN_LIMIT, MAX_LIMIT);
        let offset = offset.unwrap_or(0);
        let key = format!("category:{category}:{limit}:{offset}");
        if let Some(page) = self.pages.get(&key) {
            return Ok((page, true));
        }

        let matched: Vec<Component> = self
            .snapshot
            .as_ref()
            .map(|s| {
                s.components()
                    .iter()
                    .filter(|c| c.category == category)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let page = SearchPage::slice(matched, limit, offset);
        self.pages.set(&key, page.clone(), None)?;
        Ok((page, false))
    }

    pub fn list_categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self
            .snapshot
            .as_ref()
            .map(|s| s.categories().to_vec())
            .unwrap_or_default();
        categories.sort_by_key(|c| c.priority);
        categories
    }

    /// Component by id, full code included when available. An unknown id is
    /// `Ok(None)`.
    pub fn get_by_id(&mut self, id: &str) -> Result<(Option<Component>, bool)> {
        let key = format!("component:{id}");
        if let Some(component) = self.components.get(&key) {
            return Ok((Some(component), true));
        }

        let mut found = self
            .snapshot
            .as_ref()
            .and_then(|s| s.component(id))
            .cloned();

        if let Some(component) = &mut found {
            if component.full_code.is_none() {
                self.fill_full_code(component);
            }
        } else if let Some(store) = &self.store {
            found = store.load(id)?;
        }

        if let Some(component) = &found {
            self.components.set(&key, component.clone(), None)?;
        }
        Ok((found, false))
    }

    /// Uniformly random component. Full code is fetched best-effort; a store
    /// failure returns the record without it.
    pub fn get_random<R: Rng>(&mut self, rng: &mut R) -> Option<Component> {
        let snapshot = self.snapshot.as_ref()?;
        if snapshot.component_count() == 0 {
            return None;
        }
        let index = rng.random_range(0..snapshot.component_count());
        let mut component = snapshot.components()[index].clone();
        if component.full_code.is_none() {
            self.fill_full_code(&mut component);
        }
        Some(component)
    }

    pub fn cache_stats(&self) -> (CacheStats, CacheStats) {
        (self.pages.stats(), self.components.stats())
    }

    pub fn cleanup_caches(&mut self) -> usize {
        self.pages.cleanup() + self.components.cleanup()
    }

    fn fill_full_code(&mut self, component: &mut Component) {
        let Some(store) = &self.store else {
            return;
        };
        match store.load(&component.id) {
            Ok(Some(full)) => {
                if let Some(full_code) = full.full_code {
                    component.full_code = Some(full_code.clone());
                    if let Some(snapshot) = &mut self.snapshot {
                        snapshot.set_full_code(&component.id, full_code);
                    }
                }
            }
            Ok(None) => {}
            Err(err) => warn!("full code fetch failed for {}: {err}", component.id),
        }
    }
}

fn matches_query(component: &Component, normalized: &str) -> bool {
    if normalized.is_empty() {
        return true;
    }
    component.name.to_lowercase().contains(normalized)
        || component.description.to_lowercase().contains(normalized)
        || component.category.to_lowercase().contains(normalized)
        || component
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(normalized))
}

fn sort_components(components: &mut [Component], sort_by: SortBy, order: SortOrder) {
    components.sort_by(|a, b| {
        let ordering = match sort_by {
            SortBy::Name => a.name.cmp(&b.name),
            SortBy::Updated => a.last_updated.cmp(&b.last_updated),
            SortBy::Difficulty => a.difficulty.cmp(&b.difficulty),
            SortBy::Category => a.category.cmp(&b.category),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

// The filters struct serializes with a fixed field order and sorted sets, so
// equal filter values always produce equal keys.
fn search_cache_key(normalized_query: &str, filters: &SearchFilters) -> String {
    let filters_json = serde_json::to_string(filters).unwrap_or_default();
    format!("search:{normalized_query}|{filters_json}")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::catalog::{builtin_snapshot, SnapshotBuild};

    use super::*;

    fn engine() -> CatalogSearchEngine {
        let mut engine = CatalogSearchEngine::new(64, Duration::from_secs(60), None).unwrap();
        engine.install_snapshot(builtin_snapshot());
        engine
    }

    fn filters() -> SearchFilters {
        SearchFilters::default()
    }

    #[test]
    fn empty_query_matches_everything() {
        let mut e = engine();
        let (page, cached) = e.search("", &filters()).unwrap();
        assert!(!cached);
        assert_eq!(page.total, e.component_count());
    }

    #[test]
    fn query_is_normalized_before_matching() {
        let mut e = engine();
        let (page, _) = e.search("  BUTTON  ", &filters()).unwrap();
        assert!(page.total >= 2);
        assert!(page
            .components
            .iter()
            .all(|c| c.name.to_lowercase().contains("button")
                || c.tags.contains("button")
                || c.category == "buttons"));
    }

    #[test]
    fn repeated_search_hits_the_page_cache() {
        let mut e = engine();
        let (first, cached_first) = e.search("modal", &filters()).unwrap();
        let (second, cached_second) = e.search("  MODAL ", &filters()).unwrap();
        assert!(!cached_first);
        assert!(cached_second);
        assert_eq!(first.total, second.total);
    }

    #[test]
    fn filters_compose_conjunctively_in_any_order() {
        let mut e = engine();
        let mut f = filters();
        f.category = Some("forms".to_string());
        f.difficulty = Some(Difficulty::Advanced);
        let (page, _) = e.search("", &f).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.components[0].id, "select-multi");

        // Same filters, different construction order, same page.
        let mut g = filters();
        g.difficulty = Some(Difficulty::Advanced);
        g.category = Some("forms".to_string());
        let (page2, cached) = e.search("", &g).unwrap();
        assert!(cached);
        assert_eq!(page2.components[0].id, "select-multi");
    }

    #[test]
    fn tag_filter_matches_any_listed_tag() {
        let mut e = engine();
        let mut f = filters();
        f.tags = ["interactive".to_string()].into_iter().collect();
        let (page, _) = e.search("", &f).unwrap();
        let ids: Vec<&str> = page.components.iter().map(|c| c.id.as_str()).collect();
        assert!(ids.contains(&"button-primary"));
        assert!(ids.contains(&"modal-dialog"));
    }

    #[test]
    fn has_demo_filter() {
        let mut e = engine();
        let mut f = filters();
        f.has_demo = Some(false);
        let (page, _) = e.search("", &f).unwrap();
        assert!(page.components.iter().all(|c| !c.has_demo()));
    }

    #[test]
    fn updated_after_filter() {
        let mut e = engine();
        let mut f = filters();
        f.updated_after = Some(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap());
        let (page, _) = e.search("", &f).unwrap();
        let ids: Vec<&str> = page.components.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"select-multi"));
        assert!(ids.contains(&"modal-dialog"));
    }

    #[test]
    fn sort_by_name_ascending_is_stable() {
        let mut e = engine();
        let mut f = filters();
        f.sort_by = Some(SortBy::Name);
        f.sort_order = Some(SortOrder::Asc);
        f.limit = Some(50);
        let (page, _) = e.search("", &f).unwrap();
        let names: Vec<&str> = page.components.iter().map(|c| c.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn pagination_law_holds() {
        let mut e = engine();
        let total = e.component_count();

        for (limit, offset) in [(3usize, 0usize), (3, 3), (3, total - 1), (3, total + 5), (50, 0)] {
            let mut f = filters();
            f.limit = Some(limit);
            f.offset = Some(offset);
            let (page, _) = e.search("", &f).unwrap();
            let expected = limit.min(total.saturating_sub(offset));
            assert_eq!(page.components.len(), expected, "limit={limit} offset={offset}");
            assert_eq!(page.has_more, offset + page.components.len() < total);
        }
    }

    #[test]
    fn limit_is_clamped() {
        let mut e = engine();
        let mut f = filters();
        f.limit = Some(500);
        let (page, _) = e.search("", &f).unwrap();
        assert_eq!(page.limit, MAX_LIMIT);
        f.limit = Some(0);
        let (page, _) = e.search("", &f).unwrap();
        assert_eq!(page.limit, MIN_LIMIT);
    }

    #[test]
    fn browse_category_returns_all_within_limit() {
        let mut e = engine();
        let (page, cached) = e.browse_category("buttons", Some(10), None).unwrap();
        assert!(!cached);
        assert_eq!(page.components.len(), 2);
        assert_eq!(page.total, 2);
        assert!(!page.has_more);

        let (_, cached) = e.browse_category("buttons", Some(10), None).unwrap();
        assert!(cached);
    }

    #[test]
    fn browse_unknown_category_is_an_empty_page() {
        let mut e = engine();
        let (page, _) = e.browse_category("ghosts", None, None).unwrap();
        assert_eq!(page.total, 0);
        assert!(page.components.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn categories_are_sorted_by_priority() {
        let e = engine();
        let categories = e.list_categories();
        assert!(!categories.is_empty());
        assert!(categories.windows(2).all(|w| w[0].priority <= w[1].priority));
    }

    #[test]
    fn get_by_id_caches_and_misses_cleanly() {
        let mut e = engine();
        let (found, cached) = e.get_by_id("modal-dialog").unwrap();
        assert!(found.is_some());
        assert!(!cached);

        let (found, cached) = e.get_by_id("modal-dialog").unwrap();
        assert!(found.is_some());
        assert!(cached);

        let (missing, _) = e.get_by_id("no-such-id").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn get_random_draws_from_the_snapshot() {
        let mut e = engine();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let component = e.get_random(&mut rng).unwrap();
            assert!(e.get_by_id(&component.id).unwrap().0.is_some());
        }
    }

    #[test]
    fn uninitialized_engine_serves_empty_pages() {
        let mut e = CatalogSearchEngine::new(8, Duration::from_secs(60), None).unwrap();
        assert!(!e.is_ready());
        let (page, _) = e.search("anything", &filters()).unwrap();
        assert_eq!(page.total, 0);
        assert!(e.get_random(&mut StdRng::seed_from_u64(1)).is_none());
    }

    #[test]
    fn install_snapshot_drops_stale_pages() {
        let mut e = engine();
        let _ = e.search("button", &filters()).unwrap();

        let SnapshotBuild { snapshot, .. } = crate::catalog::CatalogSnapshot::build(
            builtin_snapshot().components()[..1].to_vec(),
            vec![],
        );
        e.install_snapshot(snapshot.unwrap());

        let (page, cached) = e.search("", &filters()).unwrap();
        assert!(!cached);
        assert_eq!(page.total, 1);
    }
}
