mod engine;

pub use engine::{
    CatalogSearchEngine, SearchFilters, SearchPage, SortBy, SortOrder, DEFAULT_LIMIT, MAX_LIMIT,
    MIN_LIMIT,
};
