mod category;
mod component;
mod snapshot;
mod source;
mod store;

pub use category::Category;
pub use component::{
    is_valid_component_id, Component, Difficulty, COMPONENT_ID_MAX_LEN, COMPONENT_ID_PATTERN,
};
pub use snapshot::{CatalogSnapshot, Problem as CatalogProblem, SnapshotBuild};
pub use source::{builtin_snapshot, ExtractionSource, StaticSource};
pub use store::{load_catalog, ComponentStore, DirComponentStore};
