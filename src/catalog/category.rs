use serde::{Deserialize, Serialize};

/// A catalog category. `component_count` is derived from the snapshot and
/// checked against it at build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: String,
    pub component_count: usize,
    #[serde(default)]
    pub subcategories: Vec<String>,
    pub icon: String,
    pub priority: u32,
}
