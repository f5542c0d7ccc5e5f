use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use tracing::{info, warn};

use crate::error::{CatalogError, Result};

use super::snapshot::CatalogSnapshot;
use super::{Category, Component, ExtractionSource, SnapshotBuild};

/// Backing store for full component records, keyed by component id.
pub trait ComponentStore: Send + Sync {
    /// Full record for the id, or None when the store has never heard of it.
    fn load(&self, id: &str) -> Result<Option<Component>>;
}

/// Store reading a catalog directory:
///
/// ```text
/// <root>/categories.json          Vec<Category>
/// <root>/component_<id>.json      one full Component per file
/// ```
#[derive(Debug, Clone)]
pub struct DirComponentStore {
    root: PathBuf,
}

impl DirComponentStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(CatalogError::Cache(format!(
                "{} is not a valid directory",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_owned(),
        })
    }

    fn component_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("component_{id}.json"))
    }

    /// Parse every component file plus `categories.json` and assemble a
    /// checked snapshot.
    pub fn load_snapshot(&self) -> Result<SnapshotBuild> {
        let filename_regex = Regex::new("^component_([a-zA-Z0-9\\-_]+)\\.json$")
            .map_err(|e| CatalogError::Cache(e.to_string()))?;

        let mut components = Vec::new();
        let entries = std::fs::read_dir(&self.root)
            .map_err(|e| CatalogError::Cache(format!("{}: {e}", self.root.display())))?;
        for entry in entries {
            let path = entry
                .map_err(|e| CatalogError::Cache(e.to_string()))?
                .path();
            let Some(filename) = path.file_name().map(|f| f.to_string_lossy().into_owned())
            else {
                continue;
            };
            let Some(captures) = filename_regex.captures(&filename) else {
                continue;
            };
            let filename_id = &captures[1];

            let component = read_component(&path)?;
            if component.id != filename_id {
                return Err(CatalogError::Cache(format!(
                    "file {filename} implies component id {filename_id}, but the parsed record has id {}",
                    component.id
                )));
            }
            components.push(component);
        }

        let categories = read_categories(&self.root.join("categories.json"))?;
        Ok(CatalogSnapshot::build(components, categories))
    }
}

impl ComponentStore for DirComponentStore {
    fn load(&self, id: &str) -> Result<Option<Component>> {
        let path = self.component_path(id);
        if !path.is_file() {
            return Ok(None);
        }
        read_component(&path).map(Some)
    }
}

/// Re-scanning the directory is this store's refresh.
#[async_trait]
impl ExtractionSource for DirComponentStore {
    async fn refresh(&self) -> Result<CatalogSnapshot> {
        let SnapshotBuild { snapshot, problems } = self.load_snapshot()?;
        for problem in &problems {
            warn!("catalog problem: {problem:?}");
        }
        snapshot.ok_or_else(|| {
            CatalogError::Cache(format!("no components in {}", self.root.display()))
        })
    }
}

fn read_component(path: &Path) -> Result<Component> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CatalogError::Cache(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CatalogError::Cache(format!("{}: {e}", path.display())))
}

fn read_categories(path: &Path) -> Result<Vec<Category>> {
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| CatalogError::Cache(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CatalogError::Cache(format!("{}: {e}", path.display())))
}

/// Load a snapshot from a directory, logging any integrity problems found.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<CatalogSnapshot> {
    let store = DirComponentStore::new(path)?;
    let SnapshotBuild { snapshot, problems } = store.load_snapshot()?;

    if !problems.is_empty() {
        info!("Found {} problems:", problems.len());
        for problem in problems.iter() {
            info!("- {problem:?}");
        }
    }

    match (&snapshot, problems.is_empty()) {
        (Some(_), true) => info!("Catalog checked, no issues found."),
        (Some(_), false) => info!(
            "Catalog was built, but check the {} non-fatal issues above.",
            problems.len()
        ),
        (None, _) => info!(
            "Check the {} problems above, the catalog could not be initialized.",
            problems.len()
        ),
    }
    if let Some(snapshot) = snapshot {
        info!(
            "Catalog has {} components in {} categories",
            snapshot.component_count(),
            snapshot.category_count()
        );
        return Ok(snapshot);
    }

    Err(CatalogError::Cache("could not load catalog".to_string()))
}
