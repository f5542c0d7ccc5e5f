use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::{Category, Component};

/// Non-fatal integrity issue found while building a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    DuplicateComponentId(String),
    UnknownCategory { component_id: String, category: String },
    CategoryCountMismatch { category: String, declared: usize, actual: usize },
}

#[derive(Debug)]
pub struct SnapshotBuild {
    pub snapshot: Option<CatalogSnapshot>,
    pub problems: Vec<Problem>,
}

/// An immutable, checked view of the whole catalog at one point in time.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    components: Vec<Component>,
    categories: Vec<Category>,
    by_id: HashMap<String, usize>,
    fetched_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Check and assemble a snapshot. Duplicate ids keep the first occurrence,
    /// unknown categories keep the component, and declared category counts are
    /// replaced with the derived ones; each case is reported as a [`Problem`].
    /// Only an empty component list fails to produce a snapshot.
    pub fn build(components: Vec<Component>, categories: Vec<Category>) -> SnapshotBuild {
        let mut problems = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut kept: Vec<Component> = Vec::with_capacity(components.len());

        for component in components {
            if by_id.contains_key(&component.id) {
                problems.push(Problem::DuplicateComponentId(component.id.clone()));
                continue;
            }
            by_id.insert(component.id.clone(), kept.len());
            kept.push(component);
        }

        let mut actual_counts: HashMap<&str, usize> = HashMap::new();
        for component in &kept {
            *actual_counts.entry(component.category.as_str()).or_insert(0) += 1;
        }

        for component in &kept {
            if !categories.iter().any(|c| c.id == component.category) {
                problems.push(Problem::UnknownCategory {
                    component_id: component.id.clone(),
                    category: component.category.clone(),
                });
            }
        }

        let mut checked_categories = categories;
        for category in &mut checked_categories {
            let actual = actual_counts.get(category.id.as_str()).copied().unwrap_or(0);
            if category.component_count != actual {
                problems.push(Problem::CategoryCountMismatch {
                    category: category.id.clone(),
                    declared: category.component_count,
                    actual,
                });
                category.component_count = actual;
            }
        }

        let snapshot = if kept.is_empty() {
            None
        } else {
            Some(CatalogSnapshot {
                components: kept,
                categories: checked_categories,
                by_id,
                fetched_at: Utc::now(),
            })
        };
        SnapshotBuild { snapshot, problems }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.by_id.get(id).map(|&i| &self.components[i])
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Replace a component's lazily fetched full code in place.
    pub fn set_full_code(&mut self, id: &str, full_code: String) {
        if let Some(&i) = self.by_id.get(id) {
            self.components[i].full_code = Some(full_code);
        }
    }
}
