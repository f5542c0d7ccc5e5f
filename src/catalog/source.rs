use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::error::Result;

use super::{Category, Component, Difficulty, SnapshotBuild};
use super::snapshot::CatalogSnapshot;

/// Where fresh snapshots come from. A non-success refresh leaves the caller's
/// current snapshot in place.
#[async_trait]
pub trait ExtractionSource: Send + Sync {
    async fn refresh(&self) -> Result<CatalogSnapshot>;
}

/// Source that always serves the same pre-built snapshot. Backs the default
/// component set and most tests.
pub struct StaticSource {
    snapshot: CatalogSnapshot,
}

impl StaticSource {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ExtractionSource for StaticSource {
    async fn refresh(&self) -> Result<CatalogSnapshot> {
        Ok(self.snapshot.clone())
    }
}

/// The built-in component set used when no catalog directory is configured.
/// The service never starts with zero data.
pub fn builtin_snapshot() -> CatalogSnapshot {
    let SnapshotBuild { snapshot, problems } =
        CatalogSnapshot::build(builtin_components(), builtin_categories());
    debug_assert!(problems.is_empty());
    snapshot.expect("built-in component set is non-empty")
}

fn tags(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn builtin_components() -> Vec<Component> {
    let updated = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap();
    vec![
        Component {
            id: "button-primary".to_string(),
            name: "Primary Button".to_string(),
            description: "Filled call-to-action button with hover and focus states".to_string(),
            category: "buttons".to_string(),
            tags: tags(&["button", "cta", "interactive"]),
            difficulty: Difficulty::Beginner,
            dependencies: vec![],
            last_updated: updated(2025, 6, 2),
            demo_url: Some("https://componentry.dev/demo/button-primary".to_string()),
            code_preview: "<button class=\"btn btn-primary\">Save</button>".to_string(),
            full_code: None,
        },
        Component {
            id: "button-ghost".to_string(),
            name: "Ghost Button".to_string(),
            description: "Borderless secondary action button".to_string(),
            category: "buttons".to_string(),
            tags: tags(&["button", "secondary"]),
            difficulty: Difficulty::Beginner,
            dependencies: vec![],
            last_updated: updated(2025, 4, 18),
            demo_url: None,
            code_preview: "<button class=\"btn btn-ghost\">Cancel</button>".to_string(),
            full_code: None,
        },
        Component {
            id: "input-text".to_string(),
            name: "Text Input".to_string(),
            description: "Labelled single-line text input with validation message slot".to_string(),
            category: "forms".to_string(),
            tags: tags(&["input", "form", "validation"]),
            difficulty: Difficulty::Beginner,
            dependencies: vec![],
            last_updated: updated(2025, 5, 11),
            demo_url: Some("https://componentry.dev/demo/input-text".to_string()),
            code_preview: "<label>Name<input type=\"text\" /></label>".to_string(),
            full_code: None,
        },
        Component {
            id: "select-multi".to_string(),
            name: "Multi Select".to_string(),
            description: "Searchable multi-select dropdown with keyboard navigation".to_string(),
            category: "forms".to_string(),
            tags: tags(&["select", "form", "dropdown", "a11y"]),
            difficulty: Difficulty::Advanced,
            dependencies: strings(&["popper"]),
            last_updated: updated(2025, 7, 29),
            demo_url: Some("https://componentry.dev/demo/select-multi".to_string()),
            code_preview: "<div class=\"multi-select\" role=\"listbox\">…</div>".to_string(),
            full_code: None,
        },
        Component {
            id: "navbar-responsive".to_string(),
            name: "Responsive Navbar".to_string(),
            description: "Top navigation bar collapsing to a burger menu".to_string(),
            category: "navigation".to_string(),
            tags: tags(&["nav", "responsive", "menu"]),
            difficulty: Difficulty::Intermediate,
            dependencies: vec![],
            last_updated: updated(2025, 3, 7),
            demo_url: Some("https://componentry.dev/demo/navbar-responsive".to_string()),
            code_preview: "<nav class=\"navbar\"><ul class=\"nav-links\">…</ul></nav>".to_string(),
            full_code: None,
        },
        Component {
            id: "breadcrumbs".to_string(),
            name: "Breadcrumbs".to_string(),
            description: "Hierarchical location trail with overflow collapsing".to_string(),
            category: "navigation".to_string(),
            tags: tags(&["nav", "trail"]),
            difficulty: Difficulty::Beginner,
            dependencies: vec![],
            last_updated: updated(2025, 1, 22),
            demo_url: None,
            code_preview: "<nav aria-label=\"breadcrumb\"><ol>…</ol></nav>".to_string(),
            full_code: None,
        },
        Component {
            id: "modal-dialog".to_string(),
            name: "Modal Dialog".to_string(),
            description: "Focus-trapping modal with backdrop and escape-to-close".to_string(),
            category: "overlays".to_string(),
            tags: tags(&["modal", "dialog", "a11y", "interactive"]),
            difficulty: Difficulty::Intermediate,
            dependencies: strings(&["focus-trap"]),
            last_updated: updated(2025, 8, 3),
            demo_url: Some("https://componentry.dev/demo/modal-dialog".to_string()),
            code_preview: "<dialog class=\"modal\"><div class=\"modal-body\">…</div></dialog>"
                .to_string(),
            full_code: None,
        },
        Component {
            id: "toast-stack".to_string(),
            name: "Toast Stack".to_string(),
            description: "Stacked transient notifications with auto-dismiss".to_string(),
            category: "overlays".to_string(),
            tags: tags(&["toast", "notification"]),
            difficulty: Difficulty::Intermediate,
            dependencies: vec![],
            last_updated: updated(2025, 2, 14),
            demo_url: None,
            code_preview: "<div class=\"toast-stack\" aria-live=\"polite\">…</div>".to_string(),
            full_code: None,
        },
    ]
}

fn builtin_categories() -> Vec<Category> {
    let category = |id: &str, name: &str, description: &str, count, icon: &str, priority| Category {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        component_count: count,
        subcategories: vec![],
        icon: icon.to_string(),
        priority,
    };
    vec![
        category("buttons", "Buttons", "Clickable action elements", 2, "cursor-click", 1),
        category("forms", "Forms", "Inputs and form controls", 2, "pencil", 2),
        category("navigation", "Navigation", "Wayfinding and menus", 2, "map", 3),
        category("overlays", "Overlays", "Modals, toasts and popovers", 2, "layers", 4),
    ]
}
