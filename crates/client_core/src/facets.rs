//! Projection of search facet counts into the sidebar menu.

use std::collections::{BTreeMap, HashMap};

use shared::{
    protocol::{Collection, FacetResult},
    router::{QueryParams, RouterStateSnapshot},
    sidebar::{SidebarItem, SidebarMenu, SidebarSection, ToggleTarget},
    view::{FacetDefinition, ViewDefinition, ViewMode},
};
use tracing::{debug, warn};

/// Typed store of the view definitions loaded from the reserved collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewCatalog {
    views: HashMap<ViewMode, BTreeMap<String, ViewDefinition>>,
}

impl ViewCatalog {
    pub fn replace(&mut self, mode: ViewMode, views: impl IntoIterator<Item = ViewDefinition>) {
        self.views.insert(
            mode,
            views
                .into_iter()
                .map(|view| (view.name.clone(), view))
                .collect(),
        );
    }

    /// Decodes the items of a reserved collection; items that are not view
    /// definitions are skipped.
    pub fn decode(mode: ViewMode, collection: &Collection) -> Vec<ViewDefinition> {
        collection
            .items
            .iter()
            .filter_map(|item| {
                let value = match serde_json::to_value(item) {
                    Ok(value) => value,
                    Err(err) => {
                        warn!(?mode, "unreadable view definition: {err}");
                        return None;
                    }
                };
                match serde_json::from_value::<ViewDefinition>(value) {
                    Ok(view) => Some(view),
                    Err(err) => {
                        warn!(?mode, "skipping malformed view definition: {err}");
                        None
                    }
                }
            })
            .collect()
    }

    pub fn is_loaded(&self, mode: ViewMode) -> bool {
        self.views.get(&mode).is_some_and(|views| !views.is_empty())
    }

    pub fn view(&self, mode: ViewMode, name: &str) -> Option<&ViewDefinition> {
        self.views.get(&mode)?.get(name)
    }

    pub fn facets_for(&self, mode: ViewMode, name: &str) -> Option<&[FacetDefinition]> {
        self.view(mode, name).map(|view| view.facets.as_slice())
    }
}

/// Builds the sidebar for a successful search, or `None` when the router has no
/// active `collection` query parameter or no `view` route parameter.
pub fn project(
    result: &Collection,
    router: &RouterStateSnapshot,
    views: &ViewCatalog,
) -> Option<SidebarMenu> {
    router.query_params.get_non_empty("collection")?;
    let Some(view) = router.params.get("view").filter(|view| !view.is_empty()) else {
        debug!(url = %router.url, "no active view; sidebar skipped");
        return None;
    };

    let definitions: &[FacetDefinition] = match ViewMode::from_path(&router.url) {
        Some(mode) => match views.facets_for(mode, view) {
            Some(definitions) => definitions,
            None => {
                warn!(?mode, view = %view, "unknown view; sidebar skipped");
                return None;
            }
        },
        None => &[],
    };

    Some(build_menu(definitions, &result.facets, &router.query_params))
}

pub fn build_menu(
    definitions: &[FacetDefinition],
    results: &[FacetResult],
    query: &QueryParams,
) -> SidebarMenu {
    let sections = definitions
        .iter()
        .filter(|definition| !definition.hidden)
        .filter_map(|definition| {
            let result = results
                .iter()
                .find(|result| result.field == definition.field)?;
            Some(build_section(definition, result, query))
        })
        .collect();

    SidebarMenu {
        sections,
        open: true,
    }
}

fn build_section(
    definition: &FacetDefinition,
    result: &FacetResult,
    query: &QueryParams,
) -> SidebarSection {
    let items = result
        .entries
        .iter()
        .map(|entry| {
            let selected = is_selected(query, &entry.value);
            let mut toggle_target = ToggleTarget::new();
            toggle_target.insert(
                filter_key(&result.field),
                (!selected).then(|| entry.value.clone()),
            );
            SidebarItem {
                label: entry.value.clone(),
                selected,
                total: entry.count,
                toggle_target,
            }
        })
        .collect();

    SidebarSection {
        title: definition.name.clone(),
        items,
        collapsible: true,
        collapsed: false,
    }
}

/// True when any active facet's filter equals `value`, whichever field that
/// filter belongs to. Cross-field matches are intentional.
pub fn is_selected(query: &QueryParams, value: &str) -> bool {
    let Some(active) = query.get("facets") else {
        return false;
    };
    active
        .split(',')
        .any(|field| query.get(&filter_key(field)) == Some(value))
}

pub fn filter_key(field: &str) -> String {
    format!("{field}.filter")
}

/// Query parameters a navigation through `target` ends up with.
pub fn apply_toggle(query: &QueryParams, target: &ToggleTarget) -> QueryParams {
    let mut next = query.clone();
    for (key, value) in target {
        match value {
            Some(value) => next.set(key.clone(), value.clone()),
            None => {
                next.remove(key);
            }
        }
    }
    next
}

#[cfg(test)]
#[path = "tests/facets_tests.rs"]
mod tests;
