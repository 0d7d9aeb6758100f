use super::*;
use shared::protocol::{FacetEntry, Resource};

fn facet(field: &str, entries: &[(&str, u64)]) -> FacetResult {
    FacetResult {
        field: field.to_string(),
        entries: entries
            .iter()
            .map(|(value, count)| FacetEntry::new(*value, *count))
            .collect(),
    }
}

fn catalog() -> ViewCatalog {
    let mut catalog = ViewCatalog::default();
    catalog.replace(
        ViewMode::Discovery,
        [ViewDefinition {
            name: "People".into(),
            facets: vec![
                FacetDefinition::new("type", "Type", false),
                FacetDefinition::new("status", "Status", true),
            ],
        }],
    );
    catalog
}

#[test]
fn hidden_definitions_produce_no_section_and_order_is_kept() {
    let definitions = [
        FacetDefinition::new("type", "Type", false),
        FacetDefinition::new("status", "Status", true),
    ];
    let results = [
        facet("status", &[("draft", 3)]),
        facet("type", &[("person", 10), ("org", 2)]),
    ];

    let menu = build_menu(&definitions, &results, &QueryParams::new());

    assert!(menu.open);
    assert_eq!(menu.sections.len(), 1);
    let section = &menu.sections[0];
    assert_eq!(section.title, "Type");
    assert!(section.collapsible);
    assert!(!section.collapsed);
    let labels: Vec<&str> = section.items.iter().map(|i| i.label.as_str()).collect();
    assert_eq!(labels, ["person", "org"]);
    assert_eq!(section.items[0].total, 10);
}

#[test]
fn unmatched_definitions_are_skipped_and_first_result_wins() {
    let definitions = [
        FacetDefinition::new("missing", "Missing", false),
        FacetDefinition::new("type", "Type", false),
    ];
    let results = [facet("type", &[("a", 1)]), facet("type", &[("b", 2)])];

    let menu = build_menu(&definitions, &results, &QueryParams::new());

    assert_eq!(menu.sections.len(), 1);
    assert_eq!(menu.sections[0].items[0].label, "a");
}

#[test]
fn toggling_an_entry_adds_then_removes_its_filter() {
    let definitions = [FacetDefinition::new("status", "Status", false)];
    let results = [facet("status", &[("draft", 3)])];
    let query = QueryParams::new().with("facets", "status");

    let menu = build_menu(&definitions, &results, &query);
    let item = &menu.sections[0].items[0];
    assert!(!item.selected);
    assert_eq!(
        item.toggle_target.get("status.filter"),
        Some(&Some("draft".to_string()))
    );

    let query = apply_toggle(&query, &item.toggle_target);
    assert_eq!(query.get("status.filter"), Some("draft"));

    let menu = build_menu(&definitions, &results, &query);
    let item = &menu.sections[0].items[0];
    assert!(item.selected);
    assert_eq!(item.toggle_target.get("status.filter"), Some(&None));

    let query = apply_toggle(&query, &item.toggle_target);
    assert!(!query.contains("status.filter"));
    assert_eq!(query.get("facets"), Some("status"));
}

#[test]
fn selection_matches_any_active_facet_filter() {
    let query = QueryParams::new()
        .with("facets", "type,status")
        .with("type.filter", "open");

    assert!(is_selected(&query, "open"));
    // `status` has no filter, but the `type` filter value still matches.
    let definitions = [FacetDefinition::new("status", "Status", false)];
    let menu = build_menu(&definitions, &[facet("status", &[("open", 1)])], &query);
    assert!(menu.sections[0].items[0].selected);
}

#[test]
fn selection_requires_an_active_facets_parameter() {
    let query = QueryParams::new().with("type.filter", "open");
    assert!(!is_selected(&query, "open"));
}

#[test]
fn project_uses_view_definitions_for_the_active_root() {
    let router = RouterStateSnapshot::parse("/discovery/People?collection=persons&facets=type")
        .with_param("view", "People");
    let result = Collection {
        facets: vec![facet("type", &[("person", 4)]), facet("status", &[("x", 1)])],
        ..Collection::default()
    };

    let menu = project(&result, &router, &catalog()).expect("menu");
    assert_eq!(menu.sections.len(), 1);
    assert_eq!(menu.sections[0].title, "Type");
}

#[test]
fn project_skips_without_view_or_collection_parameter() {
    let result = Collection::default();

    let no_view = RouterStateSnapshot::parse("/discovery/People?collection=persons");
    assert!(project(&result, &no_view, &catalog()).is_none());

    let no_collection =
        RouterStateSnapshot::parse("/discovery/People").with_param("view", "People");
    assert!(project(&result, &no_collection, &catalog()).is_none());

    let unknown_view = RouterStateSnapshot::parse("/discovery/Nope?collection=persons")
        .with_param("view", "Nope");
    assert!(project(&result, &unknown_view, &catalog()).is_none());
}

#[test]
fn project_outside_faceted_roots_yields_an_empty_open_menu() {
    let router =
        RouterStateSnapshot::parse("/admin/users?collection=users").with_param("view", "Users");
    let menu = project(&Collection::default(), &router, &catalog()).expect("menu");
    assert!(menu.sections.is_empty());
    assert!(menu.open);
}

#[test]
fn catalog_decodes_view_items_and_skips_malformed_ones() {
    let collection = Collection {
        items: vec![
            Resource::with_id("1")
                .attribute("name", "People")
                .attribute(
                    "facets",
                    serde_json::json!([{ "field": "type", "name": "Type" }]),
                ),
            Resource::with_id("2").attribute("label", "no name"),
        ],
        ..Collection::default()
    };

    let views = ViewCatalog::decode(ViewMode::Directory, &collection);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].facets, [FacetDefinition::new("type", "Type", false)]);

    let mut catalog = ViewCatalog::default();
    assert!(!catalog.is_loaded(ViewMode::Directory));
    catalog.replace(ViewMode::Directory, views);
    assert!(catalog.is_loaded(ViewMode::Directory));
    assert!(catalog.facets_for(ViewMode::Directory, "People").is_some());
}
