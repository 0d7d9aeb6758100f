use super::*;

#[test]
fn parse_keeps_repeated_keys_in_order_and_decodes_values() {
    let params = QueryParams::parse("?sort=name,desc&sort=date&query=ada+lovelace&empty=");

    assert_eq!(params.get_all("sort"), ["name,desc", "date"]);
    assert_eq!(params.get("query"), Some("ada lovelace"));
    assert_eq!(params.get("empty"), Some(""));
    assert_eq!(params.get_non_empty("empty"), None);
    assert!(params.get_all("missing").is_empty());
}

#[test]
fn query_string_round_trips() {
    let params = QueryParams::new()
        .with("facets", "type,status")
        .with("type.filter", "a&b")
        .with("sort", "name,asc")
        .with("sort", "date,desc");

    assert_eq!(QueryParams::parse(&params.to_query_string()), params);
}

#[test]
fn snapshot_splits_path_and_query() {
    let snapshot = RouterStateSnapshot::parse("/discovery/People?collection=persons");

    assert_eq!(snapshot.url, "/discovery/People");
    assert_eq!(snapshot.query_params.get("collection"), Some("persons"));
    assert!(RouterStateSnapshot::parse("/admin").query_params.is_empty());
}

#[test]
fn route_data_collection_wins_over_query_parameter() {
    let snapshot = RouterStateSnapshot::parse("/admin?collection=persons");
    assert_eq!(snapshot.collection_name(), Some("persons"));

    let routed = snapshot.clone().with_route_collection("documents");
    assert_eq!(routed.collection_name(), Some("documents"));

    assert_eq!(
        RouterStateSnapshot::parse("/admin?collection=").collection_name(),
        None
    );
}
