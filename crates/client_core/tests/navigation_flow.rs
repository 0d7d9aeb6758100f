use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use client_core::{
    facets::apply_toggle, ConnectionState, LocalPushChannel, Orchestrator, OrchestratorConfig,
    OrchestratorEvent, Repository, RepositoryRegistry, RepositoryResult,
};
use serde_json::json;
use shared::{
    protocol::{Collection, FacetEntry, FacetResult, Frame, Resource, ResourceId},
    request::Request,
    router::RouterStateSnapshot,
    sidebar::SidebarMenu,
};
use tokio::sync::broadcast;

/// Read-only repository serving a fixed collection.
struct InMemoryRepository {
    collection: Collection,
}

impl InMemoryRepository {
    fn shared(collection: Collection) -> Arc<dyn Repository> {
        Arc::new(Self { collection })
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_all(&self) -> RepositoryResult<Collection> {
        Ok(self.collection.clone())
    }

    async fn search(&self, _request: &Request) -> RepositoryResult<Collection> {
        Ok(self.collection.clone())
    }

    async fn create(&self, resource: Resource) -> RepositoryResult<Resource> {
        Ok(resource)
    }

    async fn replace(&self, resource: Resource) -> RepositoryResult<Resource> {
        Ok(resource)
    }

    async fn patch(&self, resource: Resource) -> RepositoryResult<Resource> {
        Ok(resource)
    }

    async fn remove(&self, _id: &ResourceId) -> RepositoryResult<()> {
        Ok(())
    }
}

fn people_views() -> Collection {
    Collection {
        items: vec![Resource::with_id("people")
            .attribute("name", "People")
            .attribute(
                "facets",
                json!([
                    { "field": "type", "name": "Type" },
                    { "field": "internal", "name": "Internal", "hidden": true }
                ]),
            )],
        ..Collection::default()
    }
}

fn persons() -> Collection {
    Collection {
        items: vec![Resource::with_id("1").attribute("name", "Ada")],
        facets: vec![
            FacetResult {
                field: "type".into(),
                entries: vec![FacetEntry::new("person", 3), FacetEntry::new("org", 1)],
            },
            FacetResult {
                field: "internal".into(),
                entries: vec![FacetEntry::new("yes", 4)],
            },
        ],
        ..Collection::default()
    }
}

async fn wait_for<T>(
    events: &mut broadcast::Receiver<OrchestratorEvent>,
    pick: impl Fn(OrchestratorEvent) -> Option<T>,
) -> T {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(found) = pick(event) {
                        return found;
                    }
                }
                Err(err) => panic!("event stream ended: {err}"),
            }
        }
    })
    .await
    .expect("event within timeout")
}

fn sidebar(event: OrchestratorEvent) -> Option<SidebarMenu> {
    match event {
        OrchestratorEvent::SidebarLoaded(menu) => Some(menu),
        _ => None,
    }
}

#[tokio::test]
async fn faceted_navigation_builds_sidebar_and_follows_live_updates() {
    let push = Arc::new(LocalPushChannel::new());
    let connection = ConnectionState::new(false);
    let registry = RepositoryRegistry::from_table([
        ("directoryViews", InMemoryRepository::shared(people_views())),
        ("discoveryViews", InMemoryRepository::shared(people_views())),
        ("persons", InMemoryRepository::shared(persons())),
    ]);
    let orchestrator = Orchestrator::new_with_dependencies(
        registry,
        push.clone(),
        connection.clone(),
        Arc::new(client_core::hooks::TracingNotifier),
        Arc::new(client_core::hooks::MissingDialogController),
        OrchestratorConfig {
            readiness_timeout: Duration::from_secs(3),
        },
    );
    let mut events = orchestrator.subscribe_events();

    for handle in orchestrator.start() {
        handle.await.expect("join");
    }

    let route = RouterStateSnapshot::parse("/discovery/People?collection=persons&facets=type")
        .with_param("view", "People");
    orchestrator
        .navigate(route.clone())
        .expect("search issued")
        .await
        .expect("join");

    // The sidebar waits for the push connection.
    tokio::time::sleep(Duration::from_millis(50)).await;
    connection.set_ready(true);

    let menu = wait_for(&mut events, sidebar).await;
    assert_eq!(menu.sections.len(), 1);
    let section = &menu.sections[0];
    assert_eq!(section.title, "Type");
    assert_eq!(section.items[0].label, "person");
    assert_eq!(section.items[0].total, 3);
    assert!(!section.items[0].selected);

    let channel = wait_for(&mut events, |event| match event {
        OrchestratorEvent::Subscribed {
            collection,
            channel,
        } if collection == "persons" => Some(channel),
        _ => None,
    })
    .await;
    assert_eq!(channel, "queue/persons");

    assert!(push.publish("queue/persons", Frame::message(r#"{"id":"1"}"#)));
    let changed = wait_for(&mut events, |event| match event {
        OrchestratorEvent::ResourceChanged { collection, frame } => Some((collection, frame)),
        _ => None,
    })
    .await;
    assert_eq!(changed.0, "persons");
    assert_eq!(changed.1.body, r#"{"id":"1"}"#);

    let mut toggled = route.clone();
    toggled.query_params = apply_toggle(&route.query_params, &section.items[0].toggle_target);
    orchestrator
        .navigate(toggled)
        .expect("search issued")
        .await
        .expect("join");

    let menu = wait_for(&mut events, sidebar).await;
    assert!(menu.sections[0].items[0].selected);
    assert_eq!(
        menu.sections[0].items[0].toggle_target.get("type.filter"),
        Some(&None)
    );
    assert!(orchestrator
        .live_updates()
        .channels()
        .await
        .contains(&"queue/persons".to_string()));
}
