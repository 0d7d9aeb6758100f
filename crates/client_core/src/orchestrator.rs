use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex as StdMutex, PoisonError,
    },
    time::Duration,
};

use shared::{
    protocol::{Collection, Frame},
    router::RouterStateSnapshot,
    view::ViewMode,
};
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    actions::{Intent, OrchestratorEvent, Outcome, OutcomePayload, Verb},
    facets::{self, ViewCatalog},
    hooks::{DialogController, DialogRequest, MissingDialogController, Notifier, TracingNotifier},
    live_updates::{ConnectionState, FrameHandler, LiveUpdateSubscriber, PushChannel, SubscribeOutcome},
    query,
    readiness::ReadinessBarrier,
    registry::{Handler, HandlerTable, RepositoryRegistry},
};

const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on the sidebar's wait for router, view definitions and connection.
    pub readiness_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
        }
    }
}

/// Supersession scope of a read. Reserved view collections each own one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Family {
    Read(Verb),
    ViewDefinitions(ViewMode),
}

impl Family {
    fn of(verb: Verb, handler: Handler) -> Self {
        match handler {
            Handler::ViewDefinitions(mode) => Family::ViewDefinitions(mode),
            Handler::Generic => Family::Read(verb),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    family: Family,
    generation: u64,
}

#[derive(Default)]
struct Generations {
    current: StdMutex<HashMap<Family, u64>>,
}

impl Generations {
    fn begin(&self, family: Family) -> Ticket {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = current.entry(family).or_insert(0);
        *generation += 1;
        Ticket {
            family,
            generation: *generation,
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&ticket.family)
            == Some(&ticket.generation)
    }
}

struct Prepared {
    intent: Intent,
    handler: Handler,
    ticket: Option<Ticket>,
    /// Router state a search was issued under; its sidebar is projected against it.
    origin: Option<RouterStateSnapshot>,
}

pub struct Orchestrator {
    registry: RepositoryRegistry,
    handlers: HandlerTable,
    live_updates: LiveUpdateSubscriber,
    connection: ConnectionState,
    notifier: Arc<dyn Notifier>,
    dialogs: Arc<dyn DialogController>,
    config: OrchestratorConfig,
    generations: Generations,
    router: watch::Sender<Option<RouterStateSnapshot>>,
    views: watch::Sender<ViewCatalog>,
    started: AtomicBool,
    events: broadcast::Sender<OrchestratorEvent>,
}

impl Orchestrator {
    pub fn new(
        registry: RepositoryRegistry,
        push: Arc<dyn PushChannel>,
        connection: ConnectionState,
    ) -> Arc<Self> {
        Self::new_with_dependencies(
            registry,
            push,
            connection,
            Arc::new(TracingNotifier),
            Arc::new(MissingDialogController),
            OrchestratorConfig::default(),
        )
    }

    pub fn new_with_dependencies(
        registry: RepositoryRegistry,
        push: Arc<dyn PushChannel>,
        connection: ConnectionState,
        notifier: Arc<dyn Notifier>,
        dialogs: Arc<dyn DialogController>,
        config: OrchestratorConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(1024);
        let (router, _) = watch::channel(None);
        let (views, _) = watch::channel(ViewCatalog::default());
        Arc::new(Self {
            handlers: HandlerTable::build(&registry),
            registry,
            live_updates: LiveUpdateSubscriber::new(push, connection.clone()),
            connection,
            notifier,
            dialogs,
            config,
            generations: Generations::default(),
            router,
            views,
            started: AtomicBool::new(false),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<OrchestratorEvent> {
        self.events.subscribe()
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn live_updates(&self) -> &LiveUpdateSubscriber {
        &self.live_updates
    }

    pub fn view_catalog(&self) -> ViewCatalog {
        self.views.borrow().clone()
    }

    /// Loads both reserved view collections. Only the first call has an effect.
    pub fn start(self: &Arc<Self>) -> Vec<JoinHandle<Option<Outcome>>> {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("orchestrator already started");
            return Vec::new();
        }
        ViewMode::ALL
            .into_iter()
            .map(|mode| {
                self.dispatch(Intent::List {
                    collection: mode.collection_name().to_string(),
                })
            })
            .collect()
    }

    /// Reacts to a router change: records the snapshot and issues `search` under
    /// a faceted root or `page` elsewhere. Nothing is issued without a collection.
    pub fn navigate(
        self: &Arc<Self>,
        snapshot: RouterStateSnapshot,
    ) -> Option<JoinHandle<Option<Outcome>>> {
        self.router.send_replace(Some(snapshot.clone()));

        let Some(collection) = snapshot.collection_name().map(str::to_string) else {
            debug!(url = %snapshot.url, "navigation without collection");
            return None;
        };
        let request = query::translate(&snapshot.query_params);
        let intent = if ViewMode::from_path(&snapshot.url).is_some() {
            Intent::Search {
                collection,
                request,
            }
        } else {
            Intent::Page {
                collection,
                request,
            }
        };
        Some(self.dispatch(intent))
    }

    pub fn dispatch(self: &Arc<Self>, intent: Intent) -> JoinHandle<Option<Outcome>> {
        let prepared = self.prepare(intent);
        let this = Arc::clone(self);
        tokio::spawn(async move {
            match prepared {
                Some(prepared) => this.execute(prepared).await,
                None => None,
            }
        })
    }

    /// Runs `intent` to completion. `None` when no handler applies or a newer
    /// read of the same family superseded this one.
    pub async fn handle(self: &Arc<Self>, intent: Intent) -> Option<Outcome> {
        let prepared = self.prepare(intent)?;
        self.execute(prepared).await
    }

    pub fn open_dialog(&self, request: DialogRequest) {
        self.dialogs.open(request);
    }

    /// # Panics
    ///
    /// Panics when the intent names an unregistered collection.
    fn prepare(&self, intent: Intent) -> Option<Prepared> {
        let verb = intent.verb();
        let collection = intent.collection();
        self.registry.resolve(collection);
        let Some(handler) = self.handlers.lookup(collection, verb) else {
            debug!(
                verb = verb.as_str(),
                collection, "no handler for intent; ignored"
            );
            return None;
        };
        let ticket = verb
            .is_read()
            .then(|| self.generations.begin(Family::of(verb, handler)));
        let origin = if verb == Verb::Search {
            self.router.borrow().clone()
        } else {
            None
        };
        Some(Prepared {
            intent,
            handler,
            ticket,
            origin,
        })
    }

    async fn execute(self: &Arc<Self>, prepared: Prepared) -> Option<Outcome> {
        let Prepared {
            intent,
            handler,
            ticket,
            origin,
        } = prepared;
        let verb = intent.verb();
        let collection = intent.collection().to_string();
        let repository = Arc::clone(self.registry.resolve(&collection));
        debug!(verb = verb.as_str(), %collection, "dispatching intent");

        let result = match intent {
            Intent::List { .. } => repository.list_all().await.map(OutcomePayload::Collection),
            Intent::Page { request, .. } => repository
                .page(&request)
                .await
                .map(OutcomePayload::Collection),
            Intent::Search { request, .. } => repository
                .search(&request)
                .await
                .map(OutcomePayload::Collection),
            Intent::Create { resource, .. } => repository
                .create(resource)
                .await
                .map(OutcomePayload::Resource),
            Intent::Replace { resource, .. } => repository
                .replace(resource)
                .await
                .map(OutcomePayload::Resource),
            Intent::Patch { resource, .. } => repository
                .patch(resource)
                .await
                .map(OutcomePayload::Resource),
            Intent::Remove { id, .. } => repository
                .remove(&id)
                .await
                .map(|()| OutcomePayload::Removed),
            Intent::Clear { .. } => {
                self.live_updates.clear(&collection).await;
                Ok(OutcomePayload::Cleared)
            }
        };

        if let Some(ticket) = ticket {
            if !self.generations.is_current(&ticket) {
                debug!(verb = verb.as_str(), %collection, "superseded result discarded");
                return None;
            }
        }

        let outcome = match result {
            Ok(payload) => Outcome::Succeeded {
                verb,
                collection,
                payload,
            },
            Err(failure) => Outcome::Failed {
                verb,
                collection,
                failure,
            },
        };
        let _ = self.events.send(OrchestratorEvent::Outcome(outcome.clone()));
        self.react(handler, ticket, origin, &outcome);
        Some(outcome)
    }

    fn react(
        self: &Arc<Self>,
        handler: Handler,
        ticket: Option<Ticket>,
        origin: Option<RouterStateSnapshot>,
        outcome: &Outcome,
    ) {
        match outcome {
            Outcome::Failed {
                verb,
                collection,
                failure,
            } => {
                warn!(verb = verb.as_str(), %collection, "{failure}");
                self.notifier.failed(*verb, collection, failure);
            }
            Outcome::Succeeded {
                verb,
                collection,
                payload,
            } if verb.is_write() => {
                self.dialogs.close();
                self.notifier.succeeded(*verb, collection, payload);
            }
            Outcome::Succeeded {
                verb,
                collection,
                payload: OutcomePayload::Collection(result),
            } => {
                if let Handler::ViewDefinitions(mode) = handler {
                    self.store_views(mode, result);
                }
                let this = Arc::clone(self);
                let collection = collection.clone();
                if *verb == Verb::Search {
                    let result = result.clone();
                    tokio::spawn(async move {
                        this.on_search_success(ticket, origin, &collection, &result)
                            .await
                    });
                } else {
                    tokio::spawn(async move { this.ensure_subscribed(&collection).await });
                }
            }
            Outcome::Succeeded { .. } => {}
        }
    }

    fn store_views(&self, mode: ViewMode, result: &Collection) {
        let views = ViewCatalog::decode(mode, result);
        info!(?mode, count = views.len(), "view definitions loaded");
        self.views.send_modify(|catalog| catalog.replace(mode, views));
    }

    /// Emits the sidebar once every input is ready, unless a newer search was
    /// issued meanwhile, then ensures the subscription.
    async fn on_search_success(
        self: Arc<Self>,
        ticket: Option<Ticket>,
        origin: Option<RouterStateSnapshot>,
        collection: &str,
        result: &Collection,
    ) {
        let mut barrier = ReadinessBarrier::new(
            self.router.subscribe(),
            self.views.subscribe(),
            self.connection.subscribe(),
        );
        match barrier.wait(self.config.readiness_timeout).await {
            Ok(_) if ticket.is_some_and(|ticket| !self.generations.is_current(&ticket)) => {
                debug!(collection, "superseded search; sidebar skipped");
            }
            Ok(ready) => {
                let router = origin.as_ref().unwrap_or(&ready.router);
                match facets::project(result, router, &ready.views) {
                    Some(menu) => {
                        debug!(collection, sections = menu.sections.len(), "sidebar loaded");
                        let _ = self.events.send(OrchestratorEvent::SidebarLoaded(menu));
                    }
                    None => debug!(collection, "sidebar not applicable"),
                }
            }
            Err(timeout) => {
                warn!(collection, pending = ?timeout.pending, "sidebar skipped: {timeout}");
            }
        }
        self.ensure_subscribed(collection).await;
    }

    /// Subscribes the collection's channel once the connection is ready. Inbound
    /// `MESSAGE` frames surface as [`OrchestratorEvent::ResourceChanged`].
    pub async fn ensure_subscribed(&self, collection: &str) {
        let events = self.events.clone();
        let name = collection.to_string();
        let handler: FrameHandler = Arc::new(move |frame: Frame| {
            if frame.is_message() {
                let _ = events.send(OrchestratorEvent::ResourceChanged {
                    collection: name.clone(),
                    frame,
                });
            }
        });

        match self.live_updates.ensure_subscribed(collection, handler).await {
            Ok(SubscribeOutcome::Subscribed { channel }) => {
                let _ = self.events.send(OrchestratorEvent::Subscribed {
                    collection: collection.to_string(),
                    channel,
                });
            }
            Ok(SubscribeOutcome::AlreadySubscribed { .. }) => {}
            Err(err) => warn!(collection, "{err:#}"),
        }
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
