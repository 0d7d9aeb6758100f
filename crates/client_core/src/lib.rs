//! Navigation orchestration core: turns router changes and user intents into
//! repository calls, sidebar menus and live-update subscriptions.

pub mod actions;
pub mod facets;
pub mod hooks;
pub mod live_updates;
pub mod orchestrator;
pub mod query;
pub mod readiness;
pub mod registry;
pub mod rest;

pub use actions::{Intent, OrchestratorEvent, Outcome, OutcomePayload, Verb};
pub use hooks::{DialogController, DialogRequest, Notifier};
pub use live_updates::{ConnectionState, LocalPushChannel, PushChannel};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use registry::{Repository, RepositoryRegistry, RepositoryResult};
pub use rest::RestRepository;
