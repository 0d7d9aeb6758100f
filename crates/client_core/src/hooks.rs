//! Side-effect seams: alerts and dialogs are rendered elsewhere, the core only
//! signals them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::error::RepositoryFailure;
use tracing::{debug, info, warn};

use crate::actions::{OutcomePayload, Verb};

pub trait Notifier: Send + Sync {
    fn succeeded(&self, verb: Verb, collection: &str, payload: &OutcomePayload);
    fn failed(&self, verb: Verb, collection: &str, failure: &RepositoryFailure);
}

/// Writes alerts to the log instead of a UI.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn succeeded(&self, verb: Verb, collection: &str, _payload: &OutcomePayload) {
        info!(verb = verb.as_str(), collection, "alert: operation succeeded");
    }

    fn failed(&self, verb: Verb, collection: &str, failure: &RepositoryFailure) {
        warn!(
            verb = verb.as_str(),
            collection,
            code = ?failure.code,
            status = ?failure.status,
            "alert: {}",
            failure.message
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backdrop {
    #[default]
    Dismissable,
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DialogOptions {
    pub centered: bool,
    pub backdrop: Backdrop,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aria_labelled_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogRequest {
    pub component: String,
    #[serde(default)]
    pub inputs: Value,
    #[serde(default)]
    pub options: DialogOptions,
}

pub trait DialogController: Send + Sync {
    fn open(&self, request: DialogRequest);
    fn close(&self);
}

pub struct MissingDialogController;

impl DialogController for MissingDialogController {
    fn open(&self, request: DialogRequest) {
        debug!(component = %request.component, "no dialog controller; open ignored");
    }

    fn close(&self) {
        debug!("no dialog controller; close ignored");
    }
}
