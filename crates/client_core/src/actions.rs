use serde::Serialize;
use shared::{
    error::RepositoryFailure,
    protocol::{Collection, Frame, Resource, ResourceId},
    request::Request,
    sidebar::SidebarMenu,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    List,
    Page,
    Search,
    Create,
    Replace,
    Patch,
    Remove,
    Clear,
}

impl Verb {
    pub const ALL: [Verb; 8] = [
        Verb::List,
        Verb::Page,
        Verb::Search,
        Verb::Create,
        Verb::Replace,
        Verb::Patch,
        Verb::Remove,
        Verb::Clear,
    ];

    pub fn is_read(self) -> bool {
        matches!(self, Verb::List | Verb::Page | Verb::Search)
    }

    pub fn is_write(self) -> bool {
        matches!(
            self,
            Verb::Create | Verb::Replace | Verb::Patch | Verb::Remove
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::List => "list",
            Verb::Page => "page",
            Verb::Search => "search",
            Verb::Create => "create",
            Verb::Replace => "replace",
            Verb::Patch => "patch",
            Verb::Remove => "remove",
            Verb::Clear => "clear",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Intent {
    List { collection: String },
    Page { collection: String, request: Request },
    Search { collection: String, request: Request },
    Create { collection: String, resource: Resource },
    Replace { collection: String, resource: Resource },
    Patch { collection: String, resource: Resource },
    Remove { collection: String, id: ResourceId },
    Clear { collection: String },
}

impl Intent {
    pub fn verb(&self) -> Verb {
        match self {
            Intent::List { .. } => Verb::List,
            Intent::Page { .. } => Verb::Page,
            Intent::Search { .. } => Verb::Search,
            Intent::Create { .. } => Verb::Create,
            Intent::Replace { .. } => Verb::Replace,
            Intent::Patch { .. } => Verb::Patch,
            Intent::Remove { .. } => Verb::Remove,
            Intent::Clear { .. } => Verb::Clear,
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Intent::List { collection }
            | Intent::Page { collection, .. }
            | Intent::Search { collection, .. }
            | Intent::Create { collection, .. }
            | Intent::Replace { collection, .. }
            | Intent::Patch { collection, .. }
            | Intent::Remove { collection, .. }
            | Intent::Clear { collection } => collection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OutcomePayload {
    Collection(Collection),
    Resource(Resource),
    Removed,
    Cleared,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded {
        verb: Verb,
        collection: String,
        payload: OutcomePayload,
    },
    Failed {
        verb: Verb,
        collection: String,
        failure: RepositoryFailure,
    },
}

impl Outcome {
    pub fn verb(&self) -> Verb {
        match self {
            Outcome::Succeeded { verb, .. } | Outcome::Failed { verb, .. } => *verb,
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            Outcome::Succeeded { collection, .. } | Outcome::Failed { collection, .. } => {
                collection
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    Outcome(Outcome),
    SidebarLoaded(SidebarMenu),
    Subscribed { collection: String, channel: String },
    ResourceChanged { collection: String, frame: Frame },
}
