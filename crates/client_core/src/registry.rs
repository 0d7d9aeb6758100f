use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use shared::{
    error::RepositoryFailure,
    protocol::{Collection, Resource, ResourceId},
    request::Request,
    view::ViewMode,
};

use crate::actions::Verb;

pub type RepositoryResult<T> = std::result::Result<T, RepositoryFailure>;

/// Remote capabilities of one named collection.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn list_all(&self) -> RepositoryResult<Collection>;

    /// Plain paged listing. Repositories without server-side paging fall back
    /// to listing everything.
    async fn page(&self, _request: &Request) -> RepositoryResult<Collection> {
        self.list_all().await
    }

    async fn search(&self, request: &Request) -> RepositoryResult<Collection>;
    async fn create(&self, resource: Resource) -> RepositoryResult<Resource>;
    async fn replace(&self, resource: Resource) -> RepositoryResult<Resource>;
    async fn patch(&self, resource: Resource) -> RepositoryResult<Resource>;
    async fn remove(&self, id: &ResourceId) -> RepositoryResult<()>;
}

/// Write-once map from collection name to its repository.
#[derive(Clone, Default)]
pub struct RepositoryRegistry {
    repositories: HashMap<String, Arc<dyn Repository>>,
}

impl RepositoryRegistry {
    pub fn from_table<I, N>(table: I) -> Self
    where
        I: IntoIterator<Item = (N, Arc<dyn Repository>)>,
        N: Into<String>,
    {
        Self {
            repositories: table
                .into_iter()
                .map(|(name, repository)| (name.into(), repository))
                .collect(),
        }
    }

    /// # Panics
    ///
    /// Panics when `collection` was never registered; that is a wiring bug,
    /// not a recoverable condition.
    pub fn resolve(&self, collection: &str) -> &Arc<dyn Repository> {
        match self.repositories.get(collection) {
            Some(repository) => repository,
            None => panic!("no repository registered for collection `{collection}`"),
        }
    }

    pub fn try_resolve(&self, collection: &str) -> Option<&Arc<dyn Repository>> {
        self.repositories.get(collection)
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.repositories.contains_key(collection)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.repositories.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    Generic,
    /// Dedicated list handling for a reserved view-definition collection.
    ViewDefinitions(ViewMode),
}

/// Closed `(collection, verb) -> handler` table built once from the registry.
///
/// Reserved view collections get no generic read handlers: only their own
/// `list` handler plus the generic write and clear handlers.
#[derive(Debug, Clone, Default)]
pub struct HandlerTable {
    entries: HashMap<(String, Verb), Handler>,
}

impl HandlerTable {
    pub fn build(registry: &RepositoryRegistry) -> Self {
        let mut entries = HashMap::new();
        for name in registry.names() {
            let reserved = ViewMode::from_collection_name(name);
            for verb in Verb::ALL {
                let handler = match (reserved, verb) {
                    (Some(mode), Verb::List) => Some(Handler::ViewDefinitions(mode)),
                    (Some(_), verb) if verb.is_read() => None,
                    _ => Some(Handler::Generic),
                };
                if let Some(handler) = handler {
                    entries.insert((name.to_string(), verb), handler);
                }
            }
        }
        Self { entries }
    }

    pub fn lookup(&self, collection: &str, verb: Verb) -> Option<Handler> {
        self.entries.get(&(collection.to_string(), verb)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
