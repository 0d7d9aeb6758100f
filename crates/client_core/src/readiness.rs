//! Bounded join over the inputs the sidebar projection depends on.

use std::time::Duration;

use shared::{router::RouterStateSnapshot, view::ViewMode};
use thiserror::Error;
use tokio::sync::watch;

use crate::facets::ViewCatalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessInput {
    RouterState,
    ViewDefinitions(ViewMode),
    Connection,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("readiness wait gave up after {waited:?}; pending inputs: {pending:?}")]
pub struct BarrierTimeout {
    pub waited: Duration,
    pub pending: Vec<ReadinessInput>,
}

#[derive(Debug, Clone)]
pub struct Readiness {
    pub router: RouterStateSnapshot,
    pub views: ViewCatalog,
}

pub struct ReadinessBarrier {
    router: watch::Receiver<Option<RouterStateSnapshot>>,
    views: watch::Receiver<ViewCatalog>,
    connection: watch::Receiver<bool>,
}

impl ReadinessBarrier {
    pub fn new(
        router: watch::Receiver<Option<RouterStateSnapshot>>,
        views: watch::Receiver<ViewCatalog>,
        connection: watch::Receiver<bool>,
    ) -> Self {
        Self {
            router,
            views,
            connection,
        }
    }

    pub fn pending(&self) -> Vec<ReadinessInput> {
        let mut pending = Vec::new();
        if self.router.borrow().is_none() {
            pending.push(ReadinessInput::RouterState);
        }
        {
            let views = self.views.borrow();
            for mode in ViewMode::ALL {
                if !views.is_loaded(mode) {
                    pending.push(ReadinessInput::ViewDefinitions(mode));
                }
            }
        }
        if !*self.connection.borrow() {
            pending.push(ReadinessInput::Connection);
        }
        pending
    }

    /// Waits until every input is ready, for at most `timeout`. A closed input
    /// channel counts as permanently pending.
    pub async fn wait(&mut self, timeout: Duration) -> Result<Readiness, BarrierTimeout> {
        let joined = tokio::time::timeout(timeout, self.wait_all()).await;
        match joined {
            Ok(Some(readiness)) => Ok(readiness),
            Ok(None) | Err(_) => Err(BarrierTimeout {
                waited: timeout,
                pending: self.pending(),
            }),
        }
    }

    async fn wait_all(&mut self) -> Option<Readiness> {
        self.router.wait_for(Option::is_some).await.ok()?;
        self.views
            .wait_for(|views| ViewMode::ALL.into_iter().all(|mode| views.is_loaded(mode)))
            .await
            .ok()?;
        self.connection.wait_for(|ready| *ready).await.ok()?;

        let router = self.router.borrow().clone()?;
        let views = self.views.borrow().clone();
        Some(Readiness { router, views })
    }
}

#[cfg(test)]
#[path = "tests/readiness_tests.rs"]
mod tests;
