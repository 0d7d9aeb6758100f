//! Connection-gated, deduplicated push-channel subscriptions per collection.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use anyhow::Result;
use async_trait::async_trait;
use shared::protocol::Frame;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

pub type FrameHandler = Arc<dyn Fn(Frame) + Send + Sync>;

pub fn channel_name(collection: &str) -> String {
    format!("queue/{collection}")
}

#[async_trait]
pub trait PushChannel: Send + Sync {
    async fn subscribe(&self, channel: &str, handler: FrameHandler) -> Result<()>;
    async fn unsubscribe(&self, channel: &str) -> Result<()>;
}

/// Shared connection-ready flag of the push transport.
#[derive(Clone)]
pub struct ConnectionState {
    ready: Arc<watch::Sender<bool>>,
}

impl ConnectionState {
    pub fn new(ready: bool) -> Self {
        let (ready, _) = watch::channel(ready);
        Self {
            ready: Arc::new(ready),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.send_replace(ready);
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    /// Resolves once the connection is ready; immediately if it already is.
    pub async fn wait_until_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionMarker {
    pub collection: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed { channel: String },
    AlreadySubscribed { channel: String },
}

#[derive(Debug, Error)]
#[error("failed to subscribe to {channel}: {source}")]
pub struct SubscribeError {
    pub channel: String,
    #[source]
    pub source: anyhow::Error,
}

pub struct LiveUpdateSubscriber {
    transport: Arc<dyn PushChannel>,
    connection: ConnectionState,
    subscriptions: Mutex<HashMap<String, SubscriptionMarker>>,
}

impl LiveUpdateSubscriber {
    pub fn new(transport: Arc<dyn PushChannel>, connection: ConnectionState) -> Self {
        Self {
            transport,
            connection,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn ensure_subscribed(
        &self,
        collection: &str,
        handler: FrameHandler,
    ) -> Result<SubscribeOutcome, SubscribeError> {
        self.connection.wait_until_ready().await;

        let channel = channel_name(collection);
        // Held across the transport call so check-then-insert is a single step.
        let mut subscriptions = self.subscriptions.lock().await;
        if subscriptions.contains_key(&channel) {
            debug!(%channel, "already subscribed");
            return Ok(SubscribeOutcome::AlreadySubscribed { channel });
        }

        self.transport
            .subscribe(&channel, handler)
            .await
            .map_err(|source| SubscribeError {
                channel: channel.clone(),
                source,
            })?;
        subscriptions.insert(
            channel.clone(),
            SubscriptionMarker {
                collection: collection.to_string(),
            },
        );
        info!(%channel, collection, "subscribed to live updates");
        Ok(SubscribeOutcome::Subscribed { channel })
    }

    /// Drops the collection's subscription. Returns whether one existed; the
    /// unsubscribe is best-effort and does not wait for the connection.
    pub async fn clear(&self, collection: &str) -> bool {
        let channel = channel_name(collection);
        let removed = self.subscriptions.lock().await.remove(&channel).is_some();
        if !removed {
            debug!(%channel, "no subscription to clear");
            return false;
        }
        if let Err(err) = self.transport.unsubscribe(&channel).await {
            warn!(%channel, "unsubscribe failed: {err:#}");
        } else {
            info!(%channel, "unsubscribed from live updates");
        }
        true
    }

    pub async fn is_subscribed(&self, collection: &str) -> bool {
        self.subscriptions
            .lock()
            .await
            .contains_key(&channel_name(collection))
    }

    pub async fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = self.subscriptions.lock().await.keys().cloned().collect();
        channels.sort();
        channels
    }
}

/// In-process push channel: frames published locally go to the registered handler.
#[derive(Default)]
pub struct LocalPushChannel {
    handlers: StdMutex<HashMap<String, FrameHandler>>,
}

impl LocalPushChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `frame` to the channel's handler; returns false when nobody listens.
    pub fn publish(&self, channel: &str, frame: Frame) -> bool {
        let handler = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel)
            .cloned();
        match handler {
            Some(handler) => {
                handler(frame);
                true
            }
            None => false,
        }
    }

    pub fn has_subscriber(&self, channel: &str) -> bool {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(channel)
    }
}

#[async_trait]
impl PushChannel for LocalPushChannel {
    async fn subscribe(&self, channel: &str, handler: FrameHandler) -> Result<()> {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel.to_string(), handler);
        Ok(())
    }

    async fn unsubscribe(&self, channel: &str) -> Result<()> {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(channel);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/live_updates_tests.rs"]
mod tests;
