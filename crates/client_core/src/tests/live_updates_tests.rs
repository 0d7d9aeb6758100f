use super::*;
use std::time::Duration;

use anyhow::anyhow;

#[derive(Default)]
struct RecordingPushChannel {
    subscribed: StdMutex<Vec<String>>,
    unsubscribed: StdMutex<Vec<String>>,
    fail_subscribe: bool,
}

#[async_trait]
impl PushChannel for RecordingPushChannel {
    async fn subscribe(&self, channel: &str, _handler: FrameHandler) -> Result<()> {
        if self.fail_subscribe {
            return Err(anyhow!("transport down"));
        }
        self.subscribed.lock().unwrap().push(channel.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, channel: &str) -> Result<()> {
        self.unsubscribed.lock().unwrap().push(channel.to_string());
        Ok(())
    }
}

fn noop_handler() -> FrameHandler {
    Arc::new(|_frame| {})
}

#[test]
fn channel_names_follow_queue_convention() {
    assert_eq!(channel_name("widgets"), "queue/widgets");
}

#[tokio::test]
async fn ensure_subscribed_twice_subscribes_once() {
    let transport = Arc::new(RecordingPushChannel::default());
    let subscriber = LiveUpdateSubscriber::new(transport.clone(), ConnectionState::new(true));

    let first = subscriber
        .ensure_subscribed("widgets", noop_handler())
        .await
        .expect("first");
    let second = subscriber
        .ensure_subscribed("widgets", noop_handler())
        .await
        .expect("second");

    assert_eq!(
        first,
        SubscribeOutcome::Subscribed {
            channel: "queue/widgets".into()
        }
    );
    assert_eq!(
        second,
        SubscribeOutcome::AlreadySubscribed {
            channel: "queue/widgets".into()
        }
    );
    assert_eq!(*transport.subscribed.lock().unwrap(), ["queue/widgets"]);
    assert_eq!(subscriber.channels().await, ["queue/widgets"]);
}

#[tokio::test]
async fn concurrent_ensure_subscribed_does_not_double_subscribe() {
    let transport = Arc::new(RecordingPushChannel::default());
    let subscriber = Arc::new(LiveUpdateSubscriber::new(
        transport.clone(),
        ConnectionState::new(true),
    ));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let subscriber = Arc::clone(&subscriber);
            tokio::spawn(async move {
                subscriber
                    .ensure_subscribed("widgets", noop_handler())
                    .await
                    .expect("subscribe")
            })
        })
        .collect();
    for task in tasks {
        task.await.expect("join");
    }

    assert_eq!(transport.subscribed.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn subscription_waits_for_connection_ready() {
    let transport = Arc::new(RecordingPushChannel::default());
    let connection = ConnectionState::new(false);
    let subscriber = Arc::new(LiveUpdateSubscriber::new(
        transport.clone(),
        connection.clone(),
    ));

    let pending = {
        let subscriber = Arc::clone(&subscriber);
        tokio::spawn(async move { subscriber.ensure_subscribed("widgets", noop_handler()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(transport.subscribed.lock().unwrap().is_empty());
    assert!(!subscriber.is_subscribed("widgets").await);

    connection.set_ready(true);
    let outcome = tokio::time::timeout(Duration::from_secs(2), pending)
        .await
        .expect("subscribe after ready")
        .expect("join")
        .expect("subscribe");
    assert!(matches!(outcome, SubscribeOutcome::Subscribed { .. }));
    assert!(subscriber.is_subscribed("widgets").await);
}

#[tokio::test]
async fn clear_unsubscribes_once_and_is_idempotent() {
    let transport = Arc::new(RecordingPushChannel::default());
    let subscriber = LiveUpdateSubscriber::new(transport.clone(), ConnectionState::new(true));
    subscriber
        .ensure_subscribed("widgets", noop_handler())
        .await
        .expect("subscribe");

    assert!(subscriber.clear("widgets").await);
    assert!(!subscriber.clear("widgets").await);

    assert_eq!(*transport.unsubscribed.lock().unwrap(), ["queue/widgets"]);
    assert!(subscriber.channels().await.is_empty());
}

#[tokio::test]
async fn clear_does_not_wait_for_connection() {
    let transport = Arc::new(RecordingPushChannel::default());
    let connection = ConnectionState::new(true);
    let subscriber = LiveUpdateSubscriber::new(transport.clone(), connection.clone());
    subscriber
        .ensure_subscribed("widgets", noop_handler())
        .await
        .expect("subscribe");

    connection.set_ready(false);
    let cleared = tokio::time::timeout(Duration::from_secs(1), subscriber.clear("widgets"))
        .await
        .expect("clear must not block");
    assert!(cleared);
}

#[tokio::test]
async fn failed_subscribe_leaves_no_registry_entry() {
    let transport = Arc::new(RecordingPushChannel {
        fail_subscribe: true,
        ..RecordingPushChannel::default()
    });
    let subscriber = LiveUpdateSubscriber::new(transport, ConnectionState::new(true));

    let err = subscriber
        .ensure_subscribed("widgets", noop_handler())
        .await
        .expect_err("must fail");
    assert_eq!(err.channel, "queue/widgets");
    assert!(!subscriber.is_subscribed("widgets").await);
}

#[tokio::test]
async fn local_push_channel_routes_frames_to_handler() {
    let channel = LocalPushChannel::new();
    let received = Arc::new(StdMutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    channel
        .subscribe(
            "queue/widgets",
            Arc::new(move |frame: Frame| sink.lock().unwrap().push(frame)),
        )
        .await
        .expect("subscribe");

    assert!(channel.publish("queue/widgets", Frame::message("{}")));
    assert!(!channel.publish("queue/gadgets", Frame::message("{}")));
    assert_eq!(received.lock().unwrap().len(), 1);

    channel.unsubscribe("queue/widgets").await.expect("unsubscribe");
    assert!(!channel.has_subscriber("queue/widgets"));
}
