//! Real-time push hub (C7): per-instance client registry fed by a
//! pattern-subscription to the shared pub/sub bus.

pub mod actor;
pub mod event;
pub mod registry;

use std::str::FromStr;

use redis::Client;
use redis_utils::keys;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

pub use actor::UserSocket;
pub use event::{EventType, PushEvent};
pub use registry::HubRegistry;

/// Publishes `event` to `user_id`'s channel. Any instance holding a live
/// socket for that user receives it via [`run_listener`], including this
/// one (the listener doesn't special-case local vs. remote origin).
pub async fn publish_to_user(client: &Client, user_id: Uuid, event: PushEvent) -> anyhow::Result<()> {
    let channel = keys::key_ws_channel(&user_id.to_string());
    redis_utils::pubsub::publish(client, &channel, &event.to_json()).await?;
    Ok(())
}

/// Long-lived background task: pattern-subscribes to `ws:user:*` once and
/// fans every matching publish out to the local registry (§4.7 "Global
/// listener"). Intended to run for the lifetime of the process; a
/// connection error ends the task, at which point this instance stops
/// receiving pushes until the process restarts and resubscribes.
pub async fn run_listener(client: Client, registry: HubRegistry) {
    let result = redis_utils::pubsub::psubscribe_loop(&client, keys::ws_channel_pattern(), move |msg| {
        let Some(user_id_str) = msg.channel.rsplit(':').next() else {
            warn!(channel = %msg.channel, "ws pubsub channel missing user id suffix");
            return;
        };
        let Ok(user_id) = Uuid::from_str(user_id_str) else {
            warn!(channel = %msg.channel, "ws pubsub channel suffix is not a uuid");
            return;
        };
        if serde_json::from_str::<Value>(&msg.payload).is_err() {
            warn!(channel = %msg.channel, "ws pubsub payload is not valid json, dropping");
            return;
        }

        let registry = registry.clone();
        let payload = msg.payload;
        actix_rt::spawn(async move {
            registry.push_to_user(user_id, payload).await;
        });
    })
    .await;

    if let Err(err) = result {
        warn!(error = %err, "ws pubsub listener terminated");
    }
}
