//! Pattern-subscription helper for the real-time push hub.
//!
//! `ConnectionManager` multiplexes regular commands but cannot carry
//! Pub/Sub subscriptions, so this takes its own dedicated connection.

use futures_util::StreamExt;
use redis::Client;
use tracing::warn;

/// A Pub/Sub message delivered to a channel matching the subscribed pattern.
pub struct PatternMessage {
    pub channel: String,
    pub payload: String,
}

/// Publishes `payload` to `channel` over a fresh multiplexed connection.
pub async fn publish(client: &Client, channel: &str, payload: &str) -> redis::RedisResult<()> {
    let mut conn = client.get_multiplexed_async_connection().await?;
    redis::AsyncCommands::publish::<_, _, ()>(&mut conn, channel, payload).await
}

/// Subscribes to `pattern` and invokes `on_message` for every matching
/// publish until the connection is dropped or errors out. Intended to run
/// as a long-lived background task, one per hub process; messages are
/// fanned out in-process from there to the connected WebSocket sessions.
pub async fn psubscribe_loop<F>(client: &Client, pattern: &str, mut on_message: F) -> redis::RedisResult<()>
where
    F: FnMut(PatternMessage) + Send,
{
    let conn = client.get_async_connection().await?;
    let mut pubsub = conn.into_pubsub();
    pubsub.psubscribe(pattern).await?;

    let mut stream = pubsub.on_message();
    while let Some(msg) = stream.next().await {
        let channel: String = msg.get_channel_name().into();
        let payload: String = match msg.get_payload() {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, channel = %channel, "dropping unreadable pubsub payload");
                continue;
            }
        };
        on_message(PatternMessage { channel, payload });
    }

    Ok(())
}
