//! Per-instance registry of live WebSocket clients (§4.7).
//!
//! Keyed `user_id -> device_id -> actor address`, grounded on this corpus's
//! `StreamConnectionRegistry` (stream_id -> Vec<ChatSender>) pattern, indexed
//! one level deeper since push here targets one user's every device rather
//! than every viewer of one stream.

use std::collections::HashMap;
use std::sync::Arc;

use actix::Addr;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;

use super::actor::{PushMessage, UserSocket};

#[derive(Clone, Default)]
pub struct HubRegistry {
    inner: Arc<RwLock<HashMap<Uuid, HashMap<String, Addr<UserSocket>>>>>,
}

impl HubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, user_id: Uuid, device_id: String, addr: Addr<UserSocket>) {
        let mut guard = self.inner.write().await;
        guard.entry(user_id).or_default().insert(device_id, addr);
    }

    pub async fn unregister(&self, user_id: Uuid, device_id: &str) {
        let mut guard = self.inner.write().await;
        if let Some(devices) = guard.get_mut(&user_id) {
            devices.remove(device_id);
            if devices.is_empty() {
                guard.remove(&user_id);
            }
        }
    }

    /// Fans `payload` out to every live device of `user_id`, non-blockingly
    /// (§4.7 "send non-blockingly; full channel drops message"). The actix
    /// mailbox's `try_send` stands in for the spec's literal bounded
    /// single-producer channel: a full mailbox is dropped exactly the same
    /// way a full mpsc channel would be.
    pub async fn push_to_user(&self, user_id: Uuid, payload: String) {
        let guard = self.inner.read().await;
        let Some(devices) = guard.get(&user_id) else {
            return;
        };

        for (device_id, addr) in devices {
            if addr.try_send(PushMessage(payload.clone())).is_err() {
                warn!(%user_id, %device_id, "ws mailbox full or closed, dropping push");
            }
        }
    }
}
