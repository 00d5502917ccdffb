//! The closed set of push event types (§4.7) and the envelope they travel
//! in over `ws:user:{id}` pub/sub channels and WebSocket frames.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    FavoriteChange,
    HistoryUpdate,
    PlaylistChange,
    DeviceKicked,
    CookieAlert,
    ConfigJwtRotated,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::FavoriteChange => "favorite.change",
            EventType::HistoryUpdate => "history.update",
            EventType::PlaylistChange => "playlist.change",
            EventType::DeviceKicked => "device.kicked",
            EventType::CookieAlert => "cookie.alert",
            EventType::ConfigJwtRotated => "config.jwt_rotated",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PushEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub data: Value,
}

impl PushEvent {
    pub fn new(event_type: EventType, data: Value) -> Self {
        Self {
            event_type: event_type.as_str(),
            data,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"unknown","data":null}"#.to_string())
    }
}
