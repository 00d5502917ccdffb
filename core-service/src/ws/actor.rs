//! Per-connection actor (§4.7 steps 3-5): one `UserSocket` per live client,
//! grounded on `StreamChatActor` (registers itself on `started`, deregisters
//! on `stopped`, receives outbound pushes as an actor message and writes
//! them with `ctx.text`).

use std::time::{Duration, Instant};

use actix::{Actor, ActorContext, AsyncContext, Handler, Message, StreamHandler};
use actix_web_actors::ws;
use tracing::{debug, warn};
use uuid::Uuid;

use super::registry::HubRegistry;

const MAX_FRAME_BYTES: usize = 512;
const PONG_DEADLINE: Duration = Duration::from_secs(60);
const PING_INTERVAL: Duration = Duration::from_secs(25);

/// An outbound push, already serialized to its final JSON text.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct PushMessage(pub String);

pub struct UserSocket {
    user_id: Uuid,
    device_id: String,
    registry: HubRegistry,
    last_pong: Instant,
}

impl UserSocket {
    pub fn new(user_id: Uuid, device_id: String, registry: HubRegistry) -> Self {
        Self {
            user_id,
            device_id,
            registry,
            last_pong: Instant::now(),
        }
    }

    fn heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(PING_INTERVAL, |actor, ctx| {
            if actor.last_pong.elapsed() > PONG_DEADLINE {
                warn!(user_id = %actor.user_id, device_id = %actor.device_id, "ws pong deadline exceeded, closing");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for UserSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.heartbeat(ctx);

        let registry = self.registry.clone();
        let user_id = self.user_id;
        let device_id = self.device_id.clone();
        let addr = ctx.address();

        actix_rt::spawn(async move {
            registry.register(user_id, device_id, addr).await;
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        let registry = self.registry.clone();
        let user_id = self.user_id;
        let device_id = self.device_id.clone();

        actix_rt::spawn(async move {
            registry.unregister(user_id, &device_id).await;
        });
    }
}

impl Handler<PushMessage> for UserSocket {
    type Result = ();

    fn handle(&mut self, msg: PushMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for UserSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                if text.len() > MAX_FRAME_BYTES {
                    warn!(user_id = %self.user_id, "ws frame exceeds cap, closing");
                    ctx.stop();
                    return;
                }
                // Push-only channel: inbound data frames are discarded (§4.7 step 4).
                debug!(user_id = %self.user_id, bytes = text.len(), "ignoring inbound ws frame");
            }
            Ok(ws::Message::Binary(bin)) => {
                if bin.len() > MAX_FRAME_BYTES {
                    warn!(user_id = %self.user_id, "ws frame exceeds cap, closing");
                    ctx.stop();
                }
            }
            Ok(ws::Message::Ping(bytes)) => {
                ctx.pong(&bytes);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_pong = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                ctx.stop();
            }
            Ok(ws::Message::Nop) => {}
            Err(err) => {
                warn!(user_id = %self.user_id, error = %err, "ws protocol error");
                ctx.stop();
            }
        }
    }
}
