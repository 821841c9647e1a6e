/// Realtime Hub Actor
///
/// Hub quản lý tất cả WebSocket connections và channel subscriptions, fan-out
/// event tới mọi session đang subscribe một channel. Một user có thể có nhiều
/// session (phone, tablet, desktop) cùng subscribe channel `user-<id>` của
/// mình, nên mọi device đều nhận được event.
///
/// Hub được construct một lần ở application start và inject qua
/// `web::Data<Addr<RealtimeHub>>`, không có global connection singleton.
use actix::prelude::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::channel::ChannelName;
use super::events::*;
use super::message::ServerMessage;
use super::session::RealtimeSession;

pub struct RealtimeHub {
    /// Map: session_id -> session actor address
    sessions: HashMap<Uuid, Addr<RealtimeSession>>,

    /// Map: channel -> set of session_ids đang subscribe
    channels: HashMap<ChannelName, HashSet<Uuid>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self { sessions: HashMap::new(), channels: HashMap::new() }
    }

    fn send_to_session(&self, session_id: &Uuid, message: ServerMessage) {
        if let Some(session_addr) = self.sessions.get(session_id) {
            session_addr.do_send(message);
        }
    }
}

impl Actor for RealtimeHub {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Realtime hub started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("Realtime hub stopped");
    }
}

/// Handler: session mới connect
impl Handler<Connect> for RealtimeHub {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Context<Self>) {
        tracing::debug!("New realtime session connected: {}", msg.id);

        self.sessions.insert(msg.id, msg.addr);
    }
}

/// Handler: session disconnect, gỡ khỏi mọi channel
impl Handler<Disconnect> for RealtimeHub {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Context<Self>) {
        tracing::debug!("Realtime session disconnected: {}", msg.id);

        self.sessions.remove(&msg.id);

        for subscribers in self.channels.values_mut() {
            subscribers.remove(&msg.id);
        }

        // Clean up empty channels
        self.channels.retain(|_, subscribers| !subscribers.is_empty());
    }
}

/// Handler: session subscribe một channel
impl Handler<Subscribe> for RealtimeHub {
    type Result = ();

    fn handle(&mut self, msg: Subscribe, _: &mut Context<Self>) {
        self.channels.entry(msg.channel).or_default().insert(msg.session_id);

        tracing::debug!(
            "Session {} subscribed to {} ({} subscribers)",
            msg.session_id,
            msg.channel,
            self.channels.get(&msg.channel).map_or(0, HashSet::len)
        );
    }
}

/// Handler: session rời channel
impl Handler<Unsubscribe> for RealtimeHub {
    type Result = ();

    fn handle(&mut self, msg: Unsubscribe, _: &mut Context<Self>) {
        if let Some(subscribers) = self.channels.get_mut(&msg.channel) {
            subscribers.remove(&msg.session_id);

            tracing::debug!(
                "Session {} left {} ({} subscribers remaining)",
                msg.session_id,
                msg.channel,
                subscribers.len()
            );

            if subscribers.is_empty() {
                self.channels.remove(&msg.channel);
            }
        }
    }
}

/// Handler: fan-out event tới mọi subscriber của channel.
/// At-most-once, best-effort: không có subscriber thì event biến mất,
/// client offline bù lại bằng getMessages lúc reconnect.
impl Handler<Publish> for RealtimeHub {
    type Result = ();

    fn handle(&mut self, msg: Publish, _: &mut Context<Self>) {
        let Some(subscribers) = self.channels.get(&msg.channel) else {
            tracing::debug!("Publish to {} with no subscribers, dropped", msg.channel);
            return;
        };

        for session_id in subscribers {
            self.send_to_session(
                session_id,
                ServerMessage::Event { channel: msg.channel, event: msg.event.clone() },
            );
        }

        tracing::debug!("Published to {}: {} sessions", msg.channel, subscribers.len());
    }
}

/// Implement Message trait cho ServerMessage để có thể send tới sessions
impl Message for ServerMessage {
    type Result = ();
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}
