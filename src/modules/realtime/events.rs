/// Hub Actor Events
///
/// Các message trao đổi giữa session actors và hub actor.
use actix::prelude::*;
use uuid::Uuid;

use super::channel::{ChannelName, ChatEvent};
use super::session::RealtimeSession;

/// Event: session mới connect tới hub
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    /// Unique session ID
    pub id: Uuid,
    /// Address của session actor để hub gửi event xuống
    pub addr: Addr<RealtimeSession>,
}

/// Event: session disconnect
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: Uuid,
}

/// Event: session đăng ký nhận event trên một channel
#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe {
    pub session_id: Uuid,
    pub channel: ChannelName,
}

/// Event: session rời channel
#[derive(Message)]
#[rtype(result = "()")]
pub struct Unsubscribe {
    pub session_id: Uuid,
    pub channel: ChannelName,
}

/// Event: fan-out một ChatEvent tới mọi subscriber của channel.
/// At-most-once: subscriber offline không nhận lại được.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct Publish {
    pub channel: ChannelName,
    pub event: ChatEvent,
}
