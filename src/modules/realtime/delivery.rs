use actix::Addr;

use super::channel::{ChannelName, ChatEvent};
use super::events::Publish;
use super::hub::RealtimeHub;
use crate::api::error;

/// Seam giữa ChatService và hub: service chỉ thấy `publish`, nên test được
/// bằng fake không cần actor runtime.
pub trait DeliveryChannel: Send + Sync {
    /// At-most-once, best-effort. Lỗi ở đây không bao giờ rollback persistence.
    fn publish(
        &self,
        channel: &ChannelName,
        event: ChatEvent,
    ) -> Result<(), error::SystemError>;
}

/// Production impl: đẩy event vào RealtimeHub actor.
#[derive(Clone)]
pub struct HubDelivery {
    hub: Addr<RealtimeHub>,
}

impl HubDelivery {
    pub fn new(hub: Addr<RealtimeHub>) -> Self {
        Self { hub }
    }
}

impl DeliveryChannel for HubDelivery {
    fn publish(
        &self,
        channel: &ChannelName,
        event: ChatEvent,
    ) -> Result<(), error::SystemError> {
        self.hub
            .try_send(Publish { channel: *channel, event })
            .map_err(|e| error::SystemError::delivery_failure(e.to_string()))
    }
}
