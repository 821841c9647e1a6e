/// Channel Naming & Event Payloads
///
/// Hai convention đặt tên channel được dùng song song:
/// - `user-<id>`: notification xuyên conversation (message mới từ bất kỳ ai,
///   cập nhật user list / unread badge). Subscriber nhận được message mới kể
///   cả khi chưa mở conversation đó.
/// - `chat-<id>`: delivery độ trễ thấp khi conversation đang mở
///   (message, typing indicator), scope chỉ trong participants.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::modules::chat::schema::MessageEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChannelName {
    User(Uuid),
    Chat(Uuid),
}

impl ChannelName {
    pub fn user(id: Uuid) -> Self {
        Self::User(id)
    }

    pub fn chat(id: Uuid) -> Self {
        Self::Chat(id)
    }
}

impl std::fmt::Display for ChannelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelName::User(id) => write!(f, "user-{id}"),
            ChannelName::Chat(id) => write!(f, "chat-{id}"),
        }
    }
}

impl From<ChannelName> for String {
    fn from(value: ChannelName) -> Self {
        value.to_string()
    }
}

impl std::str::FromStr for ChannelName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = if let Some(id) = s.strip_prefix("user-") {
            Uuid::parse_str(id).ok().map(ChannelName::User)
        } else if let Some(id) = s.strip_prefix("chat-") {
            Uuid::parse_str(id).ok().map(ChannelName::Chat)
        } else {
            None
        };

        parsed.ok_or_else(|| format!("Invalid channel name: {s}"))
    }
}

impl TryFrom<String> for ChannelName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Event đẩy qua delivery channel. Payload là struct tường minh:
/// field thiếu hoặc sai kiểu bị reject ngay lúc deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChatEvent {
    /// Message mới đã persist thành công.
    #[serde(rename = "new-message", rename_all = "camelCase")]
    NewMessage { chat_id: Uuid, message: MessageEntity },

    /// User đang gõ trong conversation. Không persist, best-effort.
    #[serde(rename = "typing", rename_all = "camelCase")]
    Typing { user_id: Uuid },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_channel_display_and_parse() {
        let id = Uuid::now_v7();
        let channel = ChannelName::user(id);
        let name = channel.to_string();
        assert_eq!(name, format!("user-{id}"));
        assert_eq!(name.parse::<ChannelName>().unwrap(), channel);
    }

    #[test]
    fn test_chat_channel_display_and_parse() {
        let id = Uuid::now_v7();
        let channel = ChannelName::chat(id);
        assert_eq!(channel.to_string().parse::<ChannelName>().unwrap(), channel);
    }

    #[test]
    fn test_unknown_prefix_rejected() {
        let id = Uuid::now_v7();
        assert!(format!("room-{id}").parse::<ChannelName>().is_err());
    }

    #[test]
    fn test_garbage_id_rejected() {
        assert!("user-not-a-uuid".parse::<ChannelName>().is_err());
        assert!("chat-".parse::<ChannelName>().is_err());
    }

    #[test]
    fn test_typing_event_serialize() {
        let uid = Uuid::now_v7();
        let event = ChatEvent::Typing { user_id: uid };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"typing\""));
        assert!(json.contains(&uid.to_string()));
    }

    #[test]
    fn test_malformed_event_rejected() {
        // new-message thiếu message payload
        let json = r#"{"type":"new-message","chatId":"550e8400-e29b-41d4-a716-446655440000"}"#;
        assert!(serde_json::from_str::<ChatEvent>(json).is_err());
    }
}
