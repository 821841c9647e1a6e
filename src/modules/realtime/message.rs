/// Realtime Wire Protocol
///
/// Các message trao đổi giữa client và server qua WebSocket connection.
/// Payload là tagged enum: field thiếu hay type sai bị reject lúc parse.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::{ChannelName, ChatEvent};

/// Messages được gửi từ client đến server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Xác thực connection với access token
    #[serde(rename_all = "camelCase")]
    Auth { token: String },

    /// Đăng ký nhận event trên một channel (`user-<id>` hoặc `chat-<id>`)
    #[serde(rename_all = "camelCase")]
    Subscribe { channel: ChannelName },

    /// Rời channel
    #[serde(rename_all = "camelCase")]
    Unsubscribe { channel: ChannelName },

    /// Đang gõ trong conversation
    #[serde(rename_all = "camelCase")]
    Typing { chat_id: Uuid },

    /// Ping giữ connection alive
    Ping,
}

/// Messages được gửi từ server đến client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Xác thực thành công
    #[serde(rename_all = "camelCase")]
    AuthSuccess { user_id: Uuid },

    /// Xác thực thất bại
    #[serde(rename_all = "camelCase")]
    AuthFailed { reason: String },

    /// Đã vào channel
    #[serde(rename_all = "camelCase")]
    Subscribed { channel: ChannelName },

    /// Event từ một channel đã subscribe
    #[serde(rename_all = "camelCase")]
    Event { channel: ChannelName, event: ChatEvent },

    /// Pong response cho Ping
    Pong,

    /// Lỗi xảy ra
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::schema::MessageEntity;

    // === ClientMessage deserialization ===

    #[test]
    fn test_client_auth_deserialize() {
        let json = r#"{"type":"auth","token":"my-access-token"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Auth { token } if token == "my-access-token"));
    }

    #[test]
    fn test_client_subscribe_deserialize() {
        let id = Uuid::now_v7();
        let json = format!(r#"{{"type":"subscribe","channel":"user-{id}"}}"#);
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(
            matches!(msg, ClientMessage::Subscribe { channel } if channel == ChannelName::user(id))
        );
    }

    #[test]
    fn test_client_unsubscribe_deserialize() {
        let id = Uuid::now_v7();
        let json = format!(r#"{{"type":"unsubscribe","channel":"chat-{id}"}}"#);
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(
            matches!(msg, ClientMessage::Unsubscribe { channel } if channel == ChannelName::chat(id))
        );
    }

    #[test]
    fn test_client_typing_deserialize() {
        let id = Uuid::now_v7();
        let json = format!(r#"{{"type":"typing","chatId":"{id}"}}"#);
        let msg: ClientMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(msg, ClientMessage::Typing { chat_id } if chat_id == id));
    }

    #[test]
    fn test_client_ping_deserialize() {
        let json = r#"{"type":"ping"}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_invalid_type_returns_error() {
        let json = r#"{"type":"unknownType"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_invalid_channel_name_returns_error() {
        let json = r#"{"type":"subscribe","channel":"room-123"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn test_missing_required_field_returns_error() {
        // typing thiếu chatId
        let json = r#"{"type":"typing"}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    // === ServerMessage serialization ===

    #[test]
    fn test_server_auth_success_serialize() {
        let uid = Uuid::now_v7();
        let msg = ServerMessage::AuthSuccess { user_id: uid };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"authSuccess\""));
        assert!(json.contains(&uid.to_string()));
    }

    #[test]
    fn test_server_subscribed_serialize() {
        let id = Uuid::now_v7();
        let msg = ServerMessage::Subscribed { channel: ChannelName::chat(id) };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"subscribed\""));
        assert!(json.contains(&format!("chat-{id}")));
    }

    #[test]
    fn test_server_new_message_event_serialize() {
        let chat_id = Uuid::now_v7();
        let sender = Uuid::now_v7();
        let message = MessageEntity {
            id: Uuid::now_v7(),
            chat_id,
            seq: 1,
            sender_id: sender,
            content: "Hello".to_string(),
            read_by: vec![],
            created_at: chrono::Utc::now(),
        };
        let msg = ServerMessage::Event {
            channel: ChannelName::user(sender),
            event: ChatEvent::NewMessage { chat_id, message },
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"event\""));
        assert!(json.contains("\"type\":\"new-message\""));
        assert!(json.contains("\"content\":\"Hello\""));
        assert!(json.contains(&format!("user-{sender}")));
    }

    #[test]
    fn test_server_typing_event_serialize() {
        let chat_id = Uuid::now_v7();
        let uid = Uuid::now_v7();
        let msg = ServerMessage::Event {
            channel: ChannelName::chat(chat_id),
            event: ChatEvent::Typing { user_id: uid },
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"typing\""));
        assert!(json.contains(&uid.to_string()));
    }

    #[test]
    fn test_server_pong_serialize() {
        let msg = ServerMessage::Pong;
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"pong"}"#);
    }

    // === Roundtrip ===

    #[test]
    fn test_client_message_roundtrip() {
        let id = Uuid::now_v7();
        let original = ClientMessage::Subscribe { channel: ChannelName::user(id) };
        let json = serde_json::to_string(&original).unwrap();
        let deserialized: ClientMessage = serde_json::from_str(&json).unwrap();

        assert!(
            matches!(deserialized, ClientMessage::Subscribe { channel } if channel == ChannelName::user(id))
        );
    }

    #[test]
    fn test_server_event_roundtrip() {
        let chat_id = Uuid::now_v7();
        let uid = Uuid::now_v7();
        let original = ServerMessage::Event {
            channel: ChannelName::chat(chat_id),
            event: ChatEvent::Typing { user_id: uid },
        };
        let json = serde_json::to_string(&original).unwrap();
        let deserialized: ServerMessage = serde_json::from_str(&json).unwrap();

        match deserialized {
            ServerMessage::Event { channel, event } => {
                assert_eq!(channel, ChannelName::chat(chat_id));
                assert_eq!(event, ChatEvent::Typing { user_id: uid });
            }
            _ => panic!("Roundtrip failed"),
        }
    }
}
