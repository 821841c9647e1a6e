use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::modules::chat::schema::MessageEntity;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,
    #[validate(length(min = 1, message = "Message content cannot be empty"))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MessagePageQuery {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    pub page_size: Option<u32>,
}

/// Một lát cắt lịch sử tính từ cuối chat (tail pagination):
/// page 1 là `page_size` message mới nhất, page N là lát ngay trước page N-1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<MessageEntity>,
    pub has_more: bool,
}

#[derive(Debug, Clone)]
pub struct InsertMessage {
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
}
