use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Một cuộc trò chuyện 1-1. Cặp participant được chuẩn hóa
/// (`participant_lo < participant_hi`) trước mọi truy vấn, nên mỗi cặp user
/// chỉ có đúng một chat row.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntity {
    pub id: Uuid,
    pub participant_lo: Uuid,
    pub participant_hi: Uuid,
    /// Số message đã append. Cũng là sequence allocator: bump dưới row lock
    /// để serialize các append đồng thời.
    pub message_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Message thuộc sở hữu của chat cha, append-only, không edit/reorder.
/// `seq` là thứ tự insert (1-based), unique trong một chat.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEntity {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub seq: i64,
    pub sender_id: Uuid,
    pub content: String,
    /// Users đã đánh dấu đọc message này.
    pub read_by: Vec<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
