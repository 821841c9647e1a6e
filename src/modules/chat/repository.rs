use uuid::Uuid;

use crate::{
    api::error,
    modules::chat::{
        model::{InsertMessage, MessagePage},
        schema::{ChatEntity, MessageEntity},
    },
};

/// Contract của Message Store: chat là aggregate, message chỉ được
/// tạo bằng cách append vào chat cha.
#[async_trait::async_trait]
pub trait ChatRepository {
    /// Atomic find-or-insert theo cặp participant đã chuẩn hóa (`lo < hi`).
    /// Hai lần gọi đồng thời cho cùng một cặp phải trả về cùng một chat.
    async fn find_or_create(
        &self,
        participant_lo: &Uuid,
        participant_hi: &Uuid,
    ) -> Result<ChatEntity, error::SystemError>;

    async fn find_by_id(&self, chat_id: &Uuid)
        -> Result<Option<ChatEntity>, error::SystemError>;

    /// Append một message; store gán id, seq và created_at.
    /// Hai append đồng thời vào cùng chat đều phải sống sót.
    async fn append_message(
        &self,
        message: &InsertMessage,
    ) -> Result<MessageEntity, error::SystemError>;

    /// Tail pagination: page 1 = `page_size` message mới nhất, theo thứ tự
    /// chronological; `has_more` đúng khi còn message cũ hơn lát trả về.
    async fn find_message_page(
        &self,
        chat_id: &Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<MessagePage, error::SystemError>;

    /// Thêm `user_id` vào `read_by` nếu chưa có (idempotent).
    /// Trả về `true` nếu tìm thấy message.
    async fn mark_read(
        &self,
        chat_id: &Uuid,
        message_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError>;

    /// Xóa hẳn chat cùng toàn bộ messages. Trả về `true` nếu chat tồn tại.
    async fn delete(&self, chat_id: &Uuid) -> Result<bool, error::SystemError>;
}
