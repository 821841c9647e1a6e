/// Chat Service
///
/// Single source of truth cho conversation lookup/creation, message append,
/// pagination và read-state. Đây là component duy nhất được phép mutate
/// Message Store.
///
/// Thứ tự side effect của send: persist xong mới publish. Publish thất bại
/// chỉ được log (DeliveryFailure), message đã durable nên caller vẫn nhận
/// success; recipient bù lại bằng lần fetch kế tiếp.
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::modules::chat::model::{InsertMessage, MessagePage};
use crate::modules::chat::repository::ChatRepository;
use crate::modules::chat::schema::{ChatEntity, MessageEntity};
use crate::modules::realtime::channel::{ChannelName, ChatEvent};
use crate::modules::realtime::delivery::DeliveryChannel;

/// Chuẩn hóa cặp participant: sort để (A,B) và (B,A) trỏ về cùng một key.
fn canonical_pair(a: Uuid, b: Uuid) -> Result<(Uuid, Uuid), error::SystemError> {
    if a.is_nil() || b.is_nil() {
        return Err(error::SystemError::invalid_participants("Participant id is missing"));
    }
    if a == b {
        return Err(error::SystemError::invalid_participants(
            "A conversation needs two distinct participants",
        ));
    }
    if a < b { Ok((a, b)) } else { Ok((b, a)) }
}

/// Chat service với generic repository + delivery để dễ testing
#[derive(Clone)]
pub struct ChatService<R, D>
where
    R: ChatRepository + Send + Sync + 'static,
    D: DeliveryChannel + 'static,
{
    repo: Arc<R>,
    delivery: Arc<D>,
}

impl<R, D> ChatService<R, D>
where
    R: ChatRepository + Send + Sync + 'static,
    D: DeliveryChannel + 'static,
{
    pub fn with_dependencies(repo: Arc<R>, delivery: Arc<D>) -> Self {
        ChatService { repo, delivery }
    }

    /// Tìm hoặc tạo conversation cho một cặp user.
    ///
    /// Idempotent: hai lần gọi đồng thời cho cùng cặp (bất kể thứ tự đối số)
    /// không thể tạo ra hai conversation, repo upsert atomic theo cặp
    /// đã chuẩn hóa.
    pub async fn find_or_create_conversation(
        &self,
        participant_a: Uuid,
        participant_b: Uuid,
    ) -> Result<ChatEntity, error::SystemError> {
        let (lo, hi) = canonical_pair(participant_a, participant_b)?;
        self.repo.find_or_create(&lo, &hi).await
    }

    /// Gửi tin nhắn 1-1.
    ///
    /// Flow:
    /// 1. Validate content (trim, EmptyMessage nếu rỗng) trước khi chạm store
    /// 2. Resolve conversation qua find-or-create
    /// 3. Append message (store gán id, seq, created_at)
    /// 4. Persist xong mới publish new-message tới channel cá nhân của cả
    ///    hai participant + channel của chat đang mở
    pub async fn send_message(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: &str,
    ) -> Result<MessageEntity, error::SystemError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(error::SystemError::EmptyMessage);
        }

        let chat = self.find_or_create_conversation(sender_id, recipient_id).await?;

        let message = self
            .repo
            .append_message(&InsertMessage {
                chat_id: chat.id,
                sender_id,
                content: content.to_string(),
            })
            .await?;

        // Fan-out tới hai destination độc lập (mọi session/device của mỗi
        // user đều nhận được) và channel của conversation.
        let event = ChatEvent::NewMessage { chat_id: chat.id, message: message.clone() };
        let channels = [
            ChannelName::user(sender_id),
            ChannelName::user(recipient_id),
            ChannelName::chat(chat.id),
        ];
        for channel in channels {
            if let Err(e) = self.delivery.publish(&channel, event.clone()) {
                tracing::warn!(
                    "Delivery failure on {} for message {}: {}",
                    channel,
                    message.id,
                    e
                );
            }
        }

        Ok(message)
    }

    /// Lấy một trang lịch sử, đánh số từ cuối: page 1 là `page_size` message
    /// mới nhất. Page number không ổn định dưới concurrent append, chấp nhận
    /// cho live chat view cuộn ngược.
    pub async fn get_messages(
        &self,
        chat_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<MessagePage, error::SystemError> {
        if page == 0 || page_size == 0 {
            return Err(error::SystemError::bad_request("Page and page size must be at least 1"));
        }

        self.repo
            .find_by_id(&chat_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Chat not found"))?;

        self.repo.find_message_page(&chat_id, page, page_size).await
    }

    /// Đánh dấu đã đọc. Idempotent: gọi lại với cùng tham số là no-op.
    pub async fn mark_message_read(
        &self,
        chat_id: Uuid,
        message_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, error::SystemError> {
        self.repo.mark_read(&chat_id, &message_id, &user_id).await
    }

    /// Xóa hẳn conversation cùng toàn bộ messages, không soft-delete.
    pub async fn delete_conversation(
        &self,
        chat_id: Uuid,
    ) -> Result<bool, error::SystemError> {
        self.repo.delete(&chat_id).await
    }

    /// Publish typing indicator vào channel của conversation.
    /// Không persist, không ack; rớt event là chấp nhận được.
    pub fn trigger_typing(&self, chat_id: Uuid, user_id: Uuid) {
        let channel = ChannelName::chat(chat_id);
        if let Err(e) = self.delivery.publish(&channel, ChatEvent::Typing { user_id }) {
            tracing::debug!("Typing event dropped on {}: {}", channel, e);
        }
    }
}
