use uuid::Uuid;

use crate::{
    api::error,
    modules::chat::{
        model::{InsertMessage, MessagePage},
        repository::ChatRepository,
        schema::{ChatEntity, MessageEntity},
    },
};

#[derive(Clone)]
pub struct ChatRepositoryPg {
    pool: sqlx::PgPool,
}

impl ChatRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ChatRepository for ChatRepositoryPg {
    async fn find_or_create(
        &self,
        participant_lo: &Uuid,
        participant_hi: &Uuid,
    ) -> Result<ChatEntity, error::SystemError> {
        // Upsert no-op: DO UPDATE giữ nguyên row nhưng làm RETURNING luôn có
        // kết quả, nên find-or-create là một statement atomic duy nhất.
        let chat = sqlx::query_as::<_, ChatEntity>(
            r#"
            INSERT INTO chats (id, participant_lo, participant_hi, message_count)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (participant_lo, participant_hi)
            DO UPDATE SET updated_at = chats.updated_at
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(participant_lo)
        .bind(participant_hi)
        .fetch_one(&self.pool)
        .await?;

        Ok(chat)
    }

    async fn find_by_id(
        &self,
        chat_id: &Uuid,
    ) -> Result<Option<ChatEntity>, error::SystemError> {
        let chat = sqlx::query_as::<_, ChatEntity>("SELECT * FROM chats WHERE id = $1")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(chat)
    }

    async fn append_message(
        &self,
        message: &InsertMessage,
    ) -> Result<MessageEntity, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // Bump message_count dưới row lock của chat: seq được cấp phát tuần
        // tự nên hai append đồng thời không thể đụng nhau.
        let seq: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE chats
            SET message_count = message_count + 1, updated_at = now()
            WHERE id = $1
            RETURNING message_count
            "#,
        )
        .bind(message.chat_id)
        .fetch_optional(tx.as_mut())
        .await?;

        let seq = seq.ok_or_else(|| error::SystemError::not_found("Chat not found"))?;

        let row = sqlx::query_as::<_, MessageEntity>(
            r#"
            INSERT INTO chat_messages (id, chat_id, seq, sender_id, content, read_by, created_at)
            VALUES ($1, $2, $3, $4, $5, '{}'::uuid[], now())
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(message.chat_id)
        .bind(seq)
        .bind(message.sender_id)
        .bind(&message.content)
        .fetch_one(tx.as_mut())
        .await?;

        tx.commit().await?;

        Ok(row)
    }

    async fn find_message_page(
        &self,
        chat_id: &Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<MessagePage, error::SystemError> {
        // has index on (chat_id, seq DESC)
        let limit = page_size as i64;
        let offset = (page as i64 - 1) * limit;

        let mut rows = sqlx::query_as::<_, MessageEntity>(
            "SELECT * FROM chat_messages WHERE chat_id = $1 ORDER BY seq DESC OFFSET $2 LIMIT $3",
        )
        .bind(chat_id)
        .bind(offset)
        .bind(limit + 1)
        .fetch_all(&self.pool)
        .await?;

        // Lấy dư một row để biết còn trang cũ hơn không.
        let has_more = rows.len() > page_size as usize;
        rows.truncate(page_size as usize);
        rows.reverse();

        Ok(MessagePage { messages: rows, has_more })
    }

    async fn mark_read(
        &self,
        chat_id: &Uuid,
        message_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<bool, error::SystemError> {
        // CASE giữ nguyên read_by khi user đã có mặt: gọi lại là no-op,
        // nhưng rows_affected vẫn cho biết message có tồn tại hay không.
        let result = sqlx::query(
            r#"
            UPDATE chat_messages
            SET read_by = CASE
                WHEN read_by @> ARRAY[$3]::uuid[] THEN read_by
                ELSE array_append(read_by, $3)
            END
            WHERE chat_id = $1 AND id = $2
            "#,
        )
        .bind(chat_id)
        .bind(message_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, chat_id: &Uuid) -> Result<bool, error::SystemError> {
        // chat_messages có ON DELETE CASCADE theo chat_id.
        let result = sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
