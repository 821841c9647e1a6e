use uuid::Uuid;

use crate::{api::error, modules::user::schema::UserEntity};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    /// Toàn bộ user directory, sắp theo tên, cho conversation-partner list.
    async fn find_all(&self) -> Result<Vec<UserEntity>, error::SystemError>;
}
