use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::configs::RedisCache;

use crate::modules::user::model::UserResponse;
use crate::modules::user::repository::UserRepository;

const USER_CACHE_TTL: usize = 3600;
const DIRECTORY_CACHE_TTL: usize = 300;
const DIRECTORY_CACHE_KEY: &str = "users:directory";

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    cache: Arc<RedisCache>,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        cache: Arc<RedisCache>,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, cache }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, error::SystemError> {
        let key = format!("user:{}", id);
        if let Some(cached_user) = self.cache.get::<UserResponse>(&key).await? {
            info!("User {} found in cache", id);
            return Ok(cached_user);
        }
        let user_entity = self.repo.find_by_id(&id).await?;
        if let Some(entity) = user_entity {
            let user = UserResponse::from(entity);
            self.cache.set(&key, &user, USER_CACHE_TTL).await?;
            info!("User {} cached", id);
            Ok(user)
        } else {
            Err(error::SystemError::not_found("User not found"))
        }
    }

    /// User directory cho conversation-partner list. Cache ngắn hạn: directory
    /// thay đổi chậm, list được fetch lại mỗi lần mở chat screen.
    pub async fn get_all_users(&self) -> Result<Vec<UserResponse>, error::SystemError> {
        if let Some(cached) = self.cache.get::<Vec<UserResponse>>(DIRECTORY_CACHE_KEY).await? {
            info!("User directory served from cache ({} users)", cached.len());
            return Ok(cached);
        }

        let users: Vec<UserResponse> =
            self.repo.find_all().await?.into_iter().map(UserResponse::from).collect();

        self.cache.set(DIRECTORY_CACHE_KEY, &users, DIRECTORY_CACHE_TTL).await?;
        info!("User directory cached ({} users)", users.len());

        Ok(users)
    }
}
