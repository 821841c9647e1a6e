use actix_web::{get, web};
use uuid::Uuid;

use crate::api::{error, success};
use crate::modules::user::{model, service::UserService};

#[get("/")]
pub async fn get_users(
    user_service: web::Data<UserService>,
) -> Result<success::Success<Vec<model::UserResponse>>, error::Error> {
    let users = user_service.get_all_users().await?;
    Ok(success::Success::ok(Some(users)).message("Users retrieved successfully"))
}

#[get("/{id:[0-9a-fA-F-]{36}}")]
pub async fn get_user(
    user_service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let user = user_service.get_by_id(user_id.into_inner()).await?;
    Ok(success::Success::ok(Some(user)).message("User retrieved successfully"))
}
