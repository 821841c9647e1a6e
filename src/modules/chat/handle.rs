use actix_web::{delete, get, post, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        chat::{
            model::{MessagePage, MessagePageQuery, SendMessageRequest, DEFAULT_PAGE_SIZE},
            repository_pg::ChatRepositoryPg,
            schema::{ChatEntity, MessageEntity},
            service::ChatService,
        },
        realtime::delivery::HubDelivery,
    },
    utils::{ValidatedJson, ValidatedQuery},
};

pub type ChatSvc = ChatService<ChatRepositoryPg, HubDelivery>;

#[get("/with/{user_id}")]
pub async fn open_conversation(
    chat_service: web::Data<ChatSvc>,
    user_id: web::Path<Uuid>,
    req: HttpRequest,
) -> Result<success::Success<ChatEntity>, error::Error> {
    let caller = get_claims(&req)?.sub;

    let chat = chat_service.find_or_create_conversation(caller, *user_id).await?;

    Ok(success::Success::ok(Some(chat)).message("Successfully opened conversation"))
}

#[post("/messages")]
pub async fn send_message(
    chat_service: web::Data<ChatSvc>,
    body: ValidatedJson<SendMessageRequest>,
    req: HttpRequest,
) -> Result<success::Success<MessageEntity>, error::Error> {
    let sender_id = get_claims(&req)?.sub;

    let message =
        chat_service.send_message(sender_id, body.0.recipient_id, &body.0.content).await?;

    Ok(success::Success::created(Some(message)).message("Message sent successfully"))
}

#[get("/{chat_id}/messages")]
pub async fn get_messages(
    chat_service: web::Data<ChatSvc>,
    chat_id: web::Path<Uuid>,
    query: ValidatedQuery<MessagePageQuery>,
) -> Result<success::Success<MessagePage>, error::Error> {
    let page = query.0.page.unwrap_or(1);
    let page_size = query.0.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    let messages = chat_service.get_messages(*chat_id, page, page_size).await?;

    Ok(success::Success::ok(Some(messages)).message("Successfully retrieved messages"))
}

#[post("/{chat_id}/messages/{message_id}/read")]
pub async fn mark_message_read(
    chat_service: web::Data<ChatSvc>,
    path: web::Path<(Uuid, Uuid)>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let (chat_id, message_id) = path.into_inner();

    let found = chat_service.mark_message_read(chat_id, message_id, user_id).await?;
    if !found {
        return Err(error::Error::not_found("Message not found"));
    }

    Ok(success::Success::no_content())
}

#[delete("/{chat_id}")]
pub async fn delete_conversation(
    chat_service: web::Data<ChatSvc>,
    chat_id: web::Path<Uuid>,
) -> Result<success::Success<()>, error::Error> {
    let deleted = chat_service.delete_conversation(*chat_id).await?;
    if !deleted {
        return Err(error::Error::not_found("Chat not found"));
    }

    Ok(success::Success::no_content())
}
