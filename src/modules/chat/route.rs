use actix_web::web::{scope, ServiceConfig};

use crate::modules::chat::handle::*;

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/chats")
            .service(open_conversation)
            .service(send_message)
            .service(get_messages)
            .service(mark_message_read)
            .service(delete_conversation),
    );
}
