/// Realtime Session Actor
///
/// Mỗi WebSocket connection có một session actor riêng. Session quản lý state
/// (auth, user_id) và gửi messages tới client thông qua mpsc channel được
/// bridge từ handler.rs.
use actix::prelude::*;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::modules::chat::handle::ChatSvc;
use crate::utils::Claims;
use crate::ENV;

use super::channel::ChannelName;
use super::events::*;
use super::hub::RealtimeHub;
use super::message::{ClientMessage, ServerMessage};

/// Realtime session cho một client
pub struct RealtimeSession {
    /// Unique session ID
    pub id: Uuid,

    /// User ID sau khi authenticate (None nếu chưa auth)
    pub user_id: Option<Uuid>,

    /// Address của hub actor
    pub hub: Addr<RealtimeHub>,

    /// Channel gửi JSON messages tới client (bridge → handler.rs → WebSocket)
    pub tx: mpsc::UnboundedSender<String>,

    /// Chat service để publish typing events (None trong test environment)
    pub chat_service: Option<actix_web::web::Data<ChatSvc>>,
}

impl RealtimeSession {
    pub fn new(
        hub: Addr<RealtimeHub>,
        tx: mpsc::UnboundedSender<String>,
        chat_service: actix_web::web::Data<ChatSvc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: None,
            hub,
            tx,
            chat_service: Some(chat_service),
        }
    }

    /// Gửi ServerMessage tới client thông qua channel
    fn send_to_client(&self, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => {
                if let Err(e) = self.tx.send(json) {
                    tracing::error!(
                        "Không thể gửi message tới client (session {}): {}",
                        self.id,
                        e
                    );
                }
            }
            Err(e) => {
                tracing::error!("Không thể serialize ServerMessage (session {}): {}", self.id, e);
            }
        }
    }

    fn send_error(&self, message: &str) {
        self.send_to_client(&ServerMessage::Error { message: message.to_string() });
    }

    /// Kiểm tra user đã authenticate chưa, trả về user_id nếu có
    fn require_auth(&self) -> Option<Uuid> {
        if self.user_id.is_none() {
            self.send_error("Bạn cần xác thực trước khi thực hiện thao tác này");
            tracing::warn!("Session {} chưa authenticate, từ chối request", self.id);
        }
        self.user_id
    }

    /// Dispatch message từ client tới handler tương ứng
    fn handle_client_message(&mut self, msg: &ClientMessage) {
        match msg {
            ClientMessage::Auth { token } => {
                self.handle_auth(token);
            }

            ClientMessage::Subscribe { channel } => {
                self.handle_subscribe(*channel);
            }

            ClientMessage::Unsubscribe { channel } => {
                self.handle_unsubscribe(*channel);
            }

            ClientMessage::Typing { chat_id } => {
                self.handle_typing(*chat_id);
            }

            ClientMessage::Ping => {
                self.send_to_client(&ServerMessage::Pong);
            }
        }
    }

    /// Verify access token và liên kết user với session
    fn handle_auth(&mut self, token: &str) {
        if self.user_id.is_some() {
            self.send_error("Session đã được xác thực");
            return;
        }

        let claims = match Claims::decode(token, ENV.jwt_secret.as_ref()) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!("Token verification thất bại (session {}): {}", self.id, e);
                self.send_to_client(&ServerMessage::AuthFailed {
                    reason: "Token không hợp lệ hoặc đã hết hạn".to_string(),
                });
                return;
            }
        };

        let user_id = claims.sub;
        self.user_id = Some(user_id);

        self.send_to_client(&ServerMessage::AuthSuccess { user_id });

        tracing::info!("User {} đã authenticate thành công trên session {}", user_id, self.id);
    }

    /// Subscribe một channel. Channel `user-<id>` chỉ chủ sở hữu mới được
    /// subscribe; channel `chat-<id>` mở cho mọi session đã auth.
    fn handle_subscribe(&self, channel: ChannelName) {
        let Some(user_id) = self.require_auth() else {
            return;
        };

        if let ChannelName::User(owner) = channel {
            if owner != user_id {
                self.send_error("Chỉ được subscribe channel cá nhân của chính mình");
                tracing::warn!(
                    "User {} thử subscribe channel của user khác ({})",
                    user_id,
                    channel
                );
                return;
            }
        }

        self.hub.do_send(Subscribe { session_id: self.id, channel });
        self.send_to_client(&ServerMessage::Subscribed { channel });
        tracing::debug!("User {} subscribed to {}", user_id, channel);
    }

    fn handle_unsubscribe(&self, channel: ChannelName) {
        let Some(user_id) = self.require_auth() else {
            return;
        };

        self.hub.do_send(Unsubscribe { session_id: self.id, channel });
        tracing::debug!("User {} unsubscribed from {}", user_id, channel);
    }

    /// Typing indicator: đẩy qua chat service, best-effort, không ack
    fn handle_typing(&self, chat_id: Uuid) {
        let Some(user_id) = self.require_auth() else {
            return;
        };

        let Some(service) = &self.chat_service else {
            self.send_error("Chat service không khả dụng");
            return;
        };

        service.trigger_typing(chat_id, user_id);
    }
}

impl Actor for RealtimeSession {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!("Realtime session started: {}", self.id);

        self.hub.do_send(Connect { id: self.id, addr: ctx.address() });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!("Realtime session stopped: {}", self.id);

        self.hub.do_send(Disconnect { id: self.id });
    }
}

/// Implement Message trait cho ClientMessage để có thể send qua actors
impl Message for ClientMessage {
    type Result = ();
}

/// Handler: nhận ClientMessage từ handler.rs
impl Handler<ClientMessage> for RealtimeSession {
    type Result = ();

    fn handle(&mut self, msg: ClientMessage, _ctx: &mut Context<Self>) {
        self.handle_client_message(&msg);
    }
}

/// Handler: nhận ServerMessage từ hub → serialize → gửi tới client qua channel
impl Handler<ServerMessage> for RealtimeSession {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, _ctx: &mut Context<Self>) {
        self.send_to_client(&msg);
    }
}
