/// Realtime HTTP Handler
///
/// Xử lý HTTP upgrade request và quản lý bidirectional message flow:
/// - Inbound:  Client → WebSocket → parse ClientMessage → Session Actor
/// - Outbound: Hub Actor → Session Actor → mpsc channel → WebSocket → Client
use actix::Addr;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_ws::Message;
use tokio::sync::mpsc;

use crate::modules::chat::handle::ChatSvc;

use super::hub::RealtimeHub;
use super::message::ClientMessage;
use super::session::RealtimeSession;

/// HTTP handler để upgrade connection thành WebSocket
///
/// Endpoint: GET /ws
///
/// Flow:
/// 1. HTTP handshake → WebSocket connection
/// 2. Tạo mpsc channel (session actor → client)
/// 3. Start RealtimeSession actor
/// 4. Spawn async task xử lý bidirectional messages
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    hub: web::Data<Addr<RealtimeHub>>,
    chat_service: web::Data<ChatSvc>,
) -> Result<HttpResponse, Error> {
    tracing::debug!("WebSocket upgrade request từ {:?}", req.peer_addr());

    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    // mpsc channel: session actor gửi JSON → spawned task → WebSocket → client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let ws_actor = RealtimeSession::new(hub.get_ref().clone(), tx, chat_service);

    use actix::Actor;
    let addr = ws_actor.start();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                // === INBOUND: Client → Server ===
                msg = msg_stream.recv() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let text_str = text.to_string();

                            match serde_json::from_str::<ClientMessage>(&text_str) {
                                Ok(client_msg) => {
                                    addr.do_send(client_msg);
                                }
                                Err(e) => {
                                    tracing::warn!(
                                        "Không thể parse client message: {} - raw: {}",
                                        e,
                                        &text_str[..100.min(text_str.len())]
                                    );
                                }
                            }
                        }

                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = ws_session.pong(&data).await {
                                tracing::error!("Không thể gửi pong: {}", e);
                                break;
                            }
                        }

                        Some(Ok(Message::Pong(_))) => {
                            // Heartbeat response - bỏ qua
                        }

                        Some(Ok(Message::Close(reason))) => {
                            tracing::info!("WebSocket close frame: {:?}", reason);
                            break;
                        }

                        Some(Ok(Message::Binary(_))) => {
                            tracing::warn!("Binary messages không được hỗ trợ");
                        }

                        Some(Ok(Message::Continuation(_) | Message::Nop)) => {}

                        Some(Err(e)) => {
                            tracing::error!("WebSocket protocol error: {}", e);
                            break;
                        }

                        // Stream kết thúc (client disconnect)
                        None => break,
                    }
                }

                // === OUTBOUND: Server → Client ===
                Some(json) = rx.recv() => {
                    if ws_session.text(json).await.is_err() {
                        tracing::error!("Không thể gửi message tới WebSocket client");
                        break;
                    }
                }
            }
        }

        let _ = ws_session.close(None).await;
        tracing::debug!("WebSocket message loop kết thúc");
    });

    tracing::info!("WebSocket connection established");
    Ok(response)
}
