/// Client Conversation State Machine
///
/// State phía client cho "conversation đang được xem", tách khỏi Chat Service
/// để UI render optimistic và reconcile async. Không I/O: UI layer gọi service
/// rồi đưa kết quả (hoặc live event) vào đây.
///
/// Ba luồng thông tin đồng thời, entry optimistic local, response của send,
/// và echo qua live event, không có thứ tự đảm bảo. Machine hội tụ bằng cách
/// dedup theo identity store gán, không bao giờ theo content + timestamp.
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::modules::chat::model::MessagePage;
use crate::modules::chat::schema::MessageEntity;

/// Typing indicator hết hạn sau chừng này giây kể từ event cuối.
pub const TYPING_TTL_SECS: i64 = 3;

/// Identity hiển thị phía client. Message đã persist dùng id store gán;
/// entry optimistic dùng id tạm client tự sinh. Hai namespace tách biệt nên
/// bản tạm và bản authoritative không bao giờ đồng thời render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalId {
    Persisted(Uuid),
    Temporary(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewMessage {
    pub local_id: LocalId,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ViewMessage {
    fn from_entity(message: &MessageEntity) -> Self {
        Self {
            local_id: LocalId::Persisted(message.id),
            sender_id: message.sender_id,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }

    /// Entry optimistic còn chờ acknowledgement?
    pub fn is_pending(&self) -> bool {
        matches!(self.local_id, LocalId::Temporary(_))
    }
}

/// Một fetch đang bay, gắn generation tại thời điểm phát. Response với
/// generation cũ bị bỏ, chọn conversation khác giữa chừng không thể bị
/// response trễ ghi đè.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub chat_id: Uuid,
    pub page: u32,
    generation: u64,
}

/// Window của conversation đang mở trong state `Ready`.
#[derive(Debug)]
pub struct Window {
    chat_id: Uuid,
    /// Thứ tự chronological; entry pending nằm cuối.
    messages: Vec<ViewMessage>,
    /// Trang sâu nhất đã load (1 = mới nhất).
    page: u32,
    has_more: bool,
    older_inflight: Option<FetchTicket>,
    /// user_id -> deadline của typing indicator.
    typing: HashMap<Uuid, DateTime<Utc>>,
}

#[derive(Debug)]
enum ViewState {
    Idle,
    Loading { ticket: FetchTicket },
    Ready(Window),
}

#[derive(Debug)]
pub struct ConversationView {
    state: ViewState,
    generation: u64,
}

impl ConversationView {
    pub fn new() -> Self {
        Self { state: ViewState::Idle, generation: 0 }
    }

    pub fn active_chat(&self) -> Option<Uuid> {
        match &self.state {
            ViewState::Idle => None,
            ViewState::Loading { ticket } => Some(ticket.chat_id),
            ViewState::Ready(window) => Some(window.chat_id),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ViewState::Loading { .. })
    }

    pub fn messages(&self) -> &[ViewMessage] {
        match &self.state {
            ViewState::Ready(window) => &window.messages,
            _ => &[],
        }
    }

    pub fn has_more(&self) -> bool {
        matches!(&self.state, ViewState::Ready(window) if window.has_more)
    }

    fn window_mut(&mut self) -> Option<&mut Window> {
        match &mut self.state {
            ViewState::Ready(window) => Some(window),
            _ => None,
        }
    }

    /// Chọn conversation: `Idle|Ready → Loading`. Tăng generation nên mọi
    /// fetch cũ đang bay tự động thành stale.
    pub fn select(&mut self, chat_id: Uuid) -> FetchTicket {
        self.generation += 1;
        let ticket = FetchTicket { chat_id, page: 1, generation: self.generation };
        self.state = ViewState::Loading { ticket };
        ticket
    }

    pub fn deselect(&mut self) {
        self.generation += 1;
        self.state = ViewState::Idle;
    }

    /// Lịch sử ban đầu về: `Loading → Ready`. Trả về false (và không đổi
    /// state) nếu ticket đã stale.
    pub fn history_loaded(&mut self, ticket: FetchTicket, page: MessagePage) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        let ViewState::Loading { ticket: current } = &self.state else {
            return false;
        };
        if *current != ticket {
            return false;
        }

        self.state = ViewState::Ready(Window {
            chat_id: ticket.chat_id,
            messages: page.messages.iter().map(ViewMessage::from_entity).collect(),
            page: 1,
            has_more: page.has_more,
            older_inflight: None,
            typing: HashMap::new(),
        });
        true
    }

    /// Fetch lịch sử thất bại: `Loading → Idle`, lỗi hiển thị phía UI,
    /// không tự retry.
    pub fn history_failed(&mut self, ticket: FetchTicket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        if !matches!(&self.state, ViewState::Loading { ticket: current } if *current == ticket) {
            return false;
        }

        self.state = ViewState::Idle;
        true
    }

    /// Xin trang cũ hơn khi cuộn gần đỉnh. Chỉ phát ticket khi `Ready`,
    /// còn `has_more`, và chưa có fetch older nào đang bay.
    pub fn request_older(&mut self) -> Option<FetchTicket> {
        let generation = self.generation;
        let window = self.window_mut()?;
        if !window.has_more || window.older_inflight.is_some() {
            return None;
        }

        let ticket =
            FetchTicket { chat_id: window.chat_id, page: window.page + 1, generation };
        window.older_inflight = Some(ticket);
        Some(ticket)
    }

    /// Batch cũ được prepend vào window. Trả về số entry thực sự chèn để UI
    /// bù scroll offset đúng bằng chiều cao thêm vào, trước repaint.
    /// Entry đã có (tail dịch do concurrent append) bị lọc theo id.
    pub fn older_loaded(&mut self, ticket: FetchTicket, page: MessagePage) -> usize {
        if ticket.generation != self.generation {
            return 0;
        }
        let Some(window) = self.window_mut() else {
            return 0;
        };
        if window.older_inflight != Some(ticket) {
            return 0;
        }

        window.older_inflight = None;
        window.page = ticket.page;
        window.has_more = page.has_more;

        let existing: HashSet<LocalId> =
            window.messages.iter().map(|m| m.local_id).collect();
        let fresh: Vec<ViewMessage> = page
            .messages
            .iter()
            .map(ViewMessage::from_entity)
            .filter(|m| !existing.contains(&m.local_id))
            .collect();

        let inserted = fresh.len();
        window.messages.splice(0..0, fresh);
        inserted
    }

    pub fn older_failed(&mut self, ticket: FetchTicket) {
        if let Some(window) = self.window_mut() {
            if window.older_inflight == Some(ticket) {
                window.older_inflight = None;
            }
        }
    }

    /// Optimistic send: entry tạm hiện ngay trong window, chờ ack.
    pub fn begin_send(
        &mut self,
        sender_id: Uuid,
        content: &str,
        at: DateTime<Utc>,
    ) -> Option<LocalId> {
        let window = self.window_mut()?;
        let temp_id = LocalId::Temporary(Uuid::now_v7());
        window.messages.push(ViewMessage {
            local_id: temp_id,
            sender_id,
            content: content.to_string(),
            created_at: at,
        });
        Some(temp_id)
    }

    /// Send được acknowledge: bỏ entry tạm, merge bản authoritative theo id
    /// store gán. Echo qua live event có thể đã đến trước, merge idempotent
    /// nên mọi thứ tự đều ra đúng một bản.
    pub fn send_acknowledged(&mut self, temp_id: LocalId, message: &MessageEntity) -> bool {
        let Some(window) = self.window_mut() else {
            return false;
        };
        if window.chat_id != message.chat_id {
            return false;
        }

        window.remove(temp_id);
        window.merge(message);
        true
    }

    /// Send thất bại: entry tạm bị bỏ. Nội dung không tự phục hồi vào
    /// compose box.
    pub fn send_failed(&mut self, temp_id: LocalId) -> bool {
        match self.window_mut() {
            Some(window) => window.remove(temp_id),
            None => false,
        }
    }

    /// Live new-message event. Merge vào window nếu đúng conversation đang mở
    /// và id chưa có mặt; trả về true khi window nhận message này.
    pub fn event_received(&mut self, chat_id: Uuid, message: &MessageEntity) -> bool {
        match self.window_mut() {
            Some(window) if window.chat_id == chat_id => window.merge(message),
            _ => false,
        }
    }

    /// Ghi nhận typing event của counterpart.
    pub fn typing_seen(&mut self, user_id: Uuid, at: DateTime<Utc>) {
        if let Some(window) = self.window_mut() {
            window.typing.insert(user_id, at + Duration::seconds(TYPING_TTL_SECS));
        }
    }

    /// Users còn đang gõ tại thời điểm `now`; deadline quá hạn bị dọn luôn.
    pub fn active_typers(&mut self, now: DateTime<Utc>) -> Vec<Uuid> {
        match self.window_mut() {
            Some(window) => {
                window.typing.retain(|_, deadline| *deadline > now);
                let mut typers: Vec<Uuid> = window.typing.keys().copied().collect();
                typers.sort();
                typers
            }
            None => Vec::new(),
        }
    }
}

impl Default for ConversationView {
    fn default() -> Self {
        Self::new()
    }
}

impl Window {
    fn contains(&self, local_id: LocalId) -> bool {
        self.messages.iter().any(|m| m.local_id == local_id)
    }

    fn remove(&mut self, local_id: LocalId) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.local_id != local_id);
        self.messages.len() < before
    }

    /// Merge một message đã persist, dedup theo id store gán. Chèn trước
    /// entry pending đầu tiên để bản tạm luôn nằm cuối window.
    fn merge(&mut self, message: &MessageEntity) -> bool {
        if self.contains(LocalId::Persisted(message.id)) {
            return false;
        }

        let position = self
            .messages
            .iter()
            .position(ViewMessage::is_pending)
            .unwrap_or(self.messages.len());
        self.messages.insert(position, ViewMessage::from_entity(message));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(chat_id: Uuid, seq: i64, content: &str) -> MessageEntity {
        MessageEntity {
            id: Uuid::now_v7(),
            chat_id,
            seq,
            sender_id: Uuid::now_v7(),
            content: content.to_string(),
            read_by: vec![],
            created_at: Utc::now(),
        }
    }

    fn page(messages: Vec<MessageEntity>, has_more: bool) -> MessagePage {
        MessagePage { messages, has_more }
    }

    #[test]
    fn test_select_then_load_reaches_ready() {
        let mut view = ConversationView::new();
        let chat_id = Uuid::now_v7();

        let ticket = view.select(chat_id);
        assert!(view.is_loading());
        assert_eq!(view.active_chat(), Some(chat_id));

        let loaded = view.history_loaded(
            ticket,
            page(vec![entity(chat_id, 1, "a"), entity(chat_id, 2, "b")], false),
        );
        assert!(loaded);
        assert!(!view.is_loading());
        assert_eq!(view.messages().len(), 2);
        assert_eq!(view.messages()[0].content, "a");
    }

    #[test]
    fn test_history_failure_returns_to_idle() {
        let mut view = ConversationView::new();
        let ticket = view.select(Uuid::now_v7());

        assert!(view.history_failed(ticket));
        assert_eq!(view.active_chat(), None);
    }

    #[test]
    fn test_stale_fetch_is_discarded_after_reselect() {
        let mut view = ConversationView::new();
        let first_chat = Uuid::now_v7();
        let second_chat = Uuid::now_v7();

        let stale = view.select(first_chat);
        let current = view.select(second_chat);

        // Response trễ của conversation cũ không được apply
        assert!(!view.history_loaded(stale, page(vec![entity(first_chat, 1, "old")], false)));
        assert!(view.is_loading());
        assert_eq!(view.active_chat(), Some(second_chat));

        assert!(view.history_loaded(current, page(vec![entity(second_chat, 1, "new")], false)));
        assert_eq!(view.messages()[0].content, "new");
    }

    #[test]
    fn test_stale_fetch_is_discarded_after_deselect() {
        let mut view = ConversationView::new();
        let chat_id = Uuid::now_v7();
        let ticket = view.select(chat_id);

        view.deselect();

        assert!(!view.history_loaded(ticket, page(vec![entity(chat_id, 1, "x")], false)));
        assert_eq!(view.active_chat(), None);
    }

    #[test]
    fn test_request_older_prepends_and_reports_inserted_count() {
        let mut view = ConversationView::new();
        let chat_id = Uuid::now_v7();

        let ticket = view.select(chat_id);
        view.history_loaded(
            ticket,
            page(vec![entity(chat_id, 3, "m3"), entity(chat_id, 4, "m4")], true),
        );

        let older = view.request_older().expect("has_more nên phát ticket");
        assert_eq!(older.page, 2);

        let inserted = view.older_loaded(
            older,
            page(vec![entity(chat_id, 1, "m1"), entity(chat_id, 2, "m2")], false),
        );
        assert_eq!(inserted, 2);
        assert!(!view.has_more());

        let contents: Vec<&str> = view.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m1", "m2", "m3", "m4"]);

        // Hết lịch sử thì không phát ticket nữa
        assert!(view.request_older().is_none());
    }

    #[test]
    fn test_request_older_is_single_flight() {
        let mut view = ConversationView::new();
        let chat_id = Uuid::now_v7();
        let ticket = view.select(chat_id);
        view.history_loaded(ticket, page(vec![entity(chat_id, 5, "m5")], true));

        let first = view.request_older().unwrap();
        assert!(view.request_older().is_none());

        view.older_failed(first);
        assert!(view.request_older().is_some());
    }

    #[test]
    fn test_older_batch_dedups_shifted_tail() {
        let mut view = ConversationView::new();
        let chat_id = Uuid::now_v7();
        let shared = entity(chat_id, 2, "m2");

        let ticket = view.select(chat_id);
        view.history_loaded(
            ticket,
            page(vec![shared.clone(), entity(chat_id, 3, "m3")], true),
        );

        let older = view.request_older().unwrap();
        // Concurrent append làm slice dịch: m2 xuất hiện lại trong trang cũ
        let inserted =
            view.older_loaded(older, page(vec![entity(chat_id, 1, "m1"), shared], false));

        assert_eq!(inserted, 1);
        let contents: Vec<&str> = view.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_optimistic_send_then_ack_then_echo() {
        let mut view = ConversationView::new();
        let chat_id = Uuid::now_v7();
        let me = Uuid::now_v7();

        let ticket = view.select(chat_id);
        view.history_loaded(ticket, page(vec![], false));

        let temp = view.begin_send(me, "hi", Utc::now()).unwrap();
        assert_eq!(view.messages().len(), 1);
        assert!(view.messages()[0].is_pending());

        let persisted = entity(chat_id, 1, "hi");
        assert!(view.send_acknowledged(temp, &persisted));
        assert_eq!(view.messages().len(), 1);
        assert!(!view.messages()[0].is_pending());

        // Echo về sau ack: dedup theo id, không nhân đôi
        assert!(!view.event_received(chat_id, &persisted));
        assert_eq!(view.messages().len(), 1);
    }

    #[test]
    fn test_echo_before_ack_converges_to_one_copy() {
        let mut view = ConversationView::new();
        let chat_id = Uuid::now_v7();
        let me = Uuid::now_v7();

        let ticket = view.select(chat_id);
        view.history_loaded(ticket, page(vec![], false));

        let temp = view.begin_send(me, "hi", Utc::now()).unwrap();
        let persisted = entity(chat_id, 1, "hi");

        // Echo qua live event đến trước khi send() return
        assert!(view.event_received(chat_id, &persisted));
        assert_eq!(view.messages().len(), 2);

        assert!(view.send_acknowledged(temp, &persisted));
        assert_eq!(view.messages().len(), 1);
        assert_eq!(view.messages()[0].local_id, LocalId::Persisted(persisted.id));
    }

    #[test]
    fn test_send_failure_drops_temporary_entry() {
        let mut view = ConversationView::new();
        let chat_id = Uuid::now_v7();

        let ticket = view.select(chat_id);
        view.history_loaded(ticket, page(vec![entity(chat_id, 1, "m1")], false));

        let temp = view.begin_send(Uuid::now_v7(), "doomed", Utc::now()).unwrap();
        assert_eq!(view.messages().len(), 2);

        assert!(view.send_failed(temp));
        assert_eq!(view.messages().len(), 1);
        assert_eq!(view.messages()[0].content, "m1");
    }

    #[test]
    fn test_incoming_merges_before_pending_entries() {
        let mut view = ConversationView::new();
        let chat_id = Uuid::now_v7();

        let ticket = view.select(chat_id);
        view.history_loaded(ticket, page(vec![], false));

        view.begin_send(Uuid::now_v7(), "pending", Utc::now()).unwrap();
        let incoming = entity(chat_id, 1, "from counterpart");
        assert!(view.event_received(chat_id, &incoming));

        let contents: Vec<&str> = view.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["from counterpart", "pending"]);
    }

    #[test]
    fn test_event_for_other_chat_is_ignored() {
        let mut view = ConversationView::new();
        let chat_id = Uuid::now_v7();
        let other_chat = Uuid::now_v7();

        let ticket = view.select(chat_id);
        view.history_loaded(ticket, page(vec![], false));

        assert!(!view.event_received(other_chat, &entity(other_chat, 1, "elsewhere")));
        assert!(view.messages().is_empty());
    }

    #[test]
    fn test_typing_indicator_expires() {
        let mut view = ConversationView::new();
        let chat_id = Uuid::now_v7();
        let typer = Uuid::now_v7();

        let ticket = view.select(chat_id);
        view.history_loaded(ticket, page(vec![], false));

        let t0 = Utc::now();
        view.typing_seen(typer, t0);
        assert_eq!(view.active_typers(t0 + Duration::seconds(1)), vec![typer]);

        // Event mới refresh deadline
        view.typing_seen(typer, t0 + Duration::seconds(2));
        assert_eq!(view.active_typers(t0 + Duration::seconds(4)), vec![typer]);

        assert!(view.active_typers(t0 + Duration::seconds(10)).is_empty());
    }

    #[test]
    fn test_begin_send_requires_ready_state() {
        let mut view = ConversationView::new();
        assert!(view.begin_send(Uuid::now_v7(), "nope", Utc::now()).is_none());

        view.select(Uuid::now_v7());
        assert!(view.begin_send(Uuid::now_v7(), "still loading", Utc::now()).is_none());
    }
}
