/// Unread Badge Counters
///
/// Đếm số message chưa đọc theo từng counterpart, thuần client và ephemeral:
/// tăng khi new-message đến cho conversation không phải conversation đang mở,
/// reset về 0 khi mở conversation đó. Không persist.
use std::collections::HashMap;

use uuid::Uuid;

#[derive(Debug, Default)]
pub struct UnreadCounts {
    counts: HashMap<Uuid, u32>,
}

impl UnreadCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Message mới từ `counterpart` khi conversation của họ không active.
    /// Trả về số đếm mới.
    pub fn record_incoming(&mut self, counterpart: Uuid) -> u32 {
        let count = self.counts.entry(counterpart).or_insert(0);
        *count += 1;
        *count
    }

    /// Conversation với `counterpart` vừa được mở.
    pub fn reset(&mut self, counterpart: &Uuid) {
        self.counts.remove(counterpart);
    }

    pub fn count(&self, counterpart: &Uuid) -> u32 {
        self.counts.get(counterpart).copied().unwrap_or(0)
    }

    /// Tổng badge trên user list.
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }
}
