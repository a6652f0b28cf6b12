use std::collections::VecDeque;

/// Bounded set of chats exempt from archiving.
///
/// Eviction is by insertion order: marking an id that is already present
/// does not move it, so a chat in constant use is still evicted once
/// `capacity` newer ids have been marked after it.
#[derive(Debug, Clone)]
pub struct ActiveChats {
    capacity: usize,
    ids: VecDeque<String>,
}

impl ActiveChats {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ids: VecDeque::with_capacity(capacity),
        }
    }

    /// Mark `chat_id` active. Returns the id evicted to make room, if any.
    pub fn mark(&mut self, chat_id: &str) -> Option<String> {
        if self.contains(chat_id) {
            return None;
        }
        self.ids.push_back(chat_id.to_string());
        if self.ids.len() > self.capacity {
            return self.ids.pop_front();
        }
        None
    }

    pub fn contains(&self, chat_id: &str) -> bool {
        self.ids.iter().any(|id| id == chat_id)
    }

    pub fn remove(&mut self, chat_id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|id| id != chat_id);
        self.ids.len() != before
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Ids oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}
