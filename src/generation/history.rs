use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;
use uuid::Uuid;

/// Message roles understood by chat-completions endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Rough token count, ~4 characters per token. Good enough to bound a
/// history; exact counting belongs to the provider.
pub fn approx_tokens(text: &str) -> usize {
    text.len() / 4
}

fn total_tokens(messages: &[ChatMessage]) -> usize {
    messages.iter().map(|m| approx_tokens(&m.content)).sum()
}

/// Trims a history down to `max_tokens`.
///
/// Whole exchanges go first, oldest first: a user message and every
/// assistant reply that follows it are removed together, never split.
/// System messages are always retained, even when they alone exceed the
/// budget.
pub fn trim(messages: &mut Vec<ChatMessage>, max_tokens: usize) {
    while total_tokens(messages) > max_tokens {
        let start = match messages.iter().position(|m| m.role != Role::System) {
            Some(idx) => idx,
            None => break,
        };
        let mut end = start + 1;
        while end < messages.len() && messages[end].role == Role::Assistant {
            end += 1;
        }
        messages.drain(start..end);
    }
}

/// Per-session conversation histories, keyed by session id.
///
/// Entries are created lazily on first use, never shared across sessions,
/// and removed when the owning session closes.
#[derive(Default)]
pub struct ConversationStore {
    histories: Mutex<HashMap<Uuid, Vec<ChatMessage>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            histories: Mutex::new(HashMap::new()),
        }
    }

    pub fn push(&self, session_id: Uuid, message: ChatMessage) {
        let mut histories = match self.histories.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        histories.entry(session_id).or_default().push(message);
    }

    /// Snapshot of a session's history; empty (and not created) if the
    /// session has none yet.
    pub fn history(&self, session_id: Uuid) -> Vec<ChatMessage> {
        let histories = match self.histories.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        histories.get(&session_id).cloned().unwrap_or_default()
    }

    /// Applies [`trim`] to a session's stored history in place.
    pub fn trim_to(&self, session_id: Uuid, max_tokens: usize) {
        let mut histories = match self.histories.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(messages) = histories.get_mut(&session_id) {
            trim(messages, max_tokens);
        }
    }

    /// Drops a closed session's history.
    pub fn forget(&self, session_id: Uuid) {
        let mut histories = match self.histories.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        histories.remove(&session_id);
    }

    pub fn session_count(&self) -> usize {
        match self.histories.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(n: usize) -> [ChatMessage; 2] {
        [
            ChatMessage::user(format!("user message number {}", n)),
            ChatMessage::assistant(format!("assistant reply number {}", n)),
        ]
    }

    #[test]
    fn test_trim_removes_oldest_exchange_first() {
        let mut messages = vec![ChatMessage::system("stay")];
        for n in 0..4 {
            messages.extend(exchange(n));
        }

        // Budget for roughly two exchanges plus the system message.
        trim(&mut messages, 30);

        assert_eq!(messages[0].role, Role::System);
        assert!(
            !messages.iter().any(|m| m.content.contains("number 0")),
            "oldest exchange must go first"
        );
        let last = messages.last().unwrap();
        assert!(last.content.contains("number 3"));
    }

    #[test]
    fn test_trim_never_splits_an_exchange() {
        let mut messages = vec![ChatMessage::system("stay")];
        for n in 0..4 {
            messages.extend(exchange(n));
        }

        trim(&mut messages, 30);

        let mut iter = messages.iter().skip(1);
        while let Some(message) = iter.next() {
            assert_eq!(message.role, Role::User);
            let reply = iter.next().expect("user message without its reply");
            assert_eq!(reply.role, Role::Assistant);
        }
    }

    #[test]
    fn test_trim_always_retains_system_messages() {
        let long_prompt = "p".repeat(400);
        let mut messages = vec![ChatMessage::system(long_prompt)];
        messages.extend(exchange(0));

        trim(&mut messages, 10);

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::System);
    }

    #[test]
    fn test_trim_leaves_small_histories_alone() {
        let mut messages = vec![ChatMessage::system("stay")];
        messages.extend(exchange(0));
        let before = messages.clone();

        trim(&mut messages, 64000);

        assert_eq!(messages, before);
    }

    #[test]
    fn test_store_is_lazy_and_isolated() {
        let store = ConversationStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(store.session_count(), 0);
        assert!(store.history(a).is_empty());
        assert_eq!(store.session_count(), 0);

        store.push(a, ChatMessage::user("only for a"));
        assert_eq!(store.session_count(), 1);
        assert!(store.history(b).is_empty());
        assert_eq!(store.history(a).len(), 1);
    }

    #[test]
    fn test_forget_removes_the_session_entry() {
        let store = ConversationStore::new();
        let id = Uuid::new_v4();
        store.push(id, ChatMessage::user("hello"));
        assert_eq!(store.session_count(), 1);

        store.forget(id);
        assert_eq!(store.session_count(), 0);
        assert!(store.history(id).is_empty());
    }
}
