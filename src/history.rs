//! Bounded conversation history shared across turns
//!
//! The buffer is a plain sliding window over individual messages. When an
//! exchange pushes it past capacity the oldest message is dropped, one at a
//! time, without regard for user/assistant pairing. With an odd capacity the
//! window can therefore begin on an `assistant` message.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Default number of retained messages (10 exchanges)
pub const MAX_MESSAGES: usize = 20;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instruction prefix, injected per call and never stored
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single role-tagged utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Process-wide conversation memory
///
/// Every append (push both messages, then evict) happens under one write
/// lock, so concurrent turns never lose an exchange or evict against a stale
/// length. Turns are not isolated from each other: all callers share one
/// conversation.
#[derive(Debug)]
pub struct ConversationBuffer {
    max_messages: usize,
    messages: RwLock<VecDeque<ChatMessage>>,
}

impl Default for ConversationBuffer {
    fn default() -> Self {
        Self::new(MAX_MESSAGES)
    }
}

impl ConversationBuffer {
    /// Create an empty buffer retaining at most `max_messages` messages
    #[must_use]
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages,
            messages: RwLock::new(VecDeque::with_capacity(max_messages.saturating_add(2))),
        }
    }

    /// Maximum number of retained messages
    #[must_use]
    pub const fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Copy of the current history, oldest first
    pub async fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.read().await.iter().cloned().collect()
    }

    /// Record a completed exchange and trim the window back to capacity
    pub async fn append_exchange(
        &self,
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
    ) {
        let mut messages = self.messages.write().await;
        messages.push_back(ChatMessage::user(user_text));
        messages.push_back(ChatMessage::assistant(assistant_text));

        let mut evicted = 0_usize;
        while messages.len() > self.max_messages {
            messages.pop_front();
            evicted += 1;
        }

        tracing::debug!(
            len = messages.len(),
            evicted,
            max = self.max_messages,
            "appended exchange to history"
        );
    }

    /// Number of retained messages
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Whether the history is empty
    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn starts_empty() {
        let buffer = ConversationBuffer::default();
        assert!(buffer.is_empty().await);
        assert_eq!(buffer.max_messages(), MAX_MESSAGES);
        assert!(buffer.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn append_pushes_user_then_assistant() {
        let buffer = ConversationBuffer::default();
        buffer.append_exchange("hi", "hello there").await;

        assert_eq!(
            buffer.snapshot().await,
            vec![ChatMessage::user("hi"), ChatMessage::assistant("hello there")]
        );
    }

    #[tokio::test]
    async fn empty_texts_are_recorded() {
        let buffer = ConversationBuffer::default();
        buffer.append_exchange("", "").await;

        assert_eq!(
            buffer.snapshot().await,
            vec![ChatMessage::user(""), ChatMessage::assistant("")]
        );
    }

    #[tokio::test]
    async fn never_exceeds_capacity() {
        let buffer = ConversationBuffer::new(6);
        for i in 0..25 {
            buffer
                .append_exchange(format!("user_{i}"), format!("assistant_{i}"))
                .await;
            assert!(buffer.len().await <= 6, "over capacity after exchange {i}");
        }
    }

    #[tokio::test]
    async fn eleventh_exchange_evicts_the_first() {
        let buffer = ConversationBuffer::default();
        for i in 1..=11 {
            buffer
                .append_exchange(format!("user_{i}"), format!("assistant_{i}"))
                .await;
        }

        let snapshot = buffer.snapshot().await;
        assert_eq!(snapshot.len(), 20);
        assert_eq!(snapshot[0], ChatMessage::user("user_2"));
        assert_eq!(snapshot[1], ChatMessage::assistant("assistant_2"));
        assert_eq!(snapshot[19], ChatMessage::assistant("assistant_11"));
    }

    #[tokio::test]
    async fn eviction_preserves_survivor_order() {
        let buffer = ConversationBuffer::new(4);
        for i in 0..3 {
            buffer
                .append_exchange(format!("u{i}"), format!("a{i}"))
                .await;
        }

        let contents: Vec<String> = buffer
            .snapshot()
            .await
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, ["u1", "a1", "u2", "a2"]);
    }

    #[tokio::test]
    async fn odd_capacity_window_starts_on_assistant() {
        let buffer = ConversationBuffer::new(3);
        buffer.append_exchange("u0", "a0").await;
        buffer.append_exchange("u1", "a1").await;

        let snapshot = buffer.snapshot().await;
        assert_eq!(
            snapshot,
            vec![
                ChatMessage::assistant("a0"),
                ChatMessage::user("u1"),
                ChatMessage::assistant("a1"),
            ]
        );
    }

    #[tokio::test]
    async fn zero_capacity_retains_nothing() {
        let buffer = ConversationBuffer::new(0);
        buffer.append_exchange("u", "a").await;
        assert!(buffer.is_empty().await);
    }

    #[tokio::test]
    async fn snapshot_is_detached_from_later_appends() {
        let buffer = ConversationBuffer::default();
        buffer.append_exchange("u0", "a0").await;
        let before = buffer.snapshot().await;

        buffer.append_exchange("u1", "a1").await;
        assert_eq!(before.len(), 2);
        assert_eq!(buffer.len().await, 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_are_not_lost() {
        let buffer = Arc::new(ConversationBuffer::new(1000));
        let mut handles = Vec::new();
        for i in 0..50 {
            let buffer = Arc::clone(&buffer);
            handles.push(tokio::spawn(async move {
                buffer
                    .append_exchange(format!("u{i}"), format!("a{i}"))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snapshot = buffer.snapshot().await;
        assert_eq!(snapshot.len(), 100);
        // Each exchange stays contiguous
        for pair in snapshot.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
            assert_eq!(pair[0].content[1..], pair[1].content[1..]);
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
        assert_eq!(Role::System.to_string(), "system");
    }
}
