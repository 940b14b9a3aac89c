//! In-process conversation history.
//!
//! Contexts are created lazily on first append and live for the process
//! lifetime; messages are append-only. Appends for one context are
//! serialized behind that context's lock while distinct contexts proceed
//! in parallel; the outer map lock is held only long enough to find or
//! create the entry.

use async_trait::async_trait;
use pkgpulse_proto::Message;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Storage seam for conversation logs.
///
/// The dispatcher only needs these three capabilities, so a persistent
/// backend can replace the in-memory store without touching it.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append one message to a context, creating the context if needed.
    async fn append(&self, context_id: &str, message: Message);

    /// Append a batch of messages in order, under one lock hold.
    async fn append_all(&self, context_id: &str, messages: Vec<Message>);

    /// Clone the current history of a context (empty if unknown).
    async fn snapshot(&self, context_id: &str) -> Vec<Message>;
}

type ContextLog = Arc<Mutex<Vec<Message>>>;

/// Volatile conversation store keyed by context id.
#[derive(Default)]
pub struct InMemoryConversations {
    contexts: RwLock<HashMap<String, ContextLog>>,
}

impl InMemoryConversations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, context_id: &str) -> ContextLog {
        if let Some(log) = self.contexts.read().await.get(context_id) {
            return log.clone();
        }

        let mut contexts = self.contexts.write().await;
        contexts.entry(context_id.to_string()).or_default().clone()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversations {
    async fn append(&self, context_id: &str, message: Message) {
        let log = self.entry(context_id).await;
        log.lock().await.push(message);
    }

    async fn append_all(&self, context_id: &str, messages: Vec<Message>) {
        let log = self.entry(context_id).await;
        log.lock().await.extend(messages);
    }

    async fn snapshot(&self, context_id: &str) -> Vec<Message> {
        let log = { self.contexts.read().await.get(context_id).cloned() };
        match log {
            Some(log) => log.lock().await.clone(),
            None => Vec::new(),
        }
    }
}
