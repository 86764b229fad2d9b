//! # Bot State
//!
//! Tracks the dialogs that are currently waiting on a user. While a dialog is
//! open for a (room, user) pair, that user's messages in the room are delivered
//! to the dialog's [`Inbox`] instead of being parsed as commands.
//! Open dialogs are not persisted; a restart drops them.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::domain::traits::{ChatError, ReplySource};
use crate::domain::types::Reply;

const INBOX_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub room: String,
    pub user: String,
}

impl ConversationKey {
    pub fn new(room: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            user: user.into(),
        }
    }
}

/// Receiving end of an open dialog.
pub struct Inbox {
    rx: mpsc::Receiver<Reply>,
}

#[async_trait]
impl ReplySource for Inbox {
    async fn next_reply(&mut self, deadline: Instant) -> Result<Option<Reply>, ChatError> {
        match tokio::time::timeout_at(deadline, self.rx.recv()).await {
            Ok(Some(reply)) => Ok(Some(reply)),
            Ok(None) => Err(ChatError::Closed),
            Err(_) => Ok(None),
        }
    }

    fn close(&mut self) {
        self.rx.close();
    }
}

#[derive(Debug, Default)]
pub struct BotState {
    conversations: HashMap<ConversationKey, mpsc::Sender<Reply>>,
}

impl BotState {
    /// Opens a dialog, or returns `None` when one is already open for `key`.
    pub fn open(&mut self, key: ConversationKey) -> Option<Inbox> {
        if self.is_active(&key) {
            return None;
        }
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        self.conversations.insert(key, tx);
        Some(Inbox { rx })
    }

    /// Forgets the dialog for `key` once its inbox is closed. A dialog that
    /// was opened again in the meantime stays registered.
    pub fn release(&mut self, key: &ConversationKey) {
        if self.conversations.get(key).is_some_and(|tx| tx.is_closed()) {
            self.conversations.remove(key);
        }
    }

    pub fn is_active(&self, key: &ConversationKey) -> bool {
        self.conversations
            .get(key)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Sender of the open dialog for `key`, if any.
    pub fn inbox_for(&self, key: &ConversationKey) -> Option<mpsc::Sender<Reply>> {
        self.conversations
            .get(key)
            .filter(|tx| !tx.is_closed())
            .cloned()
    }

    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.conversations.values().filter(|tx| !tx.is_closed()).count()
    }
}
