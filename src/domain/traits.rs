//! # Domain Traits
//!
//! Abstract interfaces for the collaborators the command core consumes (chat
//! channel, reply stream, settings and template stores).
//! Allows for pluggable implementations in the Infrastructure layer.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::time::Instant;

use crate::domain::types::{Feed, FeedId, Format, Profile, Reply};

/// Failures reported by a chat channel.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChatError {
    /// The bot is not allowed to post in the room. Nothing can be reported back.
    #[error("missing permission to post in this room: {0}")]
    PermissionDenied(String),
    #[error("failed to send message: {0}")]
    Send(String),
    /// The reply stream ended before the dialog finished.
    #[error("conversation closed")]
    Closed,
}

/// Abstract interface for a Chat Provider (e.g., Matrix, Console)
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a message to the room, returning the event id
    async fn send_message(&self, content: &str) -> Result<String, ChatError>;

    /// Get the current room ID
    fn room_id(&self) -> String;
}

/// The reply-waiting half of a conversation.
#[async_trait]
pub trait ReplySource: Send {
    /// Waits for the next reply until `deadline`. `Ok(None)` means the deadline passed.
    async fn next_reply(&mut self, deadline: Instant) -> Result<Option<Reply>, ChatError>;

    /// Stops accepting replies. Messages sent afterwards are no longer
    /// captured by this conversation.
    fn close(&mut self);
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read store at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write store at {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Resolves the settings profile of a room.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn profile(&self, guild: &str) -> Result<Option<Profile>, StoreError>;
}

/// Lists the feeds registered to a room, in registration order.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn feeds(&self, guild: &str) -> Result<Vec<Feed>, StoreError>;
}

/// Repository of per-feed formats with explicit create/update/delete.
#[async_trait]
pub trait FormatStore: Send + Sync {
    async fn format(&self, feed: &FeedId) -> Result<Option<Format>, StoreError>;

    /// Creates the record or replaces the one stored for the same feed.
    async fn save(&self, format: &Format) -> Result<(), StoreError>;

    async fn delete(&self, format: &Format) -> Result<(), StoreError>;
}
