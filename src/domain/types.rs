//! # Domain Types
//!
//! Common data structures used across the application logic.

use serde::{Deserialize, Serialize};

pub type FeedId = String;

/// A data source registered to a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Feed {
    pub id: FeedId,
    /// Room the feed belongs to.
    pub guild: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Embed {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub color: Option<u32>,
}

/// Custom output settings bound to a single feed.
///
/// `text` is the message template; `embeds` is the structured rendering that
/// can stand in for it. A record with neither carries no information.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Format {
    pub feed: FeedId,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
}

impl Format {
    pub fn new(feed: FeedId, text: Option<String>) -> Self {
        Self {
            feed,
            text,
            embeds: Vec::new(),
        }
    }

    pub fn has_embeds(&self) -> bool {
        !self.embeds.is_empty()
    }
}

/// Per-room settings overriding the global configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub guild: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
}

/// Decision produced by the message prompt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Setting {
    /// Drop the custom template and fall back to the default one.
    Clear,
    Text(String),
}

/// A single message a user sent while a dialog was waiting on them.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub sender: String,
    pub content: String,
}

impl Reply {
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
        }
    }
}
