//! In-memory fakes shared by the unit tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use crate::application::prompt::{Candidate, Context, OnSelect, StepError};
use crate::domain::config::AppConfig;
use crate::domain::traits::{
    ChatError, ChatProvider, FeedSource, FormatStore, ProfileStore, ReplySource, StoreError,
};
use crate::domain::types::{Embed, Feed, FeedId, Format, Profile, Reply};
use crate::infrastructure::storage::{JsonStore, StoreDocument};

pub const TEST_CONFIG: &str = r#"
services:
  matrix:
    username: "@bot:example.org"
    password: "secret"
    homeserver: "https://matrix.example.org"
bot:
  prefix: "rss."
feeds:
  default_message: "DEFAULT {link}"
prompts:
  timeout_secs: 5
"#;

pub fn test_config() -> AppConfig {
    AppConfig::parse(TEST_CONFIG).unwrap()
}

/// Records every message it is asked to send.
#[derive(Clone)]
pub struct RecordingChat {
    room: String,
    sent: Arc<Mutex<Vec<String>>>,
    attempts: Arc<Mutex<usize>>,
    /// Sends allowed before every further one fails with the error.
    fail_with: Option<(usize, ChatError)>,
}

impl RecordingChat {
    pub fn new(room: &str) -> Self {
        Self {
            room: room.to_string(),
            sent: Arc::default(),
            attempts: Arc::default(),
            fail_with: None,
        }
    }

    /// Every send fails with `err`.
    pub fn failing(room: &str, err: ChatError) -> Self {
        Self::failing_after(room, 0, err)
    }

    /// The first `sends` messages go through, the rest fail with `err`.
    pub fn failing_after(room: &str, sends: usize, err: ChatError) -> Self {
        Self {
            fail_with: Some((sends, err)),
            ..Self::new(room)
        }
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl ChatProvider for RecordingChat {
    async fn send_message(&self, content: &str) -> Result<String, ChatError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            *attempts
        };
        if let Some((sends, err)) = &self.fail_with {
            if attempt > *sends {
                return Err(err.clone());
            }
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(content.to_string());
        Ok(format!("$event{}", sent.len()))
    }

    fn room_id(&self) -> String {
        self.room.clone()
    }
}

/// Hands out a fixed list of replies, then reports a timeout.
pub struct ScriptedReplies {
    replies: VecDeque<Reply>,
    polls: usize,
    closed: bool,
}

impl ScriptedReplies {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies.iter().map(|r| Reply::new("@user:x", *r)).collect(),
            polls: 0,
            closed: false,
        }
    }

    pub fn polls(&self) -> usize {
        self.polls
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl ReplySource for ScriptedReplies {
    async fn next_reply(&mut self, _deadline: Instant) -> Result<Option<Reply>, ChatError> {
        self.polls += 1;
        if self.closed {
            return Err(ChatError::Closed);
        }
        Ok(self.replies.pop_front())
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fruit {
    pub id: String,
    pub name: String,
}

impl Candidate for Fruit {
    fn label(&self) -> String {
        self.name.clone()
    }

    fn key(&self) -> String {
        self.id.clone()
    }
}

/// Selection hook that leaves the context as it is.
pub struct NoEnrichment;

#[async_trait]
impl<C: Sync> OnSelect<C> for NoEnrichment {
    async fn on_select(&self, _selected: &C, ctx: Context) -> Result<Context, StepError> {
        Ok(ctx)
    }
}

pub fn fruit_candidates(names: &[&str]) -> Vec<Fruit> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Fruit {
            id: format!("f{}", i + 1),
            name: name.to_string(),
        })
        .collect()
}

pub fn feed(id: &str, guild: &str) -> Feed {
    Feed {
        id: id.to_string(),
        guild: guild.to_string(),
        url: format!("https://example.org/{id}.xml"),
        title: Some(format!("Feed {id}")),
    }
}

pub fn embed() -> Embed {
    Embed {
        title: Some("{title}".to_string()),
        ..Embed::default()
    }
}

/// Store holding `feeds`, optional formats and no profiles.
pub fn store(feeds: Vec<Feed>, formats: Vec<Format>) -> JsonStore {
    JsonStore::in_memory(StoreDocument {
        profiles: Vec::new(),
        feeds,
        formats,
    })
}

pub fn store_with_profile(feeds: Vec<Feed>, profile: Profile) -> JsonStore {
    JsonStore::in_memory(StoreDocument {
        profiles: vec![profile],
        feeds,
        formats: Vec::new(),
    })
}

/// Wraps a [`JsonStore`] and counts the writes made through it.
pub struct CountingStore {
    pub inner: JsonStore,
    writes: Mutex<usize>,
}

impl CountingStore {
    pub fn new(inner: JsonStore) -> Self {
        Self {
            inner,
            writes: Mutex::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    fn count(&self) {
        *self.writes.lock().unwrap() += 1;
    }
}

#[async_trait]
impl ProfileStore for CountingStore {
    async fn profile(&self, guild: &str) -> Result<Option<Profile>, StoreError> {
        self.inner.profile(guild).await
    }
}

#[async_trait]
impl FeedSource for CountingStore {
    async fn feeds(&self, guild: &str) -> Result<Vec<Feed>, StoreError> {
        self.inner.feeds(guild).await
    }
}

#[async_trait]
impl FormatStore for CountingStore {
    async fn format(&self, feed: &FeedId) -> Result<Option<Format>, StoreError> {
        self.inner.format(feed).await
    }

    async fn save(&self, format: &Format) -> Result<(), StoreError> {
        self.count();
        self.inner.save(format).await
    }

    async fn delete(&self, format: &Format) -> Result<(), StoreError> {
        self.count();
        self.inner.delete(format).await
    }
}
