//! # JSON Store
//!
//! Keeps profiles, feeds and message formats in a single JSON document
//! (`data/feeds.json` by default). The whole document is rewritten after
//! every mutation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::domain::traits::{FeedSource, FormatStore, ProfileStore, StoreError};
use crate::domain::types::{Feed, FeedId, Format, Profile};

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreDocument {
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub feeds: Vec<Feed>,
    #[serde(default)]
    pub formats: Vec<Format>,
}

pub struct JsonStore {
    path: Option<PathBuf>,
    document: Mutex<StoreDocument>,
}

impl JsonStore {
    /// Loads the document at `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let document = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreDocument::default(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        tracing::info!(
            "Loaded {} feeds and {} formats from {}",
            document.feeds.len(),
            document.formats.len(),
            path.display()
        );
        Ok(Self::from_document(path, document))
    }

    /// Wraps an already loaded document that is written back to `path`.
    pub fn from_document(path: impl Into<PathBuf>, document: StoreDocument) -> Self {
        Self {
            path: Some(path.into()),
            document: Mutex::new(document),
        }
    }

    /// A store that never touches the filesystem.
    #[cfg(test)]
    pub fn in_memory(document: StoreDocument) -> Self {
        Self {
            path: None,
            document: Mutex::new(document),
        }
    }

    #[cfg(test)]
    pub async fn snapshot(&self) -> StoreDocument {
        self.document.lock().await.clone()
    }

    /// Applies `change` to a copy of the document and keeps the copy only
    /// once it has been written.
    async fn update<F>(&self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut StoreDocument) + Send,
    {
        let mut document = self.document.lock().await;
        let mut next = document.clone();
        change(&mut next);
        self.persist(&next).await?;
        *document = next;
        Ok(())
    }

    async fn persist(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(document)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir(parent).await?;
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|source| StoreError::Write {
                path: path.clone(),
                source,
            })
    }
}

async fn create_dir(dir: &Path) -> Result<(), StoreError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| StoreError::Write {
            path: dir.to_path_buf(),
            source,
        })
}

#[async_trait]
impl ProfileStore for JsonStore {
    async fn profile(&self, guild: &str) -> Result<Option<Profile>, StoreError> {
        let document = self.document.lock().await;
        Ok(document.profiles.iter().find(|p| p.guild == guild).cloned())
    }
}

#[async_trait]
impl FeedSource for JsonStore {
    async fn feeds(&self, guild: &str) -> Result<Vec<Feed>, StoreError> {
        let document = self.document.lock().await;
        Ok(document
            .feeds
            .iter()
            .filter(|f| f.guild == guild)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FormatStore for JsonStore {
    async fn format(&self, feed: &FeedId) -> Result<Option<Format>, StoreError> {
        let document = self.document.lock().await;
        Ok(document.formats.iter().find(|f| &f.feed == feed).cloned())
    }

    async fn save(&self, format: &Format) -> Result<(), StoreError> {
        self.update(|document| {
            match document.formats.iter_mut().find(|f| f.feed == format.feed) {
                Some(existing) => *existing = format.clone(),
                None => document.formats.push(format.clone()),
            }
        })
        .await
    }

    async fn delete(&self, format: &Format) -> Result<(), StoreError> {
        self.update(|document| document.formats.retain(|f| f.feed != format.feed))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::feed;

    fn document() -> StoreDocument {
        StoreDocument {
            profiles: vec![Profile {
                guild: "!a:x".to_string(),
                locale: Some("de-DE".to_string()),
                prefix: None,
            }],
            feeds: vec![feed("1", "!a:x"), feed("2", "!b:x"), feed("3", "!a:x")],
            formats: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_feeds_filtered_by_room_in_order() {
        let store = JsonStore::in_memory(document());
        let ids: Vec<_> = store
            .feeds("!a:x")
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!(store.feeds("!none:x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_profile_lookup() {
        let store = JsonStore::in_memory(document());
        let profile = store.profile("!a:x").await.unwrap().unwrap();
        assert_eq!(profile.locale.as_deref(), Some("de-DE"));
        assert!(store.profile("!b:x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_updates_existing_record() {
        let store = JsonStore::in_memory(document());
        store
            .save(&Format::new("1".to_string(), Some("first".to_string())))
            .await
            .unwrap();
        store
            .save(&Format::new("1".to_string(), Some("second".to_string())))
            .await
            .unwrap();

        let formats = store.snapshot().await.formats;
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].text.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path().join("feeds.json")).await.unwrap();
        assert_eq!(store.snapshot().await, StoreDocument::default());
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("feeds.json");

        let store = JsonStore::from_document(&path, document());
        let format = Format::new("3".to_string(), Some("Alert: {subscriptions}".to_string()));
        store.save(&format).await.unwrap();

        let reopened = JsonStore::open(&path).await.unwrap();
        assert_eq!(reopened.format(&"3".to_string()).await.unwrap(), Some(format.clone()));
        assert_eq!(reopened.feeds("!a:x").await.unwrap().len(), 2);

        reopened.delete(&format).await.unwrap();
        let again = JsonStore::open(&path).await.unwrap();
        assert!(again.format(&"3".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feeds.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            JsonStore::open(&path).await,
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // The target path is a directory, so writing the file fails.
        let store = JsonStore::from_document(dir.path(), document());
        let result = store
            .save(&Format::new("1".to_string(), Some("x".to_string())))
            .await;
        assert!(matches!(result, Err(StoreError::Write { .. })));
        assert!(store.snapshot().await.formats.is_empty());
        assert!(store.format(&"1".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_record() {
        let dir = tempfile::tempdir().unwrap();
        let format = Format::new("1".to_string(), Some("kept".to_string()));
        let mut seeded = document();
        seeded.formats.push(format.clone());

        let store = JsonStore::from_document(dir.path(), seeded);
        assert!(store.delete(&format).await.is_err());
        assert_eq!(store.format(&"1".to_string()).await.unwrap(), Some(format));
    }
}
