//! In-memory store, for tests and ephemeral sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use url::Url;

use super::storage::{CachedFeed, FeedStore, ImageDataStore, LocalFeedImage};
use crate::error::StoreError;

#[derive(Default)]
struct State {
  feed: Option<CachedFeed>,
  images: HashMap<Url, Vec<u8>>,
}

/// Store that keeps everything in process memory.
///
/// Each operation runs to completion under a single lock, so operations
/// complete in the order they are issued.
#[derive(Default)]
pub struct InMemoryStore {
  state: Mutex<State>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start with `cache` as the stored snapshot.
  pub fn with_feed_cache(cache: CachedFeed) -> Self {
    Self {
      state: Mutex::new(State {
        feed: Some(cache),
        images: HashMap::new(),
      }),
    }
  }

  fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
    self
      .state
      .lock()
      .map_err(|e| StoreError::Backend(format!("Lock poisoned: {}", e)))
  }
}

#[async_trait]
impl FeedStore for InMemoryStore {
  async fn delete_cached_feed(&self) -> Result<(), StoreError> {
    self.lock()?.feed = None;
    Ok(())
  }

  async fn insert(
    &self,
    feed: &[LocalFeedImage],
    timestamp: DateTime<Utc>,
  ) -> Result<(), StoreError> {
    self.lock()?.feed = Some(CachedFeed {
      feed: feed.to_vec(),
      timestamp,
    });
    Ok(())
  }

  async fn retrieve(&self) -> Result<Option<CachedFeed>, StoreError> {
    Ok(self.lock()?.feed.clone())
  }
}

#[async_trait]
impl ImageDataStore for InMemoryStore {
  async fn insert_data(&self, data: &[u8], url: &Url) -> Result<(), StoreError> {
    self.lock()?.images.insert(url.clone(), data.to_vec());
    Ok(())
  }

  async fn retrieve_data(&self, url: &Url) -> Result<Option<Vec<u8>>, StoreError> {
    Ok(self.lock()?.images.get(url).cloned())
  }
}
