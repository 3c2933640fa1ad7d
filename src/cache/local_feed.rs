//! Local feed cache that orchestrates the store and the cache policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use super::policy;
use super::storage::{FeedStore, LocalFeedImage};
use crate::error::Result;
use crate::feed::FeedImage;
use crate::loader::{Cache, Loader};

/// Source of "now".
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Loads, saves and validates the cached feed snapshot.
///
/// Loading never mutates the store: an expired snapshot reads as an empty
/// feed and is only removed by [`LocalFeedLoader::validate_cache`].
pub struct LocalFeedLoader<S: FeedStore + ?Sized> {
  store: Arc<S>,
  current_date: Clock,
}

impl<S: FeedStore + ?Sized> LocalFeedLoader<S> {
  pub fn new(store: Arc<S>, current_date: Clock) -> Self {
    Self {
      store,
      current_date,
    }
  }

  /// Loader driven by the system clock.
  pub fn with_system_clock(store: Arc<S>) -> Self {
    Self::new(store, Arc::new(Utc::now))
  }

  /// Replace the cached snapshot with `feed`, stamped with the current time.
  ///
  /// A failed deletion aborts the save. A failed insertion leaves the cache empty.
  pub async fn save(&self, feed: &[FeedImage]) -> Result<()> {
    self.store.delete_cached_feed().await?;

    let local: Vec<LocalFeedImage> = feed.iter().map(LocalFeedImage::from).collect();
    self.store.insert(&local, (self.current_date)()).await?;

    Ok(())
  }

  /// Load the cached feed, treating a missing or expired snapshot as empty.
  pub async fn load(&self) -> Result<Vec<FeedImage>> {
    match self.store.retrieve().await? {
      Some(cache) if policy::is_fresh(cache.timestamp, (self.current_date)()) => {
        Ok(cache.feed.into_iter().map(FeedImage::from).collect())
      }
      Some(_) => {
        debug!("Cached feed expired");
        Ok(Vec::new())
      }
      None => Ok(Vec::new()),
    }
  }

  /// Delete the snapshot if it is expired or cannot be read.
  ///
  /// Deletion is best-effort: failures are logged and not reported.
  pub async fn validate_cache(&self) {
    let should_delete = match self.store.retrieve().await {
      Ok(Some(cache)) => !policy::is_fresh(cache.timestamp, (self.current_date)()),
      Ok(None) => false,
      Err(error) => {
        warn!(%error, "Failed to read cached feed, discarding it");
        true
      }
    };

    if should_delete {
      if let Err(error) = self.store.delete_cached_feed().await {
        warn!(%error, "Failed to delete invalid cached feed");
      }
    }
  }
}

impl<S: FeedStore + ?Sized> Clone for LocalFeedLoader<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      current_date: Arc::clone(&self.current_date),
    }
  }
}

#[async_trait]
impl<S: FeedStore + ?Sized> Loader<(), Vec<FeedImage>> for LocalFeedLoader<S> {
  async fn load(&self, _key: &()) -> Result<Vec<FeedImage>> {
    LocalFeedLoader::load(self).await
  }
}

#[async_trait]
impl<S: FeedStore + ?Sized> Cache<(), Vec<FeedImage>> for LocalFeedLoader<S> {
  async fn save(&self, feed: &Vec<FeedImage>, _key: &()) -> Result<()> {
    LocalFeedLoader::save(self, feed).await
  }
}
