//! Durable store capabilities and the storage-side feed representation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::StoreError;
use crate::feed::FeedImage;

/// Feed image as it is persisted by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFeedImage {
  pub id: Uuid,
  pub description: Option<String>,
  pub location: Option<String>,
  pub url: Url,
}

impl From<&FeedImage> for LocalFeedImage {
  fn from(image: &FeedImage) -> Self {
    Self {
      id: image.id,
      description: image.description.clone(),
      location: image.location.clone(),
      url: image.url.clone(),
    }
  }
}

impl From<LocalFeedImage> for FeedImage {
  fn from(local: LocalFeedImage) -> Self {
    Self {
      id: local.id,
      description: local.description,
      location: local.location,
      url: local.url,
    }
  }
}

/// The single cached feed snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFeed {
  pub feed: Vec<LocalFeedImage>,
  /// When the snapshot was written
  pub timestamp: DateTime<Utc>,
}

/// Storage for the cached feed snapshot.
///
/// Implementations must execute operations in submission order.
#[async_trait]
pub trait FeedStore: Send + Sync {
  /// Remove the snapshot. Succeeds when there is nothing to delete.
  async fn delete_cached_feed(&self) -> Result<(), StoreError>;

  /// Store a snapshot, replacing any existing one.
  async fn insert(&self, feed: &[LocalFeedImage], timestamp: DateTime<Utc>)
    -> Result<(), StoreError>;

  /// Get the snapshot, if any.
  async fn retrieve(&self) -> Result<Option<CachedFeed>, StoreError>;
}

/// Storage for image bytes keyed by URL.
#[async_trait]
pub trait ImageDataStore: Send + Sync {
  /// Store `data` for `url`, overwriting any previous value.
  async fn insert_data(&self, data: &[u8], url: &Url) -> Result<(), StoreError>;

  /// Get the data stored for `url`, if any.
  async fn retrieve_data(&self, url: &Url) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Store implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NullStore;

#[async_trait]
impl FeedStore for NullStore {
  async fn delete_cached_feed(&self) -> Result<(), StoreError> {
    Ok(())
  }

  async fn insert(
    &self,
    _feed: &[LocalFeedImage],
    _timestamp: DateTime<Utc>,
  ) -> Result<(), StoreError> {
    Ok(()) // Discard
  }

  async fn retrieve(&self) -> Result<Option<CachedFeed>, StoreError> {
    Ok(None) // Always miss
  }
}

#[async_trait]
impl ImageDataStore for NullStore {
  async fn insert_data(&self, _data: &[u8], _url: &Url) -> Result<(), StoreError> {
    Ok(()) // Discard
  }

  async fn retrieve_data(&self, _url: &Url) -> Result<Option<Vec<u8>>, StoreError> {
    Ok(None) // Always miss
  }
}
