//! Loaders that fetch the feed and image data over HTTP.

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use super::api_types::{map_comments, map_feed, map_image_data};
use super::client::HttpClient;
use super::types::{FeedImage, ImageComment};
use crate::error::{Result, SourceError};
use crate::loader::Loader;

/// Default number of feed items requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Fetches feed pages from the feed endpoint.
#[derive(Clone)]
pub struct RemoteFeedLoader {
  client: Arc<dyn HttpClient>,
  url: Url,
  page_size: usize,
}

impl RemoteFeedLoader {
  pub fn new(client: Arc<dyn HttpClient>, url: Url) -> Self {
    Self {
      client,
      url,
      page_size: DEFAULT_PAGE_SIZE,
    }
  }

  pub fn with_page_size(mut self, page_size: usize) -> Self {
    self.page_size = page_size;
    self
  }

  /// Endpoint for the page that follows `after` (or the first page).
  pub fn endpoint(&self, after: Option<&FeedImage>) -> Url {
    let mut url = self.url.clone();
    {
      let mut query = url.query_pairs_mut();
      query.append_pair("limit", &self.page_size.to_string());
      if let Some(last) = after {
        query.append_pair("after_id", &last.id.to_string());
      }
    }
    url
  }

  /// Load the page that follows `after`.
  pub async fn load_page(&self, after: Option<&FeedImage>) -> Result<Vec<FeedImage>> {
    let response = self.client.get(&self.endpoint(after)).await?;
    Ok(map_feed(&response)?)
  }
}

/// The unit key loads the first page.
#[async_trait]
impl Loader<(), Vec<FeedImage>> for RemoteFeedLoader {
  async fn load(&self, _key: &()) -> Result<Vec<FeedImage>> {
    self.load_page(None).await
  }
}

/// Fetches raw image bytes by URL.
#[derive(Clone)]
pub struct RemoteImageDataLoader {
  client: Arc<dyn HttpClient>,
}

impl RemoteImageDataLoader {
  pub fn new(client: Arc<dyn HttpClient>) -> Self {
    Self { client }
  }
}

#[async_trait]
impl Loader<Url, Vec<u8>> for RemoteImageDataLoader {
  async fn load(&self, url: &Url) -> Result<Vec<u8>> {
    let response = self.client.get(url).await?;
    Ok(map_image_data(response)?)
  }
}

/// Fetches the comments of one feed image.
///
/// The endpoint is `image/{id}/comments` resolved against the feed endpoint, so
/// `https://host/api/v1/feed` gives `https://host/api/v1/image/{id}/comments`.
#[derive(Clone)]
pub struct RemoteImageCommentsLoader {
  client: Arc<dyn HttpClient>,
  feed_url: Url,
}

impl RemoteImageCommentsLoader {
  pub fn new(client: Arc<dyn HttpClient>, feed_url: Url) -> Self {
    Self { client, feed_url }
  }

  pub fn endpoint(&self, image_id: &Uuid) -> std::result::Result<Url, SourceError> {
    self
      .feed_url
      .join(&format!("image/{}/comments", image_id))
      .map_err(|e| SourceError::Connectivity(format!("Invalid comments URL: {}", e)))
  }
}

#[async_trait]
impl Loader<Uuid, Vec<ImageComment>> for RemoteImageCommentsLoader {
  async fn load(&self, image_id: &Uuid) -> Result<Vec<ImageComment>> {
    let response = self.client.get(&self.endpoint(image_id)?).await?;
    Ok(map_comments(&response)?)
  }
}
