//! Serde-deserializable types matching the feed API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use super::types::{FeedImage, ImageComment};
use crate::error::SourceError;

const OK_STATUS: u16 = 200;

/// Minimal view of an HTTP response, enough for the mappers below.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

impl HttpResponse {
  pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
    Self {
      status,
      body: body.into(),
    }
  }
}

// ============================================================================
// Feed page endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiFeedResponse {
  pub items: Vec<ApiFeedItem>,
}

#[derive(Debug, Deserialize)]
pub struct ApiFeedItem {
  pub id: Uuid,
  pub description: Option<String>,
  pub location: Option<String>,
  pub image: Url,
}

impl From<ApiFeedItem> for FeedImage {
  fn from(item: ApiFeedItem) -> Self {
    FeedImage {
      id: item.id,
      description: item.description,
      location: item.location,
      url: item.image,
    }
  }
}

/// Map a feed page response into feed images.
pub fn map_feed(response: &HttpResponse) -> Result<Vec<FeedImage>, SourceError> {
  if response.status != OK_STATUS {
    return Err(SourceError::InvalidPayload(format!(
      "unexpected status {}",
      response.status
    )));
  }

  let root: ApiFeedResponse = serde_json::from_slice(&response.body)
    .map_err(|e| SourceError::InvalidPayload(format!("malformed feed: {}", e)))?;

  Ok(root.items.into_iter().map(FeedImage::from).collect())
}

// ============================================================================
// Image comments endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiCommentsResponse {
  pub items: Vec<ApiComment>,
}

#[derive(Debug, Deserialize)]
pub struct ApiComment {
  pub id: Uuid,
  pub message: String,
  pub created_at: DateTime<Utc>,
  pub author: ApiCommentAuthor,
}

#[derive(Debug, Deserialize)]
pub struct ApiCommentAuthor {
  pub username: String,
}

impl From<ApiComment> for ImageComment {
  fn from(item: ApiComment) -> Self {
    ImageComment {
      id: item.id,
      message: item.message,
      created_at: item.created_at,
      username: item.author.username,
    }
  }
}

/// Map an image comments response. Unlike the feed, any 2xx status is accepted.
pub fn map_comments(response: &HttpResponse) -> Result<Vec<ImageComment>, SourceError> {
  if !(200..=299).contains(&response.status) {
    return Err(SourceError::InvalidPayload(format!(
      "unexpected status {}",
      response.status
    )));
  }

  let root: ApiCommentsResponse = serde_json::from_slice(&response.body)
    .map_err(|e| SourceError::InvalidPayload(format!("malformed comments: {}", e)))?;

  Ok(root.items.into_iter().map(ImageComment::from).collect())
}

/// Map an image response into its raw bytes.
pub fn map_image_data(response: HttpResponse) -> Result<Vec<u8>, SourceError> {
  if response.status != OK_STATUS {
    return Err(SourceError::InvalidPayload(format!(
      "unexpected status {}",
      response.status
    )));
  }

  if response.body.is_empty() {
    return Err(SourceError::InvalidPayload("empty image data".to_string()));
  }

  Ok(response.body)
}
