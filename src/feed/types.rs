use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// One image of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedImage {
  pub id: Uuid,
  pub description: Option<String>,
  pub location: Option<String>,
  pub url: Url,
}

impl FeedImage {
  pub fn new(id: Uuid, url: Url) -> Self {
    Self {
      id,
      description: None,
      location: None,
      url,
    }
  }

  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn with_location(mut self, location: impl Into<String>) -> Self {
    self.location = Some(location.into());
    self
  }
}

/// A comment left on a feed image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageComment {
  pub id: Uuid,
  pub message: String,
  pub created_at: DateTime<Utc>,
  pub username: String,
}
