//! Local cache for image bytes.

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use super::storage::ImageDataStore;
use crate::error::{Error, Result};
use crate::loader::{Cache, Loader};

/// Loads and saves image data through an [`ImageDataStore`].
///
/// Image data never expires; it is only replaced by saving again.
pub struct LocalImageDataLoader<S: ImageDataStore + ?Sized> {
  store: Arc<S>,
}

impl<S: ImageDataStore + ?Sized> LocalImageDataLoader<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store }
  }

  /// Load the data cached for `url`.
  ///
  /// Returns [`Error::NotFound`] when nothing is cached and [`Error::Store`]
  /// when the store itself fails.
  pub async fn load_image_data(&self, url: &Url) -> Result<Vec<u8>> {
    self
      .store
      .retrieve_data(url)
      .await?
      .ok_or_else(|| Error::NotFound(url.to_string()))
  }

  pub async fn save(&self, data: &[u8], url: &Url) -> Result<()> {
    self.store.insert_data(data, url).await?;
    Ok(())
  }
}

impl<S: ImageDataStore + ?Sized> Clone for LocalImageDataLoader<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

#[async_trait]
impl<S: ImageDataStore + ?Sized> Loader<Url, Vec<u8>> for LocalImageDataLoader<S> {
  async fn load(&self, url: &Url) -> Result<Vec<u8>> {
    self.load_image_data(url).await
  }
}

#[async_trait]
impl<S: ImageDataStore + ?Sized> Cache<Url, Vec<u8>> for LocalImageDataLoader<S> {
  async fn save(&self, data: &Vec<u8>, url: &Url) -> Result<()> {
    LocalImageDataLoader::save(self, data, url).await
  }
}
