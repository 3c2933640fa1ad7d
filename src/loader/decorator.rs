//! Write-through caching around any loader.

use async_trait::async_trait;
use tracing::warn;

use super::{Cache, Loader};
use crate::error::Result;

/// Loader that saves every successful result of its decoratee into a cache.
///
/// Cache writes are advisory: a failed save is logged and otherwise ignored,
/// so it never turns a successful load into a failure.
pub struct CacheDecorator<L, C> {
  decoratee: L,
  cache: C,
}

impl<L, C> CacheDecorator<L, C> {
  pub fn new(decoratee: L, cache: C) -> Self {
    Self { decoratee, cache }
  }
}

#[async_trait]
impl<K, V, L, C> Loader<K, V> for CacheDecorator<L, C>
where
  K: Send + Sync,
  V: Send + Sync,
  L: Loader<K, V>,
  C: Cache<K, V>,
{
  async fn load(&self, key: &K) -> Result<V> {
    let value = self.decoratee.load(key).await?;

    if let Err(error) = self.cache.save(&value, key).await {
      warn!(%error, "Ignoring failed cache write");
    }

    Ok(value)
  }
}
