//! Primary/secondary failover between two loaders.

use async_trait::async_trait;
use tracing::debug;

use super::Loader;
use crate::error::Result;

/// Loader that asks `primary` first and, only if it fails, `fallback`.
///
/// The fallback's result is returned verbatim. To chain more than two
/// sources, nest composites.
pub struct FallbackComposite<P, F> {
  primary: P,
  fallback: F,
}

impl<P, F> FallbackComposite<P, F> {
  pub fn new(primary: P, fallback: F) -> Self {
    Self { primary, fallback }
  }
}

#[async_trait]
impl<K, V, P, F> Loader<K, V> for FallbackComposite<P, F>
where
  K: Send + Sync,
  V: Send,
  P: Loader<K, V>,
  F: Loader<K, V>,
{
  async fn load(&self, key: &K) -> Result<V> {
    match self.primary.load(key).await {
      Ok(value) => Ok(value),
      Err(error) => {
        debug!(%error, "Primary source failed, trying fallback");
        self.fallback.load(key).await
      }
    }
  }
}
