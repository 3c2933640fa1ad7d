//! Composable loading capabilities.
//!
//! Every source of data (remote endpoint, local cache, or a wrapper around
//! either) implements [`Loader`]. Wrappers compose by holding other loaders:
//! - [`CacheDecorator`] writes successful loads through to a [`Cache`]
//! - [`FallbackComposite`] tries a secondary loader when the primary fails
//!
//! Cancellation is handled one level up by [`LoadTask`], which aborts the
//! whole future chain, so wrappers never need to track inner task handles.

mod decorator;
mod fallback;
mod task;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

pub use decorator::CacheDecorator;
pub use fallback::FallbackComposite;
pub use task::{LoadTask, TaskHandle};

/// Something that can produce a `V` for a key `K`.
#[async_trait]
pub trait Loader<K, V>: Send + Sync
where
  K: Send + Sync,
  V: Send,
{
  async fn load(&self, key: &K) -> Result<V>;
}

/// A sink that can persist a `V` under a key `K`.
#[async_trait]
pub trait Cache<K, V>: Send + Sync
where
  K: Send + Sync,
  V: Send + Sync,
{
  async fn save(&self, value: &V, key: &K) -> Result<()>;
}

#[async_trait]
impl<K, V, L> Loader<K, V> for Arc<L>
where
  K: Send + Sync,
  V: Send,
  L: Loader<K, V> + ?Sized,
{
  async fn load(&self, key: &K) -> Result<V> {
    (**self).load(key).await
  }
}

#[async_trait]
impl<K, V, C> Cache<K, V> for Arc<C>
where
  K: Send + Sync,
  V: Send + Sync,
  C: Cache<K, V> + ?Sized,
{
  async fn save(&self, value: &V, key: &K) -> Result<()> {
    (**self).save(value, key).await
  }
}
