//! Paged results with an optional continuation.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::Result;

/// Future resolving to the next page.
pub type LoadMoreFuture<T> = BoxFuture<'static, Result<Paginated<T>>>;

/// Continuation that fetches the next page.
pub type LoadMore<T> = Arc<dyn Fn() -> LoadMoreFuture<T> + Send + Sync>;

/// A page of items plus, unless this is the last page, a way to load more.
pub struct Paginated<T> {
  pub items: Vec<T>,
  load_more: Option<LoadMore<T>>,
}

impl<T> Paginated<T> {
  pub fn new(items: Vec<T>, load_more: Option<LoadMore<T>>) -> Self {
    Self { items, load_more }
  }

  /// A terminal page.
  pub fn last_page(items: Vec<T>) -> Self {
    Self::new(items, None)
  }

  pub fn is_last_page(&self) -> bool {
    self.load_more.is_none()
  }

  /// Start loading the next page, or `None` on the last page.
  pub fn load_more(&self) -> Option<LoadMoreFuture<T>> {
    self.load_more.as_ref().map(|load_more| load_more())
  }
}

impl<T: Clone> Clone for Paginated<T> {
  fn clone(&self) -> Self {
    Self {
      items: self.items.clone(),
      load_more: self.load_more.clone(),
    }
  }
}

impl<T: fmt::Debug> fmt::Debug for Paginated<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Paginated")
      .field("items", &self.items)
      .field("has_more", &!self.is_last_page())
      .finish()
  }
}

/// Keeps one controller per item identity across page loads.
///
/// A UI keeps its cell controllers here; the CLI keeps print positions so an
/// accumulated page only shows the images it has not shown yet.
///
/// Merging a page is a union keyed by identity: controllers already built for
/// a key are reused, new keys get a fresh controller, and nothing is dropped
/// until [`PageMerger::reset`].
pub struct PageMerger<K, C> {
  controllers: HashMap<K, C>,
}

impl<K: Eq + Hash, C: Clone> PageMerger<K, C> {
  pub fn new() -> Self {
    Self {
      controllers: HashMap::new(),
    }
  }

  /// Controllers for `items`, in item order.
  pub fn merge<T, KF, MF>(&mut self, items: &[T], key: KF, mut make: MF) -> Vec<C>
  where
    KF: Fn(&T) -> K,
    MF: FnMut(&T) -> C,
  {
    items
      .iter()
      .map(|item| {
        self
          .controllers
          .entry(key(item))
          .or_insert_with(|| make(item))
          .clone()
      })
      .collect()
  }

  /// Forget every controller, e.g. before a full reload.
  pub fn reset(&mut self) {
    self.controllers.clear();
  }

  pub fn get(&self, key: &K) -> Option<&C> {
    self.controllers.get(key)
  }

  pub fn len(&self) -> usize {
    self.controllers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.controllers.is_empty()
  }
}

impl<K: Eq + Hash, C: Clone> Default for PageMerger<K, C> {
  fn default() -> Self {
    Self::new()
  }
}
