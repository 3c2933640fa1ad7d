//! Composition of remote and local sources into the loaders a client uses.
//!
//! Feed: remote first page (written through to the local cache), falling back
//! to the local cache. Each page can load the next one from the remote,
//! accumulating items and caching the accumulated feed.
//!
//! Images: local cache first, falling back to the remote (written through to
//! the local cache).
//!
//! Comments: remote only.

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use crate::cache::{Clock, FeedStore, ImageDataStore, LocalFeedLoader, LocalImageDataLoader};
use crate::error::Result;
use crate::feed::{
  FeedImage, HttpClient, ImageComment, RemoteFeedLoader, RemoteImageCommentsLoader,
  RemoteImageDataLoader,
};
use crate::loader::{CacheDecorator, FallbackComposite, LoadTask, Loader};
use crate::paginated::{LoadMore, LoadMoreFuture, Paginated};

type FeedCache = Arc<LocalFeedLoader<dyn FeedStore>>;

/// Entry point for loading the feed, its images and their comments.
#[derive(Clone)]
pub struct FeedService {
  remote: Arc<RemoteFeedLoader>,
  cache: FeedCache,
  feed: Arc<dyn Loader<(), Vec<FeedImage>>>,
  images: Arc<dyn Loader<Url, Vec<u8>>>,
  comments: Arc<RemoteImageCommentsLoader>,
}

impl FeedService {
  pub fn new(
    remote: RemoteFeedLoader,
    images: RemoteImageDataLoader,
    comments: RemoteImageCommentsLoader,
    feed_store: Arc<dyn FeedStore>,
    image_store: Arc<dyn ImageDataStore>,
    clock: Clock,
  ) -> Self {
    let remote = Arc::new(remote);
    let cache: FeedCache = Arc::new(LocalFeedLoader::new(feed_store, clock));
    let feed = FallbackComposite::new(
      CacheDecorator::new(remote.clone(), cache.clone()),
      cache.clone(),
    );

    let local_images = Arc::new(LocalImageDataLoader::new(image_store));
    let images = FallbackComposite::new(
      local_images.clone(),
      CacheDecorator::new(images, local_images),
    );

    Self {
      remote,
      cache,
      feed: Arc::new(feed),
      images: Arc::new(images),
      comments: Arc::new(comments),
    }
  }

  /// Wire everything to one HTTP client and one store.
  pub fn with_store<S>(
    client: Arc<dyn HttpClient>,
    feed_url: Url,
    page_size: usize,
    store: Arc<S>,
  ) -> Self
  where
    S: FeedStore + ImageDataStore + 'static,
  {
    Self::new(
      RemoteFeedLoader::new(client.clone(), feed_url.clone()).with_page_size(page_size),
      RemoteImageDataLoader::new(client.clone()),
      RemoteImageCommentsLoader::new(client, feed_url),
      store.clone(),
      store,
      Arc::new(chrono::Utc::now),
    )
  }

  /// Load the first feed page.
  pub fn load_feed(&self) -> LoadTask<Paginated<FeedImage>> {
    let feed = self.feed.clone();
    let remote = self.remote.clone();
    let cache = self.cache.clone();

    LoadTask::spawn(async move {
      let items = feed.load(&()).await?;
      let last = items.last().cloned();
      Ok(make_page(items, last, remote, cache))
    })
  }

  /// Load the page after `page`, or `None` if `page` is the last one.
  pub fn load_more(page: &Paginated<FeedImage>) -> Option<LoadTask<Paginated<FeedImage>>> {
    page.load_more().map(LoadTask::spawn)
  }

  /// Load the bytes of one image.
  pub fn load_image_data(&self, url: Url) -> LoadTask<Vec<u8>> {
    let images = self.images.clone();
    LoadTask::spawn(async move { images.load(&url).await })
  }

  /// Load the comments of one image. Comments are never cached.
  pub fn load_comments(&self, image_id: Uuid) -> LoadTask<Vec<ImageComment>> {
    let comments = self.comments.clone();
    LoadTask::spawn(async move { comments.load(&image_id).await })
  }

  /// Drop the cached feed if it is expired or unreadable.
  pub async fn validate_cache(&self) {
    self.cache.validate_cache().await;
  }
}

fn make_page(
  items: Vec<FeedImage>,
  last: Option<FeedImage>,
  remote: Arc<RemoteFeedLoader>,
  cache: FeedCache,
) -> Paginated<FeedImage> {
  let load_more = last.map(|last| {
    let loaded = items.clone();
    let load_more: LoadMore<FeedImage> = Arc::new(move || -> LoadMoreFuture<FeedImage> {
      let next = CacheDecorator::new(
        NextPageLoader {
          remote: remote.clone(),
          loaded: loaded.clone(),
          after: last.clone(),
        },
        cache.clone(),
      );
      let previous = loaded.len();
      let remote = remote.clone();
      let cache = cache.clone();

      Box::pin(async move {
        let items = next.load(&()).await?;
        let last = items.get(previous..).and_then(|new| new.last()).cloned();
        Ok(make_page(items, last, remote, cache))
      })
    });
    load_more
  });

  Paginated::new(items, load_more)
}

/// Fetches the page after `after` and appends it to the items loaded so far.
struct NextPageLoader {
  remote: Arc<RemoteFeedLoader>,
  loaded: Vec<FeedImage>,
  after: FeedImage,
}

#[async_trait]
impl Loader<(), Vec<FeedImage>> for NextPageLoader {
  async fn load(&self, _key: &()) -> Result<Vec<FeedImage>> {
    let page = self.remote.load_page(Some(&self.after)).await?;
    Ok(self.loaded.iter().cloned().chain(page).collect())
  }
}
