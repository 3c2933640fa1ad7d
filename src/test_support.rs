//! Shared test doubles and fixtures.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use url::Url;
use uuid::Uuid;

use crate::cache::{CachedFeed, Clock, FeedStore, ImageDataStore, LocalFeedImage};
use crate::error::{Error, Result, SourceError, StoreError};
use crate::feed::{FeedImage, HttpClient, HttpResponse};
use crate::loader::{Cache, Loader};

// ============================================================================
// Fixtures
// ============================================================================

pub fn any_url() -> Url {
  Url::parse("https://a-url.com/image").unwrap()
}

pub fn any_data() -> Vec<u8> {
  b"any data".to_vec()
}

pub fn unique_image() -> FeedImage {
  let id = Uuid::new_v4();
  FeedImage::new(id, Url::parse(&format!("https://any-url.com/{}", id)).unwrap())
    .with_description("any")
    .with_location("any")
}

pub fn unique_feed() -> Vec<FeedImage> {
  vec![unique_image(), unique_image()]
}

pub fn fixed_clock(now: DateTime<Utc>) -> Clock {
  Arc::new(move || now)
}

fn store_error() -> StoreError {
  StoreError::Backend("stubbed failure".to_string())
}

// ============================================================================
// Store spies
// ============================================================================

/// Messages received by the store spies, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreMessage {
  DeleteCachedFeed,
  Insert(Vec<LocalFeedImage>, DateTime<Utc>),
  Retrieve,
  InsertData(Vec<u8>, Url),
  RetrieveData(Url),
}

#[derive(Default)]
struct SpyState {
  messages: Vec<StoreMessage>,
  fail_deletion: bool,
  fail_insertion: bool,
  fail_retrieval: bool,
}

/// Feed store that records messages and replays stubbed outcomes.
#[derive(Default)]
pub struct FeedStoreSpy {
  state: Mutex<SpyState>,
  retrieval: Mutex<Option<CachedFeed>>,
}

impl FeedStoreSpy {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn messages(&self) -> Vec<StoreMessage> {
    self.state.lock().unwrap().messages.clone()
  }

  pub fn fail_deletion(&self) {
    self.state.lock().unwrap().fail_deletion = true;
  }

  pub fn fail_insertion(&self) {
    self.state.lock().unwrap().fail_insertion = true;
  }

  pub fn fail_retrieval(&self) {
    self.state.lock().unwrap().fail_retrieval = true;
  }

  pub fn complete_retrieval(&self, cache: CachedFeed) {
    *self.retrieval.lock().unwrap() = Some(cache);
  }

  fn record(&self, message: StoreMessage) -> std::sync::MutexGuard<'_, SpyState> {
    let mut state = self.state.lock().unwrap();
    state.messages.push(message);
    state
  }
}

#[async_trait]
impl FeedStore for FeedStoreSpy {
  async fn delete_cached_feed(&self) -> Result<(), StoreError> {
    if self.record(StoreMessage::DeleteCachedFeed).fail_deletion {
      return Err(store_error());
    }
    Ok(())
  }

  async fn insert(
    &self,
    feed: &[LocalFeedImage],
    timestamp: DateTime<Utc>,
  ) -> Result<(), StoreError> {
    if self.record(StoreMessage::Insert(feed.to_vec(), timestamp)).fail_insertion {
      return Err(store_error());
    }
    Ok(())
  }

  async fn retrieve(&self) -> Result<Option<CachedFeed>, StoreError> {
    if self.record(StoreMessage::Retrieve).fail_retrieval {
      return Err(store_error());
    }
    Ok(self.retrieval.lock().unwrap().clone())
  }
}

/// Image store that records messages and replays stubbed outcomes.
#[derive(Default)]
pub struct ImageStoreSpy {
  state: Mutex<SpyState>,
  retrieval: Mutex<Option<Vec<u8>>>,
}

impl ImageStoreSpy {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn messages(&self) -> Vec<StoreMessage> {
    self.state.lock().unwrap().messages.clone()
  }

  pub fn fail_insertion(&self) {
    self.state.lock().unwrap().fail_insertion = true;
  }

  pub fn fail_retrieval(&self) {
    self.state.lock().unwrap().fail_retrieval = true;
  }

  pub fn complete_retrieval(&self, data: Vec<u8>) {
    *self.retrieval.lock().unwrap() = Some(data);
  }
}

#[async_trait]
impl ImageDataStore for ImageStoreSpy {
  async fn insert_data(&self, data: &[u8], url: &Url) -> Result<(), StoreError> {
    let mut state = self.state.lock().unwrap();
    state
      .messages
      .push(StoreMessage::InsertData(data.to_vec(), url.clone()));
    if state.fail_insertion {
      return Err(store_error());
    }
    Ok(())
  }

  async fn retrieve_data(&self, url: &Url) -> Result<Option<Vec<u8>>, StoreError> {
    let fail = {
      let mut state = self.state.lock().unwrap();
      state.messages.push(StoreMessage::RetrieveData(url.clone()));
      state.fail_retrieval
    };
    if fail {
      return Err(store_error());
    }
    Ok(self.retrieval.lock().unwrap().clone())
  }
}

// ============================================================================
// Loader and cache doubles
// ============================================================================

/// Loader that answers every call immediately and counts calls.
pub struct LoaderStub<V> {
  result: Box<dyn Fn() -> Result<V> + Send + Sync>,
  calls: AtomicUsize,
}

impl<V: Clone + Send + Sync + 'static> LoaderStub<V> {
  pub fn succeeding(value: V) -> Self {
    Self {
      result: Box::new(move || Ok(value.clone())),
      calls: AtomicUsize::new(0),
    }
  }
}

impl<V: 'static> LoaderStub<V> {
  pub fn failing(error: impl Fn() -> Error + Send + Sync + 'static) -> Self {
    Self {
      result: Box::new(move || Err(error())),
      calls: AtomicUsize::new(0),
    }
  }

  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl<K, V> Loader<K, V> for LoaderStub<V>
where
  K: Send + Sync,
  V: Send,
{
  async fn load(&self, _key: &K) -> Result<V> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    (self.result)()
  }
}

/// Loader whose calls stay pending until the test completes them.
pub struct ControlledLoader<V> {
  pending: Mutex<Vec<Option<oneshot::Sender<Result<V>>>>>,
}

impl<V> ControlledLoader<V> {
  pub fn new() -> Self {
    Self {
      pending: Mutex::new(Vec::new()),
    }
  }

  pub fn request_count(&self) -> usize {
    self.pending.lock().unwrap().len()
  }

  /// Complete request `index`. Ignored if its caller has gone away.
  pub fn complete(&self, index: usize, result: Result<V>) {
    if let Some(tx) = self.pending.lock().unwrap()[index].take() {
      let _ = tx.send(result);
    }
  }

  pub async fn wait_for_requests(&self, count: usize) {
    for _ in 0..100 {
      if self.request_count() >= count {
        return;
      }
      tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("expected {} requests, got {}", count, self.request_count());
  }
}

#[async_trait]
impl<K, V> Loader<K, V> for ControlledLoader<V>
where
  K: Send + Sync,
  V: Send,
{
  async fn load(&self, _key: &K) -> Result<V> {
    let (tx, rx) = oneshot::channel();
    self.pending.lock().unwrap().push(Some(tx));
    rx.await.unwrap_or(Err(Error::Cancelled))
  }
}

/// Cache that records saves.
pub struct CacheSpy<K, V> {
  saved: Mutex<Vec<(V, K)>>,
  fail: bool,
}

impl<K, V> CacheSpy<K, V> {
  pub fn succeeding() -> Self {
    Self {
      saved: Mutex::new(Vec::new()),
      fail: false,
    }
  }

  pub fn failing() -> Self {
    Self {
      saved: Mutex::new(Vec::new()),
      fail: true,
    }
  }
}

impl<K: Clone, V: Clone> CacheSpy<K, V> {
  pub fn saved(&self) -> Vec<(V, K)> {
    self.saved.lock().unwrap().clone()
  }
}

#[async_trait]
impl<K, V> Cache<K, V> for CacheSpy<K, V>
where
  K: Clone + Send + Sync,
  V: Clone + Send + Sync,
{
  async fn save(&self, value: &V, key: &K) -> Result<()> {
    self.saved.lock().unwrap().push((value.clone(), key.clone()));
    if self.fail {
      return Err(store_error().into());
    }
    Ok(())
  }
}

// ============================================================================
// HTTP
// ============================================================================

type Responder = Box<dyn Fn(&Url) -> HttpResponse + Send + Sync>;

/// HTTP client that records requested URLs and answers from a closure.
pub struct HttpClientStub {
  responder: Option<Responder>,
  requests: Mutex<Vec<Url>>,
}

impl HttpClientStub {
  pub fn responding(responder: impl Fn(&Url) -> HttpResponse + Send + Sync + 'static) -> Self {
    Self {
      responder: Some(Box::new(responder)),
      requests: Mutex::new(Vec::new()),
    }
  }

  /// Every request fails with a connectivity error.
  pub fn offline() -> Self {
    Self {
      responder: None,
      requests: Mutex::new(Vec::new()),
    }
  }

  pub fn requested_urls(&self) -> Vec<Url> {
    self.requests.lock().unwrap().clone()
  }
}

#[async_trait]
impl HttpClient for HttpClientStub {
  async fn get(&self, url: &Url) -> std::result::Result<HttpResponse, SourceError> {
    self.requests.lock().unwrap().push(url.clone());
    match &self.responder {
      Some(responder) => Ok(responder(url)),
      None => Err(SourceError::Connectivity("offline".to_string())),
    }
  }
}

// ============================================================================
// Store conformance
// ============================================================================

fn local_feed() -> Vec<LocalFeedImage> {
  unique_feed().iter().map(LocalFeedImage::from).collect()
}

fn conformance_timestamp() -> DateTime<Utc> {
  DateTime::parse_from_rfc3339("2024-05-17T08:00:00.123456789Z")
    .unwrap()
    .with_timezone(&Utc)
}

/// Run the full store conformance suite.
///
/// Call this from a store's test module with a fresh, empty store.
pub async fn run_store_conformance_tests<S>(store: &S) -> Result<(), StoreError>
where
  S: FeedStore + ImageDataStore,
{
  test_retrieve_empty(store).await?;
  test_delete_empty(store).await?;
  test_insert_and_retrieve(store).await?;
  test_insert_overrides(store).await?;
  test_delete_after_insert(store).await?;
  test_serial_side_effects(store).await?;
  test_image_data_missing(store).await?;
  test_image_data_overwrite(store).await?;
  test_image_data_keyed_by_url(store).await?;
  test_image_data_survives_feed_deletion(store).await?;
  Ok(())
}

async fn test_retrieve_empty<S: FeedStore>(store: &S) -> Result<(), StoreError> {
  assert_eq!(store.retrieve().await?, None, "empty store should hold no feed");
  assert_eq!(store.retrieve().await?, None, "retrieve should have no side effects");
  Ok(())
}

async fn test_delete_empty<S: FeedStore>(store: &S) -> Result<(), StoreError> {
  store.delete_cached_feed().await?;
  assert_eq!(store.retrieve().await?, None);
  Ok(())
}

async fn test_insert_and_retrieve<S: FeedStore>(store: &S) -> Result<(), StoreError> {
  let feed = local_feed();
  store.insert(&feed, conformance_timestamp()).await?;

  assert_eq!(
    store.retrieve().await?,
    Some(CachedFeed {
      feed,
      timestamp: conformance_timestamp(),
    }),
    "retrieve should deliver the inserted feed and timestamp"
  );
  Ok(())
}

async fn test_insert_overrides<S: FeedStore>(store: &S) -> Result<(), StoreError> {
  store.insert(&local_feed(), conformance_timestamp()).await?;

  let latest = local_feed();
  let latest_timestamp = conformance_timestamp() + chrono::Duration::hours(1);
  store.insert(&latest, latest_timestamp).await?;

  let cached = store.retrieve().await?;
  assert_eq!(cached.as_ref().map(|c| &c.feed), Some(&latest), "insert should replace the feed");
  assert_eq!(cached.map(|c| c.timestamp), Some(latest_timestamp));
  Ok(())
}

async fn test_delete_after_insert<S: FeedStore>(store: &S) -> Result<(), StoreError> {
  store.insert(&local_feed(), conformance_timestamp()).await?;
  store.delete_cached_feed().await?;

  assert_eq!(store.retrieve().await?, None, "delete should empty the store");
  Ok(())
}

async fn test_serial_side_effects<S: FeedStore>(store: &S) -> Result<(), StoreError> {
  let completed = Mutex::new(Vec::new());
  let record = |label: &'static str, result: Result<(), StoreError>| {
    completed.lock().unwrap().push((label, result.is_ok()));
  };

  let feed = local_feed();
  futures::join!(
    async { record("insert 1", store.insert(&feed, conformance_timestamp()).await) },
    async { record("delete", store.delete_cached_feed().await) },
    async { record("insert 2", store.insert(&feed, conformance_timestamp()).await) }
  );

  assert_eq!(
    *completed.lock().unwrap(),
    vec![("insert 1", true), ("delete", true), ("insert 2", true)],
    "side effects should complete in submission order"
  );
  assert!(store.retrieve().await?.is_some(), "last insert should win");

  store.delete_cached_feed().await
}

async fn test_image_data_missing<S: ImageDataStore>(store: &S) -> Result<(), StoreError> {
  assert_eq!(store.retrieve_data(&any_url()).await?, None);
  Ok(())
}

async fn test_image_data_overwrite<S: ImageDataStore>(store: &S) -> Result<(), StoreError> {
  let url = any_url();
  store.insert_data(b"first", &url).await?;
  store.insert_data(b"last", &url).await?;

  assert_eq!(
    store.retrieve_data(&url).await?,
    Some(b"last".to_vec()),
    "insert_data should overwrite previous data"
  );
  Ok(())
}

async fn test_image_data_keyed_by_url<S: ImageDataStore>(store: &S) -> Result<(), StoreError> {
  let url = Url::parse("https://a-url.com/keyed").unwrap();
  let other = Url::parse("https://another-url.com/keyed").unwrap();
  store.insert_data(b"data", &url).await?;

  assert_eq!(store.retrieve_data(&url).await?, Some(b"data".to_vec()));
  assert_eq!(store.retrieve_data(&other).await?, None, "other urls should miss");
  Ok(())
}

async fn test_image_data_survives_feed_deletion<S>(store: &S) -> Result<(), StoreError>
where
  S: FeedStore + ImageDataStore,
{
  let url = Url::parse("https://a-url.com/kept").unwrap();
  store.insert_data(b"kept", &url).await?;
  store.insert(&local_feed(), conformance_timestamp()).await?;

  store.delete_cached_feed().await?;

  assert_eq!(
    store.retrieve_data(&url).await?,
    Some(b"kept".to_vec()),
    "deleting the feed should keep image data"
  );
  Ok(())
}
