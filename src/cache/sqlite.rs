//! SQLite-backed feed store.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use super::storage::{CachedFeed, FeedStore, ImageDataStore, LocalFeedImage};
use crate::error::StoreError;

type Job = Box<dyn FnOnce(&mut Connection) + Send>;

/// SQLite-based store for the feed snapshot and image data.
///
/// The connection lives on a dedicated worker thread that runs operations
/// one at a time, in the order they were submitted.
#[derive(Clone)]
pub struct SqliteStore {
  jobs: mpsc::UnboundedSender<Job>,
}

impl SqliteStore {
  /// Open (or create) the store at `path`.
  pub fn open(path: &Path) -> Result<Self, StoreError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    info!(path = %path.display(), "Opened feed store");
    Self::with_connection(conn)
  }

  /// Open a private in-memory store.
  pub fn open_in_memory() -> Result<Self, StoreError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StoreError::Backend("Could not determine data directory".to_string()))?;

    Ok(data_dir.join("feedcache").join("feed-store.sqlite"))
  }

  fn with_connection(conn: Connection) -> Result<Self, StoreError> {
    conn.execute_batch(SCHEMA)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
    std::thread::Builder::new()
      .name("feed-store".to_string())
      .spawn(move || {
        let mut conn = conn;
        while let Some(job) = rx.blocking_recv() {
          job(&mut conn);
        }
        debug!("Feed store worker stopped");
      })?;

    Ok(Self { jobs: tx })
  }

  /// Run `op` on the worker thread and wait for its result.
  async fn perform<T, F>(&self, op: F) -> Result<T, StoreError>
  where
    T: Send + 'static,
    F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    self
      .jobs
      .send(Box::new(move |conn| {
        // Caller may have stopped waiting
        let _ = tx.send(op(conn));
      }))
      .map_err(|_| StoreError::Closed)?;

    rx.await.map_err(|_| StoreError::Closed)?
  }
}

/// Schema for cache tables.
const SCHEMA: &str = r#"
-- The one feed snapshot
CREATE TABLE IF NOT EXISTS feed_cache (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    timestamp TEXT NOT NULL
);

-- Snapshot items (preserves order)
CREATE TABLE IF NOT EXISTS feed_images (
    position INTEGER PRIMARY KEY,
    image_id TEXT NOT NULL,
    description TEXT,
    location TEXT,
    url TEXT NOT NULL
);

-- Image bytes, keyed by URL hash
CREATE TABLE IF NOT EXISTS image_data (
    url_hash TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

fn delete_snapshot(conn: &Connection) -> Result<(), StoreError> {
  conn.execute("DELETE FROM feed_images", [])?;
  conn.execute("DELETE FROM feed_cache", [])?;
  Ok(())
}

#[async_trait]
impl FeedStore for SqliteStore {
  async fn delete_cached_feed(&self) -> Result<(), StoreError> {
    self
      .perform(|conn| {
        let tx = conn.transaction()?;
        delete_snapshot(&tx)?;
        tx.commit()?;
        Ok(())
      })
      .await
  }

  async fn insert(
    &self,
    feed: &[LocalFeedImage],
    timestamp: DateTime<Utc>,
  ) -> Result<(), StoreError> {
    let feed = feed.to_vec();

    self
      .perform(move |conn| {
        let tx = conn.transaction()?;
        delete_snapshot(&tx)?;

        tx.execute(
          "INSERT INTO feed_cache (id, timestamp) VALUES (1, ?)",
          params![format_timestamp(timestamp)],
        )?;

        for (position, image) in feed.iter().enumerate() {
          tx.execute(
            "INSERT INTO feed_images (position, image_id, description, location, url)
             VALUES (?, ?, ?, ?, ?)",
            params![
              position as i64,
              image.id.to_string(),
              image.description,
              image.location,
              image.url.as_str()
            ],
          )?;
        }

        tx.commit()?;
        Ok(())
      })
      .await
  }

  async fn retrieve(&self) -> Result<Option<CachedFeed>, StoreError> {
    self
      .perform(|conn| {
        let timestamp: Option<String> = conn
          .query_row("SELECT timestamp FROM feed_cache WHERE id = 1", [], |row| {
            row.get(0)
          })
          .optional()?;

        let timestamp = match timestamp {
          Some(ts) => parse_timestamp(&ts)?,
          None => return Ok(None),
        };

        let mut stmt = conn.prepare(
          "SELECT image_id, description, location, url FROM feed_images ORDER BY position",
        )?;

        let rows = stmt
          .query_map([], |row| {
            Ok((
              row.get::<_, String>(0)?,
              row.get::<_, Option<String>>(1)?,
              row.get::<_, Option<String>>(2)?,
              row.get::<_, String>(3)?,
            ))
          })?
          .collect::<Result<Vec<_>, _>>()?;

        let feed = rows
          .into_iter()
          .map(|(id, description, location, url)| {
            Ok(LocalFeedImage {
              id: Uuid::parse_str(&id)
                .map_err(|e| StoreError::Corrupt(format!("image id '{}': {}", id, e)))?,
              description,
              location,
              url: Url::parse(&url)
                .map_err(|e| StoreError::Corrupt(format!("image url '{}': {}", url, e)))?,
            })
          })
          .collect::<Result<Vec<_>, StoreError>>()?;

        Ok(Some(CachedFeed { feed, timestamp }))
      })
      .await
  }
}

#[async_trait]
impl ImageDataStore for SqliteStore {
  async fn insert_data(&self, data: &[u8], url: &Url) -> Result<(), StoreError> {
    let data = data.to_vec();
    let url = url.clone();

    self
      .perform(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO image_data (url_hash, url, data, cached_at)
           VALUES (?, ?, ?, datetime('now'))",
          params![url_hash(&url), url.as_str(), data],
        )?;
        Ok(())
      })
      .await
  }

  async fn retrieve_data(&self, url: &Url) -> Result<Option<Vec<u8>>, StoreError> {
    let hash = url_hash(url);

    self
      .perform(move |conn| {
        let data = conn
          .query_row(
            "SELECT data FROM image_data WHERE url_hash = ?",
            params![hash],
            |row| row.get::<_, Vec<u8>>(0),
          )
          .optional()?;
        Ok(data)
      })
      .await
  }
}

/// SHA256 hash for stable, fixed-length keys
fn url_hash(url: &Url) -> String {
  let mut hasher = Sha256::new();
  hasher.update(url.as_str().as_bytes());
  hex::encode(hasher.finalize())
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
  timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| StoreError::Corrupt(format!("timestamp '{}': {}", s, e)))
}
