//! Local caching of the feed snapshot and image data.
//!
//! This module provides:
//! - A freshness policy for the cached feed (7 calendar days)
//! - Store capabilities plus SQLite, in-memory and null implementations
//! - Local loaders that orchestrate saving, loading and validating

mod local_feed;
mod local_image;
mod memory;
pub mod policy;
mod sqlite;
mod storage;

pub use local_feed::{Clock, LocalFeedLoader};
pub use local_image::LocalImageDataLoader;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use storage::{CachedFeed, FeedStore, ImageDataStore, LocalFeedImage, NullStore};
