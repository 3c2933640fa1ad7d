//! Offline-first loading of an image feed.
//!
//! Remote sources are composed with a local cache through small, generic
//! wrappers:
//! - [`loader::CacheDecorator`] writes successful loads through to a cache
//! - [`loader::FallbackComposite`] falls back to a secondary source
//! - [`cache::LocalFeedLoader`] keeps one feed snapshot, fresh for 7 days
//! - [`cache::LocalImageDataLoader`] keeps image bytes keyed by URL
//!
//! [`service::FeedService`] wires them together the way a client app does.

pub mod cache;
pub mod error;
pub mod feed;
pub mod loader;
pub mod paginated;
pub mod service;

#[cfg(test)]
mod test_support;

pub use error::{Error, ErrorKind, Result};
pub use feed::FeedImage;
pub use paginated::{PageMerger, Paginated};
pub use service::FeedService;
