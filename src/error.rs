//! Error types shared by the loaders, caches and stores.

/// Result alias used across the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error returned by every loader.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The durable store failed to read or write.
  #[error("feed store failure: {0}")]
  Store(#[from] StoreError),

  /// The store answered, but holds nothing for the key.
  #[error("no cached data for {0}")]
  NotFound(String),

  /// A remote source could not produce a value.
  #[error(transparent)]
  Source(#[from] SourceError),

  /// The load was cancelled before it delivered.
  #[error("load was cancelled")]
  Cancelled,
}

/// Failures of a remote source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
  /// Transport-level failure (DNS, TLS, refused connection, ...).
  #[error("connectivity error: {0}")]
  Connectivity(String),

  /// The response arrived but could not be interpreted.
  #[error("invalid payload: {0}")]
  InvalidPayload(String),
}

/// Failures of the durable store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("sqlite: {0}")]
  Sqlite(#[from] rusqlite::Error),

  /// A stored row could not be decoded back into a value.
  #[error("corrupt cache entry: {0}")]
  Corrupt(String),

  #[error("{0}")]
  Backend(String),

  #[error("i/o: {0}")]
  Io(#[from] std::io::Error),

  /// The store's worker is gone and can no longer accept operations.
  #[error("store worker has shut down")]
  Closed,
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  StoreFailure,
  NotFound,
  SourceFailure,
  InvalidPayload,
  Cancelled,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Store(_) => ErrorKind::StoreFailure,
      Error::NotFound(_) => ErrorKind::NotFound,
      Error::Source(SourceError::Connectivity(_)) => ErrorKind::SourceFailure,
      Error::Source(SourceError::InvalidPayload(_)) => ErrorKind::InvalidPayload,
      Error::Cancelled => ErrorKind::Cancelled,
    }
  }

  /// True for any failure of a remote source, including undecodable payloads.
  pub fn is_source_failure(&self) -> bool {
    matches!(self, Error::Source(_))
  }
}
