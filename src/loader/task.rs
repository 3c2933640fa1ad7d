//! Cancellable handles for in-flight loads.

use futures::future::{AbortHandle, Abortable};
use std::future::Future;
use tokio::sync::oneshot;

use crate::error::{Error, Result};

/// Handle that cancels a spawned load.
///
/// Once `cancel` has been called the load's completion is never delivered,
/// even if the underlying work had already finished.
#[derive(Debug, Clone)]
pub struct TaskHandle {
  abort: AbortHandle,
}

impl TaskHandle {
  pub fn cancel(&self) {
    self.abort.abort();
  }

  pub fn is_cancelled(&self) -> bool {
    self.abort.is_aborted()
  }
}

/// A load running on the tokio runtime.
///
/// Cancelling drops the whole future chain, so whichever inner loader is
/// currently active (primary, fallback, or a cache write) is cancelled too.
#[derive(Debug)]
pub struct LoadTask<V> {
  handle: TaskHandle,
  receiver: oneshot::Receiver<Result<V>>,
}

impl<V: Send + 'static> LoadTask<V> {
  /// Spawn `future` and keep its result for [`LoadTask::result`].
  pub fn spawn<F>(future: F) -> Self
  where
    F: Future<Output = Result<V>> + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    let handle = Self::spawn_with(future, move |result| {
      // Receiver may have been dropped
      let _ = tx.send(result);
    });

    Self {
      handle,
      receiver: rx,
    }
  }

  /// Spawn `future` and hand its result to `completion`, unless cancelled first.
  pub fn spawn_with<F, C>(future: F, completion: C) -> TaskHandle
  where
    F: Future<Output = Result<V>> + Send + 'static,
    C: FnOnce(Result<V>) + Send + 'static,
  {
    let (abort, registration) = AbortHandle::new_pair();
    let guard = abort.clone();

    tokio::spawn(async move {
      if let Ok(result) = Abortable::new(future, registration).await {
        if !guard.is_aborted() {
          completion(result);
        }
      }
    });

    TaskHandle { abort }
  }

  pub fn handle(&self) -> TaskHandle {
    self.handle.clone()
  }

  pub fn cancel(&self) {
    self.handle.cancel();
  }

  /// Wait for the load. Resolves to [`Error::Cancelled`] if it was cancelled.
  pub async fn result(self) -> Result<V> {
    match self.receiver.await {
      Ok(result) if !self.handle.is_cancelled() => result,
      _ => Err(Error::Cancelled),
    }
  }
}
