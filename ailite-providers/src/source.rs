//! Push-based delivery of response body chunks
//!
//! A [`ChunkSource`] owns one HTTP request/response lifecycle. Body bytes are
//! pushed into a [`ChunkHandler`] as they arrive, followed by exactly one
//! [`Completion`]. The returned [`Subscription`] is the only way to stop
//! delivery early.

use ailite_core::{Error, HttpRequest, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, trace, warn};

/// How a chunk delivery ended
#[derive(Debug)]
pub enum Completion {
    /// The response body ended normally
    Finished,
    /// The connection failed; no further chunks follow
    Failed(Error),
    /// The subscription was closed before the body ended
    Cancelled,
}

/// Receiver of pushed chunk deliveries
///
/// Callbacks may arrive on any thread. A single subscription never has two
/// callbacks in flight at once, but implementations should still guard their
/// own state.
pub trait ChunkHandler: Send + Sync {
    /// Called with each non-empty body chunk, in arrival order
    fn on_chunk(&self, chunk: Bytes);

    /// Called exactly once when the connection terminates
    fn on_complete(&self, completion: Completion);
}

/// Something that can issue a request and push its body into a handler
pub trait ChunkSource: Send + Sync {
    /// Issue `request` immediately and start delivering its body to `handler`
    ///
    /// Delivery runs on the current tokio runtime; without one the handler
    /// is completed with a failure straight away.
    fn open(&self, request: HttpRequest, handler: Arc<dyn ChunkHandler>) -> Subscription;
}

/// Handle to one in-flight chunk delivery
///
/// Cloning is cheap; all clones refer to the same connection.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
}

struct Inner {
    closed: AtomicBool,
    // Taken on completion, which both enforces the exactly-once contract and
    // drops the handler so it cannot keep the subscription alive.
    handler: Mutex<Option<Arc<dyn ChunkHandler>>>,
    task: Mutex<Option<AbortHandle>>,
}

impl Subscription {
    /// Create a subscription for a transport that drives delivery itself
    ///
    /// Most sources should use [`Subscription::spawn`] instead. A manually
    /// driven transport calls [`deliver`](Self::deliver) for each chunk and
    /// [`finish`](Self::finish) once at the end.
    pub fn new(handler: Arc<dyn ChunkHandler>) -> Self {
        Self {
            inner: Arc::new(Inner {
                closed: AtomicBool::new(false),
                handler: Mutex::new(Some(handler)),
                task: Mutex::new(None),
            }),
        }
    }

    /// Drive a byte stream on a new tokio task, pushing its items to `handler`
    ///
    /// `connect` resolves to the body stream, typically after sending the
    /// request and checking its status. An error from `connect` or from the
    /// stream ends delivery with [`Completion::Failed`]. Outside a tokio
    /// runtime nothing is spawned and delivery fails immediately with
    /// [`Error::Configuration`].
    pub fn spawn<F, S>(handler: Arc<dyn ChunkHandler>, connect: F) -> Self
    where
        F: Future<Output = Result<S>> + Send + 'static,
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        let subscription = Self::new(handler);
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(error) => {
                warn!(%error, "no tokio runtime to drive chunk delivery");
                subscription.finish(Completion::Failed(Error::Configuration(format!(
                    "chunk delivery requires a tokio runtime: {}",
                    error
                ))));
                return subscription;
            }
        };
        let worker = subscription.clone();
        let task = runtime.spawn(async move {
            let outcome = worker.pump(connect).await;
            worker.finish(outcome);
        });
        subscription.attach(task.abort_handle());
        subscription
    }

    async fn pump<F, S>(&self, connect: F) -> Completion
    where
        F: Future<Output = Result<S>>,
        S: Stream<Item = Result<Bytes>>,
    {
        let body = match connect.await {
            Ok(body) => body,
            Err(error) => return Completion::Failed(error),
        };
        let mut body = Box::pin(body);

        while let Some(item) = body.next().await {
            if self.is_closed() {
                return Completion::Cancelled;
            }
            match item {
                Ok(chunk) => {
                    trace!(bytes = chunk.len(), "chunk received");
                    self.deliver(chunk);
                }
                Err(error) => return Completion::Failed(error),
            }
        }

        Completion::Finished
    }

    fn attach(&self, task: AbortHandle) {
        let mut slot = self.inner.task.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_closed() {
            task.abort();
        } else {
            *slot = Some(task);
        }
    }

    /// Push one chunk to the handler
    ///
    /// Empty chunks and chunks arriving after close are dropped. Returns
    /// whether the chunk reached the handler.
    pub fn deliver(&self, chunk: Bytes) -> bool {
        if chunk.is_empty() || self.is_closed() {
            return false;
        }
        let handler = self
            .inner
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => {
                handler.on_chunk(chunk);
                true
            }
            None => false,
        }
    }

    /// Mark the connection as terminated and report `completion`
    ///
    /// Has no effect if a completion was already reported.
    pub fn finish(&self, completion: Completion) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.complete(completion);
    }

    /// Stop delivery and release the connection
    ///
    /// Safe to call any number of times, from any thread, including from
    /// inside a handler callback.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("closing chunk subscription");
        if let Some(task) = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        self.complete(Completion::Cancelled);
    }

    /// Whether the connection has terminated or been closed
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn complete(&self, completion: Completion) {
        let handler = self
            .inner
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handler) = handler {
            debug!(?completion, "chunk delivery completed");
            handler.on_complete(completion);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}
