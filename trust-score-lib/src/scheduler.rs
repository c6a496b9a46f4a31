//! Bounded scheduling of analysis work.
//!
//! CPU-bound work goes through [`WorkerPool::submit`], which runs it on tokio's blocking
//! threads while holding one of a fixed number of slots. Native async I/O goes through
//! [`WorkerPool::await_io`]. Both report how long the work took, so callers can treat the
//! two kinds of work the same way.

use crate::Result;
use core::time::Duration;
use ohno::IntoAppError;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

/// A value together with the wall-clock time it took to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

impl<T> Timed<T> {
    /// Elapsed time in whole milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Timed<U> {
        Timed {
            value: f(self.value),
            elapsed: self.elapsed,
        }
    }
}

/// A shared pool that limits how much blocking work runs at once.
///
/// The pool holds no data of its own; clones share the same slots.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    slots: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Create a pool with `size` slots, or one slot per available CPU when `size` is 0.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = if size == 0 {
            std::thread::available_parallelism().map_or(4, core::num::NonZero::get)
        } else {
            size
        };

        Self {
            slots: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Number of slots not currently in use.
    #[must_use]
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Run blocking work on a pool slot.
    ///
    /// The elapsed time includes any wait for a free slot. The slot is released when the
    /// work finishes, even if the caller stopped waiting for it.
    pub async fn submit<F, T>(&self, work: F) -> Result<Timed<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let start = Instant::now();
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .into_app_err("worker pool has been closed")?;

        let value = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        })
        .await
        .into_app_err("worker task panicked")?;

        Ok(Timed {
            value,
            elapsed: start.elapsed(),
        })
    }

    /// Await native async I/O, measuring how long it took.
    pub async fn await_io<F: Future>(&self, io: F) -> Timed<F::Output> {
        let start = Instant::now();
        let value = io.await;
        Timed {
            value,
            elapsed: start.elapsed(),
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(0)
    }
}
