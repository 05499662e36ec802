use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{debug, trace, warn};

use crate::config::{check_target_size, PoolConfig};
use crate::error::{PoolError, Result};
use crate::maker::Maker;
use crate::stats::{Counters, PoolStats};

#[derive(Debug)]
struct State<T> {
    ready: VecDeque<T>,
    // Slots reserved by a replenisher that is currently building outside the lock
    building: usize,
}

struct Inner<T> {
    maker: Maker<T>,
    state: Mutex<State<T>>,
    available: Condvar,
    target_size: AtomicUsize,
    counters: Counters,
}

impl<T> Inner<T> {
    // Nothing panics while the buffer is half updated, so a poisoned lock still guards a valid buffer.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fill(&self) -> Result<usize> {
        let mut built = 0;

        loop {
            let slot = match self.reserve() {
                Some(slot) => slot,
                None => break,
            };

            match self.maker.make() {
                Ok(obj) => {
                    self.counters.created();
                    slot.fill(obj);
                    self.available.notify_one();
                    built += 1;
                }
                Err(err) => {
                    drop(slot);
                    self.counters.failed_replenishment();
                    warn!(
                        ready = self.lock().ready.len(),
                        target_size = self.target_size.load(Ordering::Relaxed),
                        error = %err,
                        "replenish stopped"
                    );
                    return Err(err);
                }
            }
        }

        if built > 0 {
            debug!(built, "replenished");
        }

        Ok(built)
    }

    fn reserve(&self) -> Option<Slot<'_, T>> {
        let mut state = self.lock();
        if state.ready.len() + state.building >= self.target_size.load(Ordering::Acquire) {
            return None;
        }
        state.building += 1;

        Some(Slot {
            inner: self,
            held: true,
        })
    }
}

/// A reserved place in the buffer. Dropping it without filling it, including while unwinding out of a
/// panicking factory, hands the place back.
struct Slot<'a, T> {
    inner: &'a Inner<T>,
    held: bool,
}

impl<'a, T> Slot<'a, T> {
    fn fill(mut self, obj: T) {
        let inner = self.inner;
        let mut state = inner.lock();
        state.building -= 1;
        state.ready.push_back(obj);
        self.held = false;
    }
}

impl<'a, T> Drop for Slot<'a, T> {
    fn drop(&mut self) {
        if self.held {
            self.inner.lock().building -= 1;
        }
    }
}

fn replenisher<T>(inner: Arc<Inner<T>>, requests: Receiver<()>) {
    // Exits once the pool drops its Sender.
    for () in requests.iter() {
        // Errors are logged and counted in fill. The next request retries.
        if panic::catch_unwind(AssertUnwindSafe(|| inner.fill())).is_err() {
            inner.counters.failed_replenishment();
            warn!("factory or warm-up panicked during replenish");
        }
    }
}

/// A WarmUpPool that can be shared between threads.
///
/// Replenishment runs on a background thread. Requests for it are coalesced through a channel of
/// capacity one: a request that finds the channel full is already covered by the pending one, and the
/// replenisher always reads the current buffer length and target before building.
pub struct SharedWarmUpPool<T: Send + 'static> {
    inner: Arc<Inner<T>>,
    requests: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    acquire_timeout: Duration,
}

impl<T: Send + 'static> SharedWarmUpPool<T> {
    /// Fill the pool to the configured target size on the calling thread, then start the replenisher.
    pub fn new(maker: Maker<T>, config: &PoolConfig) -> Result<SharedWarmUpPool<T>> {
        config.validate()?;

        let inner = Arc::new(Inner {
            maker,
            state: Mutex::new(State {
                ready: VecDeque::with_capacity(config.target_size),
                building: 0,
            }),
            available: Condvar::new(),
            target_size: AtomicUsize::new(config.target_size),
            counters: Counters::default(),
        });
        inner.fill()?;

        let (tx, rx) = bounded(1);
        let worker_inner = inner.clone();
        let worker = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || replenisher(worker_inner, rx))
            .map_err(PoolError::ReplenisherSpawn)?;

        Ok(SharedWarmUpPool {
            inner,
            requests: Some(tx),
            worker: Some(worker),
            acquire_timeout: config.acquire_timeout(),
        })
    }

    /// Take the oldest warmed instance. If the buffer is empty, wait up to the configured acquire timeout
    /// for the replenisher, then build one on the calling thread. A replenish is requested either way.
    pub fn acquire(&self) -> Result<T> {
        let r = match self.take_ready() {
            Some(obj) => {
                self.inner.counters.hit();
                Ok(obj)
            }
            None => {
                debug!("buffer empty, building on demand");
                self.inner.maker.make().map(|obj| {
                    self.inner.counters.created();
                    self.inner.counters.on_demand();
                    obj
                })
            }
        };

        self.request_replenish();

        r
    }

    fn take_ready(&self) -> Option<T> {
        let mut state = self.inner.lock();
        if let Some(obj) = state.ready.pop_front() {
            return Some(obj);
        }

        if self.acquire_timeout.is_zero() || self.target_size() == 0 {
            return None;
        }

        drop(state);
        self.request_replenish();
        state = self.inner.lock();

        let (mut state, _) = self
            .inner
            .available
            .wait_timeout_while(state, self.acquire_timeout, |s| s.ready.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        state.ready.pop_front()
    }

    /// Put an instance at the back of the buffer without warming it. The buffer may exceed the target size.
    pub fn release(&self, obj: T) {
        let len = {
            let mut state = self.inner.lock();
            state.ready.push_back(obj);
            state.ready.len()
        };
        self.inner.counters.released();
        self.inner.available.notify_one();

        trace!(ready = len, "released");
    }

    /// Change the target size. Growth is handled by the replenisher; shrinking leaves buffered instances
    /// to drain through acquire.
    pub fn set_target_size(&self, target_size: usize) -> Result<()> {
        check_target_size(target_size)?;
        self.inner.target_size.store(target_size, Ordering::Release);
        self.request_replenish();

        Ok(())
    }

    /// Replenish on the calling thread. Runs alongside the background replenisher without overshooting the
    /// target.
    pub fn replenish(&self) -> Result<usize> {
        self.inner.fill()
    }

    fn request_replenish(&self) {
        if let Some(requests) = &self.requests {
            match requests.try_send(()) {
                Ok(()) | Err(TrySendError::Full(())) => {}
                Err(TrySendError::Disconnected(())) => {
                    warn!("replenisher is gone, buffer will only refill through replenish()");
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn target_size(&self) -> usize {
        self.inner.target_size.load(Ordering::Acquire)
    }

    pub fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }

    pub fn stats(&self) -> PoolStats {
        self.inner.counters.snapshot()
    }
}

impl<T: Send + 'static> fmt::Debug for SharedWarmUpPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWarmUpPool")
            .field("len", &self.len())
            .field("target_size", &self.target_size())
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl<T: Send + 'static> Drop for SharedWarmUpPool<T> {
    fn drop(&mut self) {
        // Closing the channel ends the replenisher loop.
        self.requests.take();

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("replenisher thread panicked");
            }
        }
    }
}
