use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::config::{check_target_size, PoolConfig};
use crate::error::{BoxError, Result};
use crate::maker::{LocalMaker, Maker};
use crate::stats::{Counters, PoolStats};

/// WarmUpPool keeps a FIFO buffer of warmed instances topped up to a target size. Replenishment is
/// synchronous and runs on the caller's thread. Use SharedWarmUpPool when several threads need the same
/// pool.
#[derive(Debug)]
pub struct WarmUpPool<T> {
    maker: LocalMaker<T>,
    ready: VecDeque<T>,
    target_size: usize,
    counters: Counters,
}

impl<T> WarmUpPool<T> {
    /// Create a pool and fill it to `target_size` before returning. This builds `target_size` instances, so
    /// call it at startup rather than on a latency sensitive path.
    pub fn new<F, W>(factory: F, warm_up: W, target_size: usize) -> Result<WarmUpPool<T>>
    where
        F: Fn() -> T + 'static,
        W: Fn(&mut T) + 'static,
    {
        WarmUpPool::from_local(LocalMaker::new(factory, warm_up), target_size)
    }

    /// Like new, for factories and warm-up hooks that can fail.
    pub fn try_new<F, W, E1, E2>(factory: F, warm_up: W, target_size: usize) -> Result<WarmUpPool<T>>
    where
        F: Fn() -> std::result::Result<T, E1> + 'static,
        W: Fn(&mut T) -> std::result::Result<(), E2> + 'static,
        E1: Into<BoxError>,
        E2: Into<BoxError>,
    {
        WarmUpPool::from_local(LocalMaker::fallible(factory, warm_up), target_size)
    }

    pub fn with_config(maker: Maker<T>, config: &PoolConfig) -> Result<WarmUpPool<T>> {
        config.validate()?;
        WarmUpPool::from_maker(maker, config.target_size)
    }

    /// Build from a Maker that is also used for SharedWarmUpPools.
    pub fn from_maker(maker: Maker<T>, target_size: usize) -> Result<WarmUpPool<T>> {
        WarmUpPool::from_local(maker.into(), target_size)
    }

    pub fn from_local(maker: LocalMaker<T>, target_size: usize) -> Result<WarmUpPool<T>> {
        check_target_size(target_size)?;

        let mut pool = WarmUpPool {
            maker,
            ready: VecDeque::with_capacity(target_size),
            target_size,
            counters: Counters::default(),
        };
        pool.replenish()?;

        Ok(pool)
    }

    /// Change the target size and replenish immediately. Shrinking does not drop buffered instances, they
    /// drain through acquire.
    pub fn set_target_size(&mut self, target_size: usize) -> Result<usize> {
        check_target_size(target_size)?;
        self.target_size = target_size;

        self.replenish()
    }

    /// Build and warm instances until the buffer holds `target_size` of them. Returns how many were built.
    ///
    /// On failure every instance warmed before the error stays buffered and the error is returned.
    pub fn replenish(&mut self) -> Result<usize> {
        let mut built = 0;

        while self.ready.len() < self.target_size {
            match self.maker.make() {
                Ok(obj) => {
                    self.counters.created();
                    self.ready.push_back(obj);
                    built += 1;
                }
                Err(err) => {
                    self.counters.failed_replenishment();
                    warn!(
                        ready = self.ready.len(),
                        target_size = self.target_size,
                        error = %err,
                        "replenish stopped"
                    );
                    return Err(err);
                }
            }
        }

        if built > 0 {
            debug!(built, ready = self.ready.len(), "replenished");
        }

        Ok(built)
    }

    /// Take the oldest warmed instance, or build one if the buffer is empty, then replenish before
    /// returning.
    ///
    /// If that replenish fails the instance goes back to the front of the buffer and the error is returned.
    pub fn acquire(&mut self) -> Result<T> {
        let (obj, hit) = match self.ready.pop_front() {
            Some(obj) => (obj, true),
            None => {
                debug!("buffer empty, building on demand");
                let obj = self.maker.make()?;
                self.counters.created();
                (obj, false)
            }
        };

        if let Err(err) = self.replenish() {
            self.ready.push_front(obj);
            return Err(err);
        }

        if hit {
            self.counters.hit();
        } else {
            self.counters.on_demand();
        }

        trace!(ready = self.ready.len(), "acquired");

        Ok(obj)
    }

    /// Put an instance at the back of the buffer without warming it. The buffer may exceed the target size.
    pub fn release(&mut self, obj: T) {
        self.counters.released();
        self.ready.push_back(obj);

        trace!(ready = self.ready.len(), "released");
    }

    pub fn len(&self) -> usize {
        self.ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    /// Buffered instances, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.ready.iter()
    }
}
