use std::sync::atomic::{AtomicU64, Ordering};

/// Point in time copy of a pool's counters.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Instances built and warmed, buffered or on demand
    pub created: u64,
    /// Acquires served from the buffer
    pub hits: u64,
    /// Acquires that had to build an instance on the caller's thread
    pub on_demand: u64,
    /// Instances handed back through release
    pub released: u64,
    /// Replenish attempts that stopped on a factory or warm-up error
    pub failed_replenishments: u64,
}

impl PoolStats {
    pub fn acquired(&self) -> u64 {
        self.hits + self.on_demand
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    created: AtomicU64,
    hits: AtomicU64,
    on_demand: AtomicU64,
    released: AtomicU64,
    failed_replenishments: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn on_demand(&self) {
        self.on_demand.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn failed_replenishment(&self) {
        self.failed_replenishments.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PoolStats {
        PoolStats {
            created: self.created.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            on_demand: self.on_demand.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            failed_replenishments: self.failed_replenishments.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_counts() {
        let c = Counters::default();
        c.created();
        c.created();
        c.hit();
        c.on_demand();
        c.released();

        let s = c.snapshot();
        assert_eq!(s.created, 2);
        assert_eq!(s.acquired(), 2);
        assert_eq!(s.released, 1);
        assert_eq!(s.failed_replenishments, 0);
    }
}
