//
// Shared helpers for the pool integration tests. Each test binary pulls this in with `mod common;`.
//
#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use warmup::Maker;

/// Object that records how many times it was warmed.
#[derive(Debug)]
pub struct Tracked {
    pub id: u64,
    pub warm_ups: u32,
}

/// Counts factory calls and warm-up calls.
#[derive(Debug, Default)]
pub struct Calls {
    pub created: AtomicU64,
    pub warmed: AtomicU64,
}

impl Calls {
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn warmed(&self) -> u64 {
        self.warmed.load(Ordering::SeqCst)
    }
}

/// A Maker handing out Tracked objects with ids 1, 2, 3, ...
pub fn tracked_maker() -> (Maker<Tracked>, Arc<Calls>) {
    let calls = Arc::new(Calls::default());

    let c = calls.clone();
    let factory = move || Tracked {
        id: c.created.fetch_add(1, Ordering::SeqCst) + 1,
        warm_ups: 0,
    };

    let c = calls.clone();
    let warm_up = move |obj: &mut Tracked| {
        obj.warm_ups += 1;
        c.warmed.fetch_add(1, Ordering::SeqCst);
    };

    (Maker::new(factory, warm_up), calls)
}

/// Poll `cond` until it holds or a generous deadline passes.
pub fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}
