//
// SharedWarmUpPool under concurrent use: many threads acquiring and releasing while the background
// replenisher keeps the buffer topped up.
//
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rand::Rng;

use warmup::{PoolConfig, SharedWarmUpPool};

mod common;
use common::{tracked_maker, wait_until};

const THREADS: usize = 8;
const ROUNDS: usize = 250;

#[test]
fn threads_never_share_an_instance() {
    let (maker, calls) = tracked_maker();
    let config = PoolConfig::default().with_target_size(16);
    let pool = Arc::new(SharedWarmUpPool::new(maker, &config).unwrap());

    // Ids currently held by some thread
    let held = Arc::new(Mutex::new(HashSet::new()));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let pool = pool.clone();
            let held = held.clone();
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..ROUNDS {
                    let obj = pool.acquire().unwrap();
                    assert_eq!(obj.warm_ups, 1);
                    assert!(held.lock().unwrap().insert(obj.id), "{} acquired twice", obj.id);

                    if rng.gen_bool(0.5) {
                        held.lock().unwrap().remove(&obj.id);
                        pool.release(obj);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(calls.warmed(), calls.created());
    let stats = pool.stats();
    assert_eq!(stats.acquired(), (THREADS * ROUNDS) as u64);
    assert_eq!(stats.created, calls.created());
}

#[test]
fn replenisher_restores_target() {
    let (maker, calls) = tracked_maker();
    let config = PoolConfig::default().with_target_size(10);
    let pool = SharedWarmUpPool::new(maker, &config).unwrap();

    let taken: Vec<_> = (0..10).map(|_| pool.acquire().unwrap()).collect();
    assert_eq!(
        taken.iter().map(|obj| obj.id).collect::<Vec<_>>(),
        (1..=10).collect::<Vec<_>>()
    );

    assert!(wait_until(|| pool.len() == 10));
    // Slots are reserved before building, so the replenisher never overshoots.
    thread::sleep(Duration::from_millis(20));
    assert_eq!(pool.len(), 10);
    assert_eq!(calls.created(), 20);
}

#[test]
fn release_can_exceed_target() {
    let (maker, _) = tracked_maker();
    let config = PoolConfig::default().with_target_size(2);
    let pool = SharedWarmUpPool::new(maker, &config).unwrap();

    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    assert!(wait_until(|| pool.len() == 2));

    pool.release(a);
    pool.release(b);
    assert_eq!(pool.len(), 4);
    assert_eq!(pool.stats().released, 2);
}

#[test]
fn synchronous_and_background_replenish_do_not_overshoot() {
    let (maker, calls) = tracked_maker();
    let config = PoolConfig::default().with_target_size(0);
    let pool = Arc::new(SharedWarmUpPool::new(maker, &config).unwrap());

    pool.set_target_size(32).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pool = pool.clone();
            thread::spawn(move || pool.replenish().unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(wait_until(|| pool.len() == 32));
    thread::sleep(Duration::from_millis(20));
    assert_eq!(pool.len(), 32);
    assert_eq!(calls.created(), 32);
}

#[test]
fn drop_stops_replenisher() {
    let (maker, calls) = tracked_maker();
    let config = PoolConfig::default()
        .with_target_size(4)
        .with_thread_name("drop-test");
    let pool = SharedWarmUpPool::new(maker, &config).unwrap();
    pool.acquire().unwrap();
    drop(pool);

    let created = calls.created();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(calls.created(), created);
}
