//! Pools of pre-built, pre-warmed objects.
//!
//! Expensive objects are built and warmed ahead of time so callers can take one without paying for
//! construction. WarmUpPool replenishes synchronously on the caller's thread. SharedWarmUpPool is the
//! thread-safe variant and replenishes on a background thread.

pub mod config;
pub mod error;
pub mod maker;
pub mod page;
pub mod shared;
pub mod stats;
pub mod warm_pool;

pub use config::{PoolConfig, DEFAULT_TARGET_SIZE};
pub use error::{PoolError, Result};
pub use maker::{LocalMaker, Maker};
pub use shared::SharedWarmUpPool;
pub use warm_pool::WarmUpPool;
