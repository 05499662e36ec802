//! Pages: document buffers that are warmed by loading a neutral blank document, and the process-wide pool
//! of them.

use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::info;

use crate::config::PoolConfig;
use crate::error::Result;
use crate::maker::Maker;
use crate::shared::SharedWarmUpPool;

/// Neutral document loaded into every page during warm-up.
pub const BLANK_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
  <style>
    body {
      background-color: transparent;
    }
  </style>
</head>
<body>
</body>
</html>
"#;

/// Initial capacity of a page's document buffer.
pub const PAGE_CAPACITY: usize = 16 * 1024;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Page {
    html: String,
    loads: u32,
}

impl Page {
    pub fn new() -> Page {
        Page {
            html: String::with_capacity(PAGE_CAPACITY),
            loads: 0,
        }
    }

    /// Replace the page's document.
    pub fn load(&mut self, html: &str) {
        self.html.clear();
        self.html.push_str(html);
        self.loads += 1;
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Number of documents loaded since the page was created, warm-up included.
    pub fn loads(&self) -> u32 {
        self.loads
    }

    pub fn is_blank(&self) -> bool {
        self.html == BLANK_PAGE_HTML
    }

    /// Load the blank document.
    pub fn warm_up(&mut self) {
        self.load(BLANK_PAGE_HTML);
    }
}

pub fn page_maker() -> Maker<Page> {
    Maker::new(Page::new, Page::warm_up)
}

/// Build a page pool. Prefer handing one of these to the components that need pages over reaching for
/// shared_pages.
pub fn page_pool(config: &PoolConfig) -> Result<SharedWarmUpPool<Page>> {
    SharedWarmUpPool::new(page_maker(), config)
}

static SHARED_PAGES: OnceLock<SharedWarmUpPool<Page>> = OnceLock::new();
static SHARED_PAGES_INIT: Mutex<()> = Mutex::new(());

/// Process-wide page pool with the default configuration. The first call builds it, filling it to the
/// default target size on the calling thread. Concurrent first calls wait for that build and get the same
/// pool. If building fails the error is returned and the next call tries again.
pub fn shared_pages() -> Result<&'static SharedWarmUpPool<Page>> {
    if let Some(pool) = SHARED_PAGES.get() {
        return Ok(pool);
    }

    let _init = SHARED_PAGES_INIT
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(pool) = SHARED_PAGES.get() {
        return Ok(pool);
    }

    let pool = page_pool(&PoolConfig::default())?;
    info!(target_size = pool.target_size(), "shared page pool ready");

    Ok(SHARED_PAGES.get_or_init(|| pool))
}
