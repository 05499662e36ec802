//
// Drives a page pool from several threads and prints the pool counters.
//
// Options can come from a YAML file (see PoolConfig) and be overridden on the command line:
//
// cargo run --example page_pool -- --threads 4 --acquires 1000 --target-size 8
//
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use cli_table::{format::Justify, Table, WithTitle};
use rand::Rng;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use warmup::page::page_pool;
use warmup::PoolConfig;

#[derive(StructOpt, Debug)]
#[structopt(name = "page_pool")]
struct Opt {
    /// YAML pool configuration
    #[structopt(long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Override the configured target size
    #[structopt(long)]
    target_size: Option<usize>,

    /// Override the configured acquire timeout
    #[structopt(long)]
    acquire_timeout_ms: Option<u64>,

    /// Number of threads taking pages
    #[structopt(long, default_value = "4")]
    threads: usize,

    /// Pages taken per thread
    #[structopt(long, default_value = "1000")]
    acquires: usize,

    /// Percentage of pages handed back to the pool after use
    #[structopt(long, default_value = "50")]
    release_pct: u32,
}

#[derive(Default, Debug, Copy, Clone, Table)]
struct StatsRow {
    #[table(name = "Target", justify = "Justify::Right")]
    target_size: usize,
    #[table(name = "Ready")]
    ready: usize,
    #[table(name = "Created")]
    created: u64,
    #[table(name = "Hits")]
    hits: u64,
    #[table(name = "On Demand")]
    on_demand: u64,
    #[table(name = "Released")]
    released: u64,
    #[table(name = "Failed Replenishments")]
    failed_replenishments: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opt = Opt::from_args();

    let mut config = match &opt.config {
        Some(path) => PoolConfig::from_yaml(&fs::read_to_string(path)?)?,
        None => PoolConfig::default(),
    };
    if let Some(n) = opt.target_size {
        config = config.with_target_size(n);
    }
    if let Some(ms) = opt.acquire_timeout_ms {
        config = config.with_acquire_timeout(Duration::from_millis(ms));
    }

    let start = Instant::now();
    let pool = Arc::new(page_pool(&config)?);
    info!(elapsed = ?start.elapsed(), target_size = config.target_size, "pool filled");

    let start = Instant::now();
    let handles: Vec<_> = (0..opt.threads)
        .map(|i| {
            let pool = pool.clone();
            let acquires = opt.acquires;
            let release_pct = opt.release_pct;
            thread::spawn(move || -> warmup::Result<()> {
                let mut rng = rand::thread_rng();
                for n in 0..acquires {
                    let mut page = pool.acquire()?;
                    page.load(&format!("<svg id=\"t{}-{}\"></svg>", i, n));

                    if rng.gen_range(0..100) < release_pct {
                        page.warm_up();
                        pool.release(page);
                    }
                }
                Ok(())
            })
        })
        .collect();

    for handle in handles {
        match handle.join() {
            Ok(r) => r?,
            Err(_) => return Err("worker thread panicked".into()),
        }
    }
    info!(elapsed = ?start.elapsed(), "workers done");

    let stats = pool.stats();
    let row = StatsRow {
        target_size: pool.target_size(),
        ready: pool.len(),
        created: stats.created,
        hits: stats.hits,
        on_demand: stats.on_demand,
        released: stats.released,
        failed_replenishments: stats.failed_replenishments,
    };
    let rows = vec![&row];

    let r = cli_table::print_stdout(rows.with_title());
    if let Err(err) = r {
        println!("error: {:?}", err);
    }

    Ok(())
}
