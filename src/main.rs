// flightcache - Flight delay statistics with Redis-backed result caching
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use flightcache::analyzer::{Analyzer, Query};
use flightcache::cache::{CacheStore, MemoryStore};
use flightcache::cli::Args;
use flightcache::config::AppConfig;
use flightcache::dataset::LazyTable;
use flightcache::metrics;
use flightcache::utils::logging;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration, CLI flags on top
    let mut config = AppConfig::load(args.config.as_deref())?;
    args.apply_to(&mut config);
    config.validate()?;

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting flightcache v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Connect to the cache; without it every query computes fresh
    let cache = match CacheStore::connect(&config.store, &config.cache).await {
        Ok(cache) => cache,
        Err(e) if e.is_connection() => {
            warn!("Redis unavailable, results will not be cached: {}", e);
            CacheStore::with_backend(Arc::new(MemoryStore::unreachable()), &config.cache)?
        }
        Err(e) => return Err(e.into()),
    };

    // Phase 4: Dataset is loaded on the first cache miss
    let dataset = Arc::new(LazyTable::new(&config.dataset.path));
    let analyzer = Analyzer::new(dataset, cache, config.dataset.clone());

    if args.clear {
        match analyzer.clear_cache().await {
            Ok(removed) => info!("Removed {} cached results", removed),
            Err(e) => warn!("Could not clear cache: {}", e),
        }
    }

    // Phase 5: Run each query repeatedly to show the cache at work
    println!("{}", "=".repeat(60));
    println!("AIRLINE DATA CACHING DEMO");
    println!("{}", "=".repeat(60));

    let queries = [
        Query::average_delay(&config.dataset.airline_column, "ARR_DELAY"),
        Query::flight_count("ORIGIN", false, &config.dataset.cancelled_column),
        Query::monthly_delay(&config.dataset.date_column, "ARR_DELAY"),
    ];

    for query in &queries {
        println!("\nTesting: {}", query);
        println!("{}", "-".repeat(40));

        let mut first_run = None;
        for run in 1..=args.runs {
            let started = Instant::now();
            let result = analyzer.run(query).await?;
            let elapsed = started.elapsed().as_secs_f64();
            println!("Run {} took {:.3}s ({} groups)", run, elapsed, result.len());

            match first_run {
                None => first_run = Some(elapsed),
                Some(first) if elapsed > 0.0 => println!("Speedup: {:.1}x", first / elapsed),
                Some(_) => {}
            }
        }
    }

    // Phase 6: Report
    println!("\nCache Statistics:");
    println!("{}", analyzer.get_cache_stats().await);

    if args.metrics {
        println!("\n{}", metrics::gather_metrics());
    }

    Ok(())
}
