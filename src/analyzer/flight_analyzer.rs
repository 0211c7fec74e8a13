// Flight analyzer - cached statistical queries over the dataset
// Author: kelexine (https://github.com/kelexine)

use crate::analyzer::query::{Query, QueryResult};
use crate::cache::{CacheStore, StatsReport};
use crate::config::DatasetConfig;
use crate::dataset::{Aggregator, AverageByGroup, CountByGroup};
use crate::error::{AnalyticsError, Result};
use crate::metrics;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Grouped results report how many groups they hold, for logging.
pub trait Grouped {
    fn groups(&self) -> usize;
}

impl<V> Grouped for BTreeMap<String, V> {
    fn groups(&self) -> usize {
        self.len()
    }
}

/// Answers flight statistics queries, consulting the cache first.
///
/// The dataset is only read, never modified, so one analyzer can serve
/// concurrent queries. Two concurrent misses on the same key both compute
/// and both write; the results are identical so the last write wins.
pub struct Analyzer {
    source: Arc<dyn Aggregator>,
    cache: CacheStore,
    ttl: Duration,
    columns: DatasetConfig,
}

impl Analyzer {
    pub fn new(source: Arc<dyn Aggregator>, cache: CacheStore, columns: DatasetConfig) -> Self {
        let ttl = cache.ttl();
        Self {
            source,
            cache,
            ttl,
            columns,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Average delay per airline, grouped by the configured airline column.
    pub async fn get_avg_delay_by_airline(&self, delay_column: &str) -> Result<AverageByGroup> {
        let airline_column = self.columns.airline_column.clone();
        self.get_avg_delay_by(&airline_column, delay_column).await
    }

    /// Average delay per arbitrary category column.
    pub async fn get_avg_delay_by(&self, category_column: &str, delay_column: &str) -> Result<AverageByGroup> {
        let query = Query::average_delay(category_column, delay_column);
        let (group, value) = (category_column.to_string(), delay_column.to_string());
        self.cached(&query, move |source| source.average_by(&group, &value))
            .await
    }

    /// Flights per airport column (`ORIGIN` or `DEST`).
    pub async fn get_flights_by_airport(
        &self,
        airport_column: &str,
        include_cancelled: bool,
    ) -> Result<CountByGroup> {
        let query = Query::flight_count(airport_column, include_cancelled, &self.columns.cancelled_column);
        let group = airport_column.to_string();
        let flag = (!include_cancelled).then(|| self.columns.cancelled_column.clone());
        self.cached(&query, move |source| source.count_by(&group, flag.as_deref()))
            .await
    }

    /// Average delay per `YYYY-MM` of the configured date column.
    pub async fn get_monthly_delays(&self, delay_column: &str) -> Result<AverageByGroup> {
        let query = Query::monthly_delay(&self.columns.date_column, delay_column);
        let (date, value) = (self.columns.date_column.clone(), delay_column.to_string());
        self.cached(&query, move |source| source.monthly_average(&date, &value))
            .await
    }

    /// Run any query kind.
    pub async fn run(&self, query: &Query) -> Result<QueryResult> {
        match query {
            Query::AverageDelay {
                category_column,
                delay_column,
            } => self
                .get_avg_delay_by(category_column, delay_column)
                .await
                .map(QueryResult::Averages),
            Query::FlightCount {
                category_column,
                include_cancelled,
                cancelled_column,
            } => {
                let group = category_column.clone();
                let flag = (!include_cancelled).then(|| cancelled_column.clone());
                self.cached(query, move |source| source.count_by(&group, flag.as_deref()))
                    .await
                    .map(QueryResult::Counts)
            }
            Query::MonthlyDelay {
                date_column,
                delay_column,
            } => {
                let (date, value) = (date_column.clone(), delay_column.clone());
                self.cached(query, move |source| source.monthly_average(&date, &value))
                    .await
                    .map(QueryResult::Averages)
            }
        }
    }

    /// Drop every cached result so the next queries recompute.
    pub async fn clear_cache(&self) -> Result<u64> {
        self.cache.clear_all().await
    }

    pub async fn get_cache_stats(&self) -> StatsReport {
        self.cache.get_stats().await
    }

    /// Get-or-compute-and-store.
    ///
    /// Cache failures never fail the query: an unreadable cache means
    /// computing directly, an unwritable one means returning uncached.
    /// Errors from `compute` itself are returned and nothing is stored.
    async fn cached<T, F>(&self, query: &Query, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Grouped + Send + 'static,
        F: FnOnce(&dyn Aggregator) -> Result<T> + Send + 'static,
    {
        let tag = query.tag();
        let key = query.cache_key(&self.cache);
        debug!("Query {} -> key {}", query, key.short());

        match self.cache.get::<T>(&key).await {
            Ok(Some(value)) => {
                metrics::record_query(tag, true);
                info!(query = tag, "Returned {} from cache", query);
                return Ok(value);
            }
            Ok(None) => {}
            Err(e) if e.is_cache_failure() => {
                warn!(query = tag, "Cache read failed, computing directly: {}", e);
            }
            Err(e) => return Err(e),
        }

        info!(query = tag, "Computing {} from dataset (cache miss)", query);
        let started = Instant::now();
        let source = Arc::clone(&self.source);
        let result = tokio::task::spawn_blocking(move || compute(&*source))
            .await
            .map_err(|e| AnalyticsError::Internal(format!("aggregation task failed: {}", e)))??;
        let elapsed = started.elapsed();

        metrics::record_query(tag, false);
        metrics::record_compute(tag, elapsed.as_secs_f64());
        info!(
            query = tag,
            elapsed_ms = elapsed.as_millis() as u64,
            "Computed {} groups in {:.3}s",
            result.groups(),
            elapsed.as_secs_f64()
        );

        match self.cache.set(&key, &result, self.ttl).await {
            Ok(()) => debug!("Result cached for future requests"),
            Err(e) => warn!(query = tag, "Result not cached: {}", e),
        }

        Ok(result)
    }
}
