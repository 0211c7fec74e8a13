// Query kinds and their cache identity
// Author: kelexine (https://github.com/kelexine)

use crate::cache::{CacheKey, CacheStore, KeyParam};
use crate::dataset::{AverageByGroup, CountByGroup};
use serde::Serialize;
use std::fmt;

/// Every statistic the analyzer can serve. Each variant carries exactly
/// the parameters that make its result differ, and all of them end up in
/// the cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Mean delay per category (airline by default).
    AverageDelay {
        category_column: String,
        delay_column: String,
    },
    /// Flights per category (airport), optionally without cancellations.
    FlightCount {
        category_column: String,
        include_cancelled: bool,
        cancelled_column: String,
    },
    /// Mean delay per `YYYY-MM`.
    MonthlyDelay {
        date_column: String,
        delay_column: String,
    },
}

impl Query {
    pub fn average_delay(category_column: &str, delay_column: &str) -> Self {
        Query::AverageDelay {
            category_column: category_column.to_string(),
            delay_column: delay_column.to_string(),
        }
    }

    pub fn flight_count(category_column: &str, include_cancelled: bool, cancelled_column: &str) -> Self {
        Query::FlightCount {
            category_column: category_column.to_string(),
            include_cancelled,
            cancelled_column: cancelled_column.to_string(),
        }
    }

    pub fn monthly_delay(date_column: &str, delay_column: &str) -> Self {
        Query::MonthlyDelay {
            date_column: date_column.to_string(),
            delay_column: delay_column.to_string(),
        }
    }

    /// Stable tag; part of the key and the metric label.
    pub fn tag(&self) -> &'static str {
        match self {
            Query::AverageDelay { .. } => "avg_delay",
            Query::FlightCount { .. } => "flight_count",
            Query::MonthlyDelay { .. } => "monthly_delay",
        }
    }

    /// The column the statistic is about.
    pub fn column(&self) -> &str {
        match self {
            Query::AverageDelay { delay_column, .. } => delay_column,
            Query::FlightCount { category_column, .. } => category_column,
            Query::MonthlyDelay { delay_column, .. } => delay_column,
        }
    }

    /// Remaining parameters, by name.
    pub fn params(&self) -> Vec<(&'static str, KeyParam)> {
        match self {
            Query::AverageDelay { category_column, .. } => {
                vec![("group_by", KeyParam::from(category_column.as_str()))]
            }
            Query::FlightCount {
                include_cancelled,
                cancelled_column,
                ..
            } => {
                let mut params = vec![("include_cancelled", KeyParam::Bool(*include_cancelled))];
                // The flag column only matters when it is used to filter.
                if !include_cancelled {
                    params.push(("cancelled_column", KeyParam::from(cancelled_column.as_str())));
                }
                params
            }
            Query::MonthlyDelay { date_column, .. } => {
                vec![("date_column", KeyParam::from(date_column.as_str()))]
            }
        }
    }

    pub fn cache_key(&self, store: &CacheStore) -> CacheKey {
        store.build_key(self.tag(), self.column(), &self.params())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::AverageDelay {
                category_column,
                delay_column,
            } => write!(f, "average {} by {}", delay_column, category_column),
            Query::FlightCount {
                category_column,
                include_cancelled,
                ..
            } => {
                write!(f, "flights by {}", category_column)?;
                if !include_cancelled {
                    write!(f, " (excluding cancelled)")?;
                }
                Ok(())
            }
            Query::MonthlyDelay { delay_column, .. } => write!(f, "monthly average {}", delay_column),
        }
    }
}

/// Result of `Analyzer::run`, shaped by the query kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Averages(AverageByGroup),
    Counts(CountByGroup),
}

impl QueryResult {
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Averages(m) => m.len(),
            QueryResult::Counts(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::CacheSettings;
    use std::sync::Arc;

    fn store() -> CacheStore {
        CacheStore::with_backend(Arc::new(MemoryStore::new()), &CacheSettings::default()).unwrap()
    }

    #[test]
    fn test_equal_queries_share_a_key() {
        let store = store();
        let a = Query::average_delay("OP_CARRIER", "ARR_DELAY");
        let b = Query::average_delay("OP_CARRIER", "ARR_DELAY");
        assert_eq!(a.cache_key(&store), b.cache_key(&store));
    }

    #[test]
    fn test_every_component_changes_the_key() {
        let store = store();
        let keys = [
            Query::average_delay("OP_CARRIER", "ARR_DELAY"),
            Query::average_delay("OP_CARRIER", "DEP_DELAY"),
            Query::average_delay("ORIGIN", "ARR_DELAY"),
            Query::monthly_delay("FL_DATE", "ARR_DELAY"),
            Query::monthly_delay("FL_DATE", "DEP_DELAY"),
            Query::flight_count("ORIGIN", true, "CANCELLED"),
            Query::flight_count("ORIGIN", false, "CANCELLED"),
            Query::flight_count("ORIGIN", false, "DIVERTED"),
            Query::flight_count("DEST", true, "CANCELLED"),
        ]
        .map(|q| q.cache_key(&store));

        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_cancelled_column_ignored_when_not_filtering() {
        let store = store();
        assert_eq!(
            Query::flight_count("ORIGIN", true, "CANCELLED").cache_key(&store),
            Query::flight_count("ORIGIN", true, "DIVERTED").cache_key(&store)
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Query::flight_count("ORIGIN", false, "CANCELLED").to_string(),
            "flights by ORIGIN (excluding cancelled)"
        );
    }
}
