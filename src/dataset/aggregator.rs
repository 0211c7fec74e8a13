// Aggregation interface consumed by the analyzer
// Author: kelexine (https://github.com/kelexine)

use crate::error::Result;
use std::collections::BTreeMap;

/// Mean of a numeric column per category label.
pub type AverageByGroup = BTreeMap<String, f64>;

/// Row count per category label.
pub type CountByGroup = BTreeMap<String, u64>;

/// Grouped statistics over a read-only flight table.
///
/// Implementations must be pure functions of the data they hold: the
/// analyzer caches their output and assumes recomputing gives the same
/// answer. Referencing a column that does not exist is
/// `AnalyticsError::MissingColumn`.
pub trait Aggregator: Send + Sync {
    /// Arithmetic mean of `value_column` per `group_column` label. Null or
    /// non-numeric values are left out of their group's mean; groups with no
    /// numeric values at all are omitted. Means are rounded to 2 decimals.
    fn average_by(&self, group_column: &str, value_column: &str) -> Result<AverageByGroup>;

    /// Rows per `group_column` label. When `exclude_flag_column` is given,
    /// rows whose flag is a non-zero number are skipped.
    fn count_by(&self, group_column: &str, exclude_flag_column: Option<&str>) -> Result<CountByGroup>;

    /// Mean of `value_column` per `YYYY-MM` label derived from `date_column`.
    fn monthly_average(&self, date_column: &str, value_column: &str) -> Result<AverageByGroup>;
}
