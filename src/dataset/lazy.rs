// Dataset handle that loads on first use
// Author: kelexine (https://github.com/kelexine)

use crate::dataset::aggregator::{Aggregator, AverageByGroup, CountByGroup};
use crate::dataset::loader::load_csv;
use crate::dataset::table::Table;
use crate::error::Result;
use once_cell::sync::OnceCell;
use std::path::PathBuf;

/// Defers reading the CSV until the first cache miss, so a process whose
/// queries are all answered from cache never pays the load cost.
///
/// A failed load is not remembered; the next query tries again.
#[derive(Debug)]
pub struct LazyTable {
    path: PathBuf,
    table: OnceCell<Table>,
}

impl LazyTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }

    pub fn table(&self) -> Result<&Table> {
        self.table.get_or_try_init(|| load_csv(&self.path))
    }
}

impl Aggregator for LazyTable {
    fn average_by(&self, group_column: &str, value_column: &str) -> Result<AverageByGroup> {
        self.table()?.average_by(group_column, value_column)
    }

    fn count_by(&self, group_column: &str, exclude_flag_column: Option<&str>) -> Result<CountByGroup> {
        self.table()?.count_by(group_column, exclude_flag_column)
    }

    fn monthly_average(&self, date_column: &str, value_column: &str) -> Result<AverageByGroup> {
        self.table()?.monthly_average(date_column, value_column)
    }
}
