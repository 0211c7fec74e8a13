// In-memory flight table and its aggregations
// Author: kelexine (https://github.com/kelexine)

use crate::dataset::aggregator::{Aggregator, AverageByGroup, CountByGroup};
use crate::error::{AnalyticsError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeMap, HashMap};

/// Date layouts accepted for month derivation, tried in order.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    /// Interpret a raw CSV field. Blank, `NA`, `NaN` and `null` are missing.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || ["na", "nan", "null"].contains(&trimmed.to_ascii_lowercase().as_str())
        {
            return Value::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Value::Number(n),
            _ => Value::Text(trimmed.to_string()),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Category label used as a grouping key; `None` for missing cells.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Value::Number(n) => Some(n.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Row-oriented table with named columns. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(AnalyticsError::Dataset(format!("duplicate column {:?}", name)));
            }
        }
        Ok(Self {
            columns,
            index,
            rows: Vec::new(),
        })
    }

    /// Build a table from literal rows; handy for fixtures.
    pub fn from_rows<I>(columns: &[&str], rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<Value>>,
    {
        let mut table = Self::new(columns.iter().map(|c| c.to_string()).collect())?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(AnalyticsError::Dataset(format!(
                "row {} has {} fields, expected {}",
                self.rows.len() + 1,
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| AnalyticsError::MissingColumn(name.to_string()))
    }

    fn grouped_mean<F>(&self, value_column: &str, mut label_of: F) -> Result<AverageByGroup>
    where
        F: FnMut(&[Value]) -> Result<Option<String>>,
    {
        let value_idx = self.column_index(value_column)?;
        let mut sums: BTreeMap<String, (f64, u64)> = BTreeMap::new();

        for row in &self.rows {
            let Some(value) = row[value_idx].as_number() else {
                continue;
            };
            let Some(label) = label_of(row.as_slice())? else {
                continue;
            };
            let entry = sums.entry(label).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }

        Ok(sums
            .into_iter()
            .map(|(label, (sum, count))| (label, round2(sum / count as f64)))
            .collect())
    }
}

impl Aggregator for Table {
    fn average_by(&self, group_column: &str, value_column: &str) -> Result<AverageByGroup> {
        let group_idx = self.column_index(group_column)?;
        self.grouped_mean(value_column, |row| Ok(row[group_idx].label()))
    }

    fn count_by(&self, group_column: &str, exclude_flag_column: Option<&str>) -> Result<CountByGroup> {
        let group_idx = self.column_index(group_column)?;
        let flag_idx = exclude_flag_column
            .map(|name| self.column_index(name))
            .transpose()?;

        let mut counts = CountByGroup::new();
        for row in &self.rows {
            if let Some(idx) = flag_idx {
                if row[idx].as_number().is_some_and(|flag| flag != 0.0) {
                    continue;
                }
            }
            if let Some(label) = row[group_idx].label() {
                *counts.entry(label).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    fn monthly_average(&self, date_column: &str, value_column: &str) -> Result<AverageByGroup> {
        let date_idx = self.column_index(date_column)?;
        self.grouped_mean(value_column, |row| match &row[date_idx] {
            Value::Null => Ok(None),
            Value::Text(raw) => month_label(raw).map(Some),
            Value::Number(n) => Err(AnalyticsError::Dataset(format!(
                "column {} holds {} where a date was expected",
                date_column, n
            ))),
        })
    }
}

/// `YYYY-MM` for any accepted date layout.
pub fn month_label(raw: &str) -> Result<String> {
    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| AnalyticsError::Dataset(format!("unrecognized date {:?}", raw)))?;

    Ok(date.format("%Y-%m").to_string())
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
