// CSV loading
// Author: kelexine (https://github.com/kelexine)

use crate::dataset::table::{Table, Value};
use crate::error::{AnalyticsError, Result};
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Load a headered CSV file into a `Table`.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    info!("Loading data from {}", path.display());
    let started = Instant::now();

    let file = std::fs::File::open(path).map_err(|e| {
        AnalyticsError::Dataset(format!("cannot open {}: {}", path.display(), e))
    })?;
    let table = read_csv(file)?;

    info!(
        "Data loaded successfully: {} rows x {} columns in {:.2}s",
        table.len(),
        table.columns().len(),
        started.elapsed().as_secs_f64()
    );
    Ok(table)
}

/// Parse CSV from any reader. The first record names the columns.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if columns.is_empty() {
        return Err(AnalyticsError::Dataset("CSV has no header row".to_string()));
    }

    let mut table = Table::new(columns)?;
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(Value::parse).collect())?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Aggregator;
    use std::io::Write;

    const SAMPLE: &str = "\
FL_DATE,OP_CARRIER,ORIGIN,DEST,DEP_DELAY,ARR_DELAY,CANCELLED
2019-01-01,AA,JFK,LAX,5.0,10.0,0
2019-01-02,AA,JFK,SFO,,20.0,0
2019-01-03,UA,SFO,JFK,1.0,,1
";

    #[test]
    fn test_read_csv() {
        let table = read_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.has_column("ARR_DELAY"));

        let avg = table.average_by("OP_CARRIER", "ARR_DELAY").unwrap();
        assert_eq!(avg["AA"], 15.0);
        assert!(!avg.contains_key("UA"));
    }

    #[test]
    fn test_ragged_csv_is_an_error() {
        let result = read_csv("A,B\n1,2\n3\n".as_bytes());
        assert!(matches!(result, Err(AnalyticsError::Csv(_))));
    }

    #[test]
    fn test_load_csv_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let table = load_csv(file.path()).unwrap();
        assert_eq!(table.count_by("ORIGIN", None).unwrap()["JFK"], 2);
    }

    #[test]
    fn test_missing_file() {
        let result = load_csv("/nonexistent/flights.csv");
        assert!(matches!(result, Err(AnalyticsError::Dataset(_))));
    }
}
