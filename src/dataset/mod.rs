// Flight dataset: in-memory table, CSV loading and grouped statistics
// Author: kelexine (https://github.com/kelexine)

pub mod aggregator;
pub mod lazy;
pub mod loader;
pub mod table;

pub use aggregator::{Aggregator, AverageByGroup, CountByGroup};
pub use lazy::LazyTable;
pub use loader::{load_csv, read_csv};
pub use table::{Table, Value};
