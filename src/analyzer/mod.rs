// Cached flight statistics
// Author: kelexine (https://github.com/kelexine)

pub mod flight_analyzer;
pub mod query;

pub use flight_analyzer::{Analyzer, Grouped};
pub use query::{Query, QueryResult};
