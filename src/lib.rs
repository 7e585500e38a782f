//! Sales-operations reporting: derived growth/achievement metrics, TAP →
//! Salesforce rollups with subtotals, and filterable, sortable, paginated
//! detail tables with CSV/XLSX export.
pub mod access;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod reports;
pub mod rollup;
pub mod table;
pub mod types;
pub mod util;

pub use error::{ReportError, Result};
