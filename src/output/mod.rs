//! Spreadsheet exports and zip packaging.

pub mod archive;
pub mod report;

pub use archive::{read_entries, zip_entries};
pub use report::{export_rows, unit_report, UnitReport};
