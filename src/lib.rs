//! Multi-unit statement redaction and distribution.
//!
//! Splits bank, provident-fund and ESIC statements into one annotated PDF per
//! organizational unit. A roster spreadsheet maps units to employee
//! identifiers; every identifier found in a statement is highlighted for its
//! unit, and in masking mode everything else is covered. Each unit receives a
//! bundle holding its PDF and matched/unmatched roster exports, and the
//! bundles can be mirrored to object storage.
//!
//! # Architecture
//!
//! - [`domain`]: statement kinds, identifier matchers, roster, reporting period
//! - [`document`]: MuPDF word extraction and lopdf annotation/reassembly
//! - [`redaction`]: annotation layouts, page selection and the batch pipeline
//! - [`output`]: spreadsheet exports and zip packaging
//! - [`storage`]: S3 and local archive backends, browsing and uploads
//! - [`config`]: TOML configuration
//! - [`error`]: error types
//!
//! # Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use chrono::Local;
//! use unit_redactor::{
//!     run_batch, BatchRequest, ProcessingOptions, ReportingPeriod, Roster, StatementKind, Upload,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let today = Local::now().date_naive();
//! let request = BatchRequest {
//!     roster: Roster::from_path(Path::new("units.xlsx"), StatementKind::Esic)?,
//!     uploads: vec![Upload::from_path(Path::new("challan.pdf"))?],
//!     options: ProcessingOptions::default(),
//!     period: ReportingPeriod::parse("Mar", 2025, today)?,
//! };
//!
//! let outcome = run_batch(&request)?;
//! std::fs::write(outcome.archive_name(), outcome.master_archive()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Identifier Matching
//!
//! ```
//! use unit_redactor::domain::{IdentifierMatcher, StatementKind};
//!
//! let matcher = StatementKind::Pf.matcher();
//! assert!(matcher.is_candidate("100200300400"));
//! assert!(!matcher.is_candidate("1002003004"));
//! ```

pub mod config;
pub mod document;
pub mod domain;
pub mod error;
pub mod output;
pub mod redaction;
pub mod storage;

pub use config::Config;
pub use domain::{IdentifierMatcher, ReportingPeriod, Roster, StatementKind, UnitTarget};
pub use error::{RedactorError, RedactorResult};
pub use redaction::{
    run_batch, BatchOutcome, BatchRequest, BatchStats, MaskingMode, PageSelection,
    ProcessingOptions, RedactionService, UnitBundle, Upload,
};
pub use storage::{LocalStore, ObjectStore, S3Store};
