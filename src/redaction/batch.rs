//! Batch pipeline: many uploads, one roster, one bundle per unit.
//!
//! Uploads are checked for duplicates, processed on a bounded rayon pool and
//! merged per unit in upload order. Only units with at least one matched
//! identifier get a bundle; a batch where no unit matched is an error.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use lopdf::Document;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::{DocumentOutcome, ProcessingOptions, RedactionService};
use crate::document::{merge_documents, save_document};
use crate::domain::{ReportingPeriod, Roster, StatementKind};
use crate::error::{RedactorError, RedactorResult};
use crate::output::{unit_report, zip_entries};

/// An uploaded statement.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a statement from disk, named after its file name.
    pub fn from_path(path: &Path) -> RedactorResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| RedactorError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    /// Hex SHA-256 of the content.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

/// Everything a batch run needs.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub roster: Roster,
    pub uploads: Vec<Upload>,
    pub options: ProcessingOptions,
    pub period: ReportingPeriod,
}

impl BatchRequest {
    pub fn kind(&self) -> StatementKind {
        self.roster.kind()
    }
}

/// Deliverables of one unit.
#[derive(Debug, Clone)]
pub struct UnitBundle {
    pub unit: String,
    pub pdf: Vec<u8>,
    pub matched: Vec<u8>,
    pub unmatched: Vec<u8>,
    pub matched_ids: BTreeSet<String>,
}

impl UnitBundle {
    /// Zip of the unit's PDF and both exports.
    pub fn to_zip(&self, kind: StatementKind) -> RedactorResult<Vec<u8>> {
        zip_entries([
            (kind.pdf_entry_name(&self.unit), self.pdf.as_slice()),
            (kind.matched_entry_name(&self.unit), self.matched.as_slice()),
            (kind.unmatched_entry_name(&self.unit), self.unmatched.as_slice()),
        ])
    }
}

/// Counters of a batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStats {
    pub documents: usize,
    pub pages: usize,
    pub highlights: usize,
    pub masks: usize,
    pub elapsed: Duration,
}

/// Result of a batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub kind: StatementKind,
    pub period: ReportingPeriod,
    /// Bundles in roster order
    pub bundles: Vec<UnitBundle>,
    pub stats: BatchStats,
}

impl BatchOutcome {
    /// File name of the master archive, e.g. `Mar-2025.zip`.
    pub fn archive_name(&self) -> String {
        self.period.archive_name()
    }

    /// Master zip holding one zip per unit bundle.
    pub fn master_archive(&self) -> RedactorResult<Vec<u8>> {
        let mut entries = Vec::with_capacity(self.bundles.len());
        for bundle in &self.bundles {
            entries.push((self.kind.unit_archive_name(&bundle.unit), bundle.to_zip(self.kind)?));
        }
        zip_entries(entries)
    }
}

/// Rejects uploads sharing a name or identical content.
pub fn check_duplicates(uploads: &[Upload]) -> RedactorResult<()> {
    let mut names: HashSet<&str> = HashSet::new();
    let mut digests: HashMap<String, &str> = HashMap::new();

    for upload in uploads {
        if !names.insert(upload.name.as_str()) {
            return Err(RedactorError::DuplicateUpload {
                name: upload.name.clone(),
                reason: "file name uploaded more than once".to_string(),
            });
        }
        if let Some(first) = digests.insert(upload.digest(), upload.name.as_str()) {
            return Err(RedactorError::DuplicateUpload {
                name: upload.name.clone(),
                reason: format!("same content as '{first}'"),
            });
        }
    }
    Ok(())
}

/// Runs a whole batch.
pub fn run_batch(request: &BatchRequest) -> RedactorResult<BatchOutcome> {
    if request.uploads.is_empty() {
        return Err(RedactorError::invalid_input(
            "uploads",
            "at least one PDF statement is required",
        ));
    }
    if request.options.workers == 0 {
        return Err(RedactorError::invalid_input(
            "workers",
            "worker count must be at least 1",
        ));
    }
    check_duplicates(&request.uploads)?;

    let started = Instant::now();
    let service = RedactionService::for_roster(&request.roster, request.options);
    let outcomes = process_uploads(&service, request, started)?;

    let mut stats = BatchStats {
        documents: outcomes.len(),
        ..Default::default()
    };
    let mut per_unit: HashMap<String, (Vec<Document>, BTreeSet<String>)> = HashMap::new();
    for outcome in outcomes {
        stats.pages += outcome.pages;
        stats.highlights += outcome.highlights;
        stats.masks += outcome.masks;
        for unit_doc in outcome.units {
            let entry = per_unit.entry(unit_doc.unit).or_default();
            entry.0.push(unit_doc.document);
            entry.1.extend(unit_doc.matched);
        }
    }

    let mut bundles = Vec::new();
    for unit in request.roster.units() {
        let Some((documents, matched)) = per_unit.remove(&unit.name) else {
            continue;
        };
        if matched.is_empty() {
            debug!("Unit '{}' has no matches, skipping bundle", unit.name);
            continue;
        }

        let mut merged = merge_documents(documents)?;
        let pdf = save_document(&mut merged)?;
        let report = unit_report(&request.roster, &unit.name, &matched)?;
        debug!(
            "Unit '{}': {} matched, {} unmatched roster row(s)",
            unit.name, report.matched_rows, report.unmatched_rows
        );
        bundles.push(UnitBundle {
            unit: unit.name.clone(),
            pdf,
            matched: report.matched,
            unmatched: report.unmatched,
            matched_ids: matched,
        });
    }

    if bundles.is_empty() {
        return Err(RedactorError::NoMatch {
            documents: request.uploads.len(),
            units: request.roster.units().len(),
        });
    }

    stats.elapsed = started.elapsed();
    info!(
        "Batch {} {}: {} unit bundle(s), {} highlight(s), {} mask(s) in {:.2}s",
        request.kind(),
        request.period,
        bundles.len(),
        stats.highlights,
        stats.masks,
        stats.elapsed.as_secs_f64()
    );

    Ok(BatchOutcome {
        kind: request.kind(),
        period: request.period,
        bundles,
        stats,
    })
}

/// Processes every upload on a bounded pool, keeping upload order.
fn process_uploads(
    service: &RedactionService,
    request: &BatchRequest,
    started: Instant,
) -> RedactorResult<Vec<DocumentOutcome>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(request.options.workers)
        .build()
        .map_err(|e| RedactorError::invalid_input("workers", e.to_string()))?;

    let total = request.uploads.len();
    let done = AtomicUsize::new(0);

    pool.install(|| {
        request
            .uploads
            .par_iter()
            .map(|upload| -> RedactorResult<DocumentOutcome> {
                let outcome = service
                    .process_document(&upload.bytes, &request.roster)
                    .map_err(|e| with_file_name(e, &upload.name))?;

                let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                let remaining = estimate_remaining(started.elapsed(), finished, total);
                info!(
                    "Processed {} ({}/{}, {} page(s)), about {}s remaining",
                    upload.name,
                    finished,
                    total,
                    outcome.pages,
                    remaining.as_secs()
                );
                Ok(outcome)
            })
            .collect()
    })
}

/// Linear estimate of the time left after `done` of `total` items.
pub fn estimate_remaining(elapsed: Duration, done: usize, total: usize) -> Duration {
    if done == 0 || done >= total {
        return Duration::ZERO;
    }
    elapsed / done as u32 * (total - done) as u32
}

fn with_file_name(err: RedactorError, name: &str) -> RedactorError {
    match err {
        RedactorError::PdfProcessing {
            message,
            page,
            source,
        } => RedactorError::PdfProcessing {
            message: format!("{name}: {message}"),
            page,
            source,
        },
        other => other,
    }
}
