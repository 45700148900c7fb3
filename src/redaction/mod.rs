//! Per-document redaction and the batch pipeline around it.
//!
//! [`RedactionService`] turns one uploaded statement into one annotated
//! document per unit. [`batch`] runs it over every upload on a worker pool
//! and packages the per-unit results.

pub mod batch;
pub mod layout;
pub mod selection;

pub use batch::{
    check_duplicates, run_batch, BatchOutcome, BatchRequest, BatchStats, UnitBundle, Upload,
};
pub use layout::{layout_for, AnnotationLayout, OffsetLayout, PageMarkup, RowBandLayout};
pub use selection::{keep_page, select_pages};

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use lopdf::Document;
use tracing::debug;

use crate::document::{build_unit_document, extract_pages, load_document, PagePlan};
use crate::domain::Roster;
use crate::error::{RedactorError, RedactorResult};

/// Worker count used when none is configured.
pub const DEFAULT_WORKERS: usize = 4;

/// Visual treatment applied to a unit's pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskingMode {
    /// Only matches are annotated
    Highlight,
    /// Matches stay readable, everything else is covered
    #[default]
    Mask,
}

impl fmt::Display for MaskingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Highlight => "highlight",
            Self::Mask => "mask",
        })
    }
}

impl FromStr for MaskingMode {
    type Err = RedactorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "highlight" | "highlight-relevant" => Ok(Self::Highlight),
            "mask" | "mask-all" => Ok(Self::Mask),
            other => Err(RedactorError::invalid_input(
                "mode",
                format!("unknown masking mode '{other}' (expected highlight or mask)"),
            )),
        }
    }
}

/// Which pages go into a unit's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSelection {
    #[default]
    All,
    /// First, last and matching pages only
    Relevant,
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Relevant => "relevant",
        })
    }
}

impl FromStr for PageSelection {
    type Err = RedactorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "relevant" => Ok(Self::Relevant),
            other => Err(RedactorError::invalid_input(
                "pages",
                format!("unknown page selection '{other}' (expected all or relevant)"),
            )),
        }
    }
}

/// Knobs of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingOptions {
    pub mode: MaskingMode,
    pub pages: PageSelection,
    pub workers: usize,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            mode: MaskingMode::default(),
            pages: PageSelection::default(),
            workers: DEFAULT_WORKERS,
        }
    }
}

/// One unit's share of a single upload.
#[derive(Debug, Clone)]
pub struct UnitDocument {
    pub unit: String,
    pub document: Document,
    pub matched: BTreeSet<String>,
}

/// Everything produced from one upload.
#[derive(Debug, Clone, Default)]
pub struct DocumentOutcome {
    pub pages: usize,
    pub highlights: usize,
    pub masks: usize,
    /// Units in roster order; units left without pages are absent
    pub units: Vec<UnitDocument>,
}

/// Applies a layout to statements for every unit of a roster.
pub struct RedactionService {
    layout: Box<dyn AnnotationLayout>,
    options: ProcessingOptions,
}

impl RedactionService {
    /// Creates a service with the given layout.
    pub fn new(layout: Box<dyn AnnotationLayout>, options: ProcessingOptions) -> Self {
        Self { layout, options }
    }

    /// Creates a service with the layout of the roster's statement kind.
    pub fn for_roster(roster: &Roster, options: ProcessingOptions) -> Self {
        Self::new(layout_for(roster.kind()), options)
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Splits one statement into annotated per-unit documents.
    pub fn process_document(
        &self,
        bytes: &[u8],
        roster: &Roster,
    ) -> RedactorResult<DocumentOutcome> {
        let needles = layout::label_needles(self.layout.as_ref(), roster.units());
        let pages = extract_pages(bytes, &needles)?;
        let source = load_document(bytes)?;

        let page_count = source.get_pages().len();
        if page_count != pages.len() {
            return Err(RedactorError::PdfProcessing {
                message: format!(
                    "text layer has {} page(s) but document has {page_count}",
                    pages.len()
                ),
                page: None,
                source: None,
            });
        }

        let mut outcome = DocumentOutcome {
            pages: page_count,
            ..Default::default()
        };

        for unit in roster.units() {
            let matches: Vec<bool> = pages
                .iter()
                .map(|page| self.layout.page_has_match(page, unit))
                .collect();
            let kept = select_pages(self.options.pages, &matches);
            debug!(
                "Unit '{}': keeping {}/{} page(s) with {} layout",
                unit.name,
                kept.len(),
                page_count,
                self.layout.name()
            );

            let mut matched = BTreeSet::new();
            let mut plans = Vec::with_capacity(kept.len());
            for index in kept {
                let markup = self.layout.annotate(&pages[index], unit, self.options.mode);
                outcome.highlights += markup.highlight_count();
                outcome.masks += markup.mask_count();
                matched.extend(markup.matched);
                plans.push(PagePlan {
                    index,
                    annotations: markup.annotations,
                });
            }

            if plans.is_empty() {
                continue;
            }
            outcome.units.push(UnitDocument {
                unit: unit.name.clone(),
                document: build_unit_document(&source, &plans)?,
                matched,
            });
        }

        Ok(outcome)
    }
}
