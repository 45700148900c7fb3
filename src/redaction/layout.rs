//! Annotation placement per statement layout.
//!
//! Bank statements are tabular with one transaction per text row, so a
//! matching account highlights its whole row. PF and ESIC returns print the
//! identifier at a fixed offset from the rest of the employee's record, so the
//! annotation is the identifier's box grown by per-layout edge offsets.

use std::collections::{BTreeSet, HashSet};

use crate::document::{Annotation, AnnotationRole, AnnotationStyle, EdgeOffsets, PageText, Rect};
use crate::domain::{IdentifierMatcher, StatementKind, UnitTarget};

use super::MaskingMode;

/// Words whose tops differ by less than this share a row.
pub const ROW_TOLERANCE: f32 = 10.0;

/// Header band as a fraction of page height on the first page.
pub const FIRST_PAGE_HEADER_RATIO: f32 = 0.30;

/// Header band as a fraction of page height on later pages.
pub const HEADER_RATIO: f32 = 0.12;

/// Footer starts at this fraction of page height.
pub const FOOTER_RATIO: f32 = 0.95;

/// Padding around a PF identifier covering the member's block.
pub const PF_OFFSETS: EdgeOffsets = EdgeOffsets::new(-5.0, -718.0, 5.0, 38.0);

/// Padding around an ESIC identifier covering the employee's line.
pub const ESIC_OFFSETS: EdgeOffsets = EdgeOffsets::new(-96.0, -5.0, 457.0, 5.0);

/// Annotations for one page and one unit.
#[derive(Debug, Clone, Default)]
pub struct PageMarkup {
    pub annotations: Vec<Annotation>,
    /// Identifiers of the unit found on the page
    pub matched: BTreeSet<String>,
}

impl PageMarkup {
    /// Annotations that mark matches (highlights and reveals).
    pub fn highlight_count(&self) -> usize {
        self.annotations
            .iter()
            .filter(|a| matches!(a.role, AnnotationRole::Highlight | AnnotationRole::Reveal))
            .count()
    }

    pub fn mask_count(&self) -> usize {
        self.annotations.iter().filter(|a| a.role.is_mask()).count()
    }
}

/// Decides where annotations go on a page for a unit.
pub trait AnnotationLayout: Send + Sync {
    /// Computes the annotations of `page` for `unit`.
    fn annotate(&self, page: &PageText, unit: &UnitTarget, mode: MaskingMode) -> PageMarkup;

    /// Matcher deciding which words are identifiers.
    fn matcher(&self) -> &dyn IdentifierMatcher;

    /// Whether unit names must be searched on each page.
    fn labels_units(&self) -> bool;

    /// Returns a human-readable name for this layout.
    fn name(&self) -> &str;

    /// Returns true if any word on the page is one of the unit's identifiers.
    fn page_has_match(&self, page: &PageText, unit: &UnitTarget) -> bool {
        let matcher = self.matcher();
        page.words.iter().any(|w| matcher.matches(&w.text, unit.ids()))
    }
}

/// Picks the layout used for a statement kind.
pub fn layout_for(kind: StatementKind) -> Box<dyn AnnotationLayout> {
    match kind {
        StatementKind::Bank => Box::new(RowBandLayout::new(kind.matcher())),
        StatementKind::Pf => Box::new(OffsetLayout::new(kind.matcher(), PF_OFFSETS)),
        StatementKind::Esic => Box::new(
            OffsetLayout::new(kind.matcher(), ESIC_OFFSETS)
                .with_unit_label(AnnotationStyle::solid(AnnotationStyle::BLUE, 0.3, false)),
        ),
    }
}

/// Row classification of a tabular page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowBand {
    Header,
    Content,
    Footer,
}

/// Highlights whole text rows of tabular statements.
pub struct RowBandLayout {
    matcher: &'static dyn IdentifierMatcher,
    unit_label: AnnotationStyle,
}

impl RowBandLayout {
    pub fn new(matcher: &'static dyn IdentifierMatcher) -> Self {
        Self {
            matcher,
            unit_label: AnnotationStyle::solid(AnnotationStyle::YELLOW, 0.5, true),
        }
    }

    /// Classifies a row rectangle on page `index`.
    pub fn classify(row: &Rect, index: usize, page_height: f32) -> RowBand {
        let ratio = if index == 0 {
            FIRST_PAGE_HEADER_RATIO
        } else {
            HEADER_RATIO
        };
        if row.y0 < page_height * ratio {
            RowBand::Header
        } else if row.y1 > page_height * FOOTER_RATIO {
            RowBand::Footer
        } else {
            RowBand::Content
        }
    }

    /// Union of every word whose top is within tolerance of the word at `idx`.
    pub fn row_of(page: &PageText, idx: usize) -> Rect {
        let anchor = &page.words[idx];
        page.words
            .iter()
            .filter(|w| (w.rect.y0 - anchor.rect.y0).abs() < ROW_TOLERANCE)
            .fold(anchor.rect, |acc, w| acc.union(&w.rect))
    }
}

impl AnnotationLayout for RowBandLayout {
    fn annotate(&self, page: &PageText, unit: &UnitTarget, mode: MaskingMode) -> PageMarkup {
        let mut markup = PageMarkup::default();
        let mut content_rows: Vec<Rect> = Vec::new();
        let mut highlighted: Vec<Rect> = Vec::new();

        for (idx, word) in page.words.iter().enumerate() {
            let row = Self::row_of(page, idx);
            if Self::classify(&row, page.index, page.height) == RowBand::Content
                && !contains_rect(&content_rows, &row)
            {
                content_rows.push(row);
            }

            if self.matcher.matches(&word.text, unit.ids()) {
                markup.matched.insert(word.text.clone());
                highlighted.push(row);
                markup.annotations.push(Annotation::highlight(row));
            }
        }

        for hit in page.label_hits(&unit.name) {
            highlighted.push(*hit);
            markup.annotations.push(Annotation::new(
                *hit,
                AnnotationRole::Highlight,
                self.unit_label,
            ));
        }

        if mode == MaskingMode::Mask {
            markup.annotations.extend(
                content_rows
                    .into_iter()
                    .filter(|row| !contains_rect(&highlighted, row))
                    .map(Annotation::mask),
            );
        }

        markup
    }

    fn matcher(&self) -> &dyn IdentifierMatcher {
        self.matcher
    }

    fn labels_units(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "row-band"
    }
}

/// Pads identifier boxes by fixed edge offsets.
pub struct OffsetLayout {
    matcher: &'static dyn IdentifierMatcher,
    offsets: EdgeOffsets,
    unit_label: Option<AnnotationStyle>,
}

impl OffsetLayout {
    pub fn new(matcher: &'static dyn IdentifierMatcher, offsets: EdgeOffsets) -> Self {
        Self {
            matcher,
            offsets,
            unit_label: None,
        }
    }

    /// Marks every occurrence of the unit name with `style`.
    pub fn with_unit_label(mut self, style: AnnotationStyle) -> Self {
        self.unit_label = Some(style);
        self
    }
}

impl AnnotationLayout for OffsetLayout {
    fn annotate(&self, page: &PageText, unit: &UnitTarget, mode: MaskingMode) -> PageMarkup {
        let mut markup = PageMarkup::default();

        for word in &page.words {
            if !self.matcher.is_candidate(&word.text) {
                continue;
            }
            let rect = word.rect.offset_by(&self.offsets);
            let is_match = unit.contains(&word.text);
            if is_match {
                markup.matched.insert(word.text.clone());
            }
            match (mode, is_match) {
                (MaskingMode::Highlight, true) => {
                    markup.annotations.push(Annotation::highlight(rect))
                }
                (MaskingMode::Highlight, false) => {}
                (MaskingMode::Mask, true) => markup.annotations.push(Annotation::reveal(rect)),
                (MaskingMode::Mask, false) => markup.annotations.push(Annotation::mask(rect)),
            }
        }

        if let Some(style) = self.unit_label {
            markup.annotations.extend(
                page.label_hits(&unit.name)
                    .iter()
                    .map(|hit| Annotation::new(*hit, AnnotationRole::UnitLabel, style)),
            );
        }

        markup
    }

    fn matcher(&self) -> &dyn IdentifierMatcher {
        self.matcher
    }

    fn labels_units(&self) -> bool {
        self.unit_label.is_some()
    }

    fn name(&self) -> &str {
        "word-offset"
    }
}

fn contains_rect(rects: &[Rect], rect: &Rect) -> bool {
    rects.iter().any(|r| r == rect)
}

/// Unit names a layout needs searched, deduplicated in roster order.
pub fn label_needles<'a>(layout: &dyn AnnotationLayout, units: &'a [UnitTarget]) -> Vec<&'a str> {
    if !layout.labels_units() {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    units
        .iter()
        .map(|u| u.name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}
