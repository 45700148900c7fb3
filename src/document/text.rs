//! Word extraction using MuPDF.
//!
//! MuPDF's structured text gives glyph quads per line. Words are the
//! whitespace-separated runs of a line and their box is the union of their
//! glyph quads, the same tokens a "words" dump of the page would list.

use std::collections::HashMap;
use std::sync::Mutex;

use mupdf::{Document, Page, Quad, TextPageOptions};

use super::geometry::Rect;
use crate::error::{RedactorError, RedactorResult};

/// Maximum search hits per unit name per page.
const MAX_LABEL_HITS: u32 = 256;

// MuPDF font loading races when several documents are opened at once.
static MUPDF_LOCK: Mutex<()> = Mutex::new(());

/// A word token and its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub rect: Rect,
}

impl Word {
    pub fn new(text: impl Into<String>, rect: Rect) -> Self {
        Self {
            text: text.into(),
            rect,
        }
    }
}

/// Text layer of one page.
#[derive(Debug, Clone, Default)]
pub struct PageText {
    /// Zero-based page number
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub words: Vec<Word>,
    /// Hits of each searched literal on this page
    pub labels: HashMap<String, Vec<Rect>>,
}

impl PageText {
    pub fn label_hits(&self, needle: &str) -> &[Rect] {
        self.labels.get(needle).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Extracts words from every page and searches each page for `needles`.
pub fn extract_pages(bytes: &[u8], needles: &[&str]) -> RedactorResult<Vec<PageText>> {
    let _guard = MUPDF_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let doc = Document::from_bytes(bytes, "application/pdf")
        .map_err(|e| RedactorError::pdf("Failed to open PDF with MuPDF", e))?;
    let page_count = doc
        .page_count()
        .map_err(|e| RedactorError::pdf("Failed to get page count", e))?;

    let mut pages = Vec::with_capacity(page_count.max(0) as usize);
    for page_idx in 0..page_count {
        let page = doc.load_page(page_idx).map_err(|e| {
            RedactorError::on_page(
                format!("Failed to load page {}", page_idx + 1),
                page_idx as usize + 1,
                e,
            )
        })?;
        pages.push(read_page(&page, page_idx as usize, needles)?);
    }

    Ok(pages)
}

fn read_page(page: &Page, index: usize, needles: &[&str]) -> RedactorResult<PageText> {
    let page_no = index + 1;
    let bounds = page
        .bounds()
        .map_err(|e| RedactorError::on_page("Failed to get page bounds", page_no, e))?;

    let text_page = page
        .to_text_page(TextPageOptions::empty())
        .map_err(|e| RedactorError::on_page("Failed to build text page", page_no, e))?;

    let mut words = Vec::new();
    for block in text_page.blocks() {
        for line in block.lines() {
            let mut builder = WordBuilder::default();
            for ch in line.chars() {
                match ch.char() {
                    Some(c) if !c.is_whitespace() => builder.push(c, quad_points(&ch.quad())),
                    _ => builder.finish(&mut words),
                }
            }
            builder.finish(&mut words);
        }
    }

    let mut labels = HashMap::new();
    for needle in needles {
        if needle.is_empty() || labels.contains_key(*needle) {
            continue;
        }
        let hits = page
            .search(needle, MAX_LABEL_HITS)
            .map_err(|e| {
                RedactorError::on_page(format!("Search failed for '{needle}'"), page_no, e)
            })?;
        let rects: Vec<Rect> = hits
            .into_iter()
            .filter_map(|quad| Rect::from_points(&quad_points(&quad)))
            .collect();
        if !rects.is_empty() {
            labels.insert(needle.to_string(), rects);
        }
    }

    Ok(PageText {
        index,
        width: bounds.x1 - bounds.x0,
        height: bounds.y1 - bounds.y0,
        words,
        labels,
    })
}

fn quad_points(quad: &Quad) -> [(f32, f32); 4] {
    [
        (quad.ul.x, quad.ul.y),
        (quad.ur.x, quad.ur.y),
        (quad.ll.x, quad.ll.y),
        (quad.lr.x, quad.lr.y),
    ]
}

/// Accumulates glyphs of the current word.
#[derive(Default)]
struct WordBuilder {
    text: String,
    points: Vec<(f32, f32)>,
}

impl WordBuilder {
    fn push(&mut self, c: char, points: [(f32, f32); 4]) {
        self.text.push(c);
        self.points.extend_from_slice(&points);
    }

    fn finish(&mut self, out: &mut Vec<Word>) {
        if self.text.is_empty() {
            return;
        }
        if let Some(rect) = Rect::from_points(&self.points) {
            out.push(Word::new(std::mem::take(&mut self.text), rect));
        }
        self.text.clear();
        self.points.clear();
    }
}
