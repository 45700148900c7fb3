//! PDF inspection helpers.

use anyhow::{Context, Result};
use lopdf::{Document, Object};

use unit_redactor::document::extract_pages;

/// Loads a PDF from memory.
pub fn load_pdf(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).context("Failed to load PDF")
}

/// Number of pages of a PDF held in memory.
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    Ok(load_pdf(bytes)?.get_pages().len())
}

/// Number of annotations on each page, in page order.
pub fn annotations_per_page(bytes: &[u8]) -> Result<Vec<usize>> {
    let doc = load_pdf(bytes)?;
    let mut counts = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let page = doc.get_dictionary(page_id)?;
        let count = match page.get(b"Annots") {
            Ok(Object::Array(items)) => items.len(),
            Ok(Object::Reference(id)) => doc.get_object(*id)?.as_array()?.len(),
            _ => 0,
        };
        counts.push(count);
    }
    Ok(counts)
}

/// Words of every page as plain strings.
pub fn page_words(bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let pages = extract_pages(bytes, &[])
        .map_err(|e| anyhow::anyhow!("Failed to extract words: {e}"))?;
    Ok(pages
        .into_iter()
        .map(|page| page.words.into_iter().map(|w| w.text).collect())
        .collect())
}

/// Whether any page of the PDF contains `word`.
pub fn pdf_contains_word(bytes: &[u8], word: &str) -> Result<bool> {
    Ok(page_words(bytes)?.iter().flatten().any(|w| w == word))
}

/// Validates that a PDF is loadable and has at least one page.
pub fn is_valid_pdf(bytes: &[u8]) -> bool {
    load_pdf(bytes)
        .map(|doc| !doc.get_pages().is_empty())
        .unwrap_or(false)
}

/// Sets `/CropBox` on every page of a PDF held in memory.
pub fn with_crop_box(bytes: &[u8], crop: [f32; 4]) -> Result<Vec<u8>> {
    let mut doc = load_pdf(bytes)?;
    let page_ids: Vec<_> = doc.get_pages().into_values().collect();
    for page_id in page_ids {
        let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
        page.set(
            "CropBox",
            Object::Array(crop.iter().map(|&v| Object::Real(v.into())).collect()),
        );
    }
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

/// `/Rect` of every annotation, per page in page order.
pub fn annotation_rects(bytes: &[u8]) -> Result<Vec<Vec<[f32; 4]>>> {
    let doc = load_pdf(bytes)?;
    let mut pages = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let page = doc.get_dictionary(page_id)?;
        let refs = match page.get(b"Annots") {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => doc.get_object(*id)?.as_array()?.clone(),
            _ => Vec::new(),
        };
        let mut rects = Vec::new();
        for item in refs {
            let annot = doc.get_dictionary(item.as_reference()?)?;
            let nums: Vec<f32> = annot
                .get(b"Rect")?
                .as_array()?
                .iter()
                .filter_map(|n| match n {
                    Object::Integer(i) => Some(*i as f32),
                    Object::Real(r) => Some(*r as f32),
                    _ => None,
                })
                .collect();
            if nums.len() == 4 {
                rects.push([nums[0], nums[1], nums[2], nums[3]]);
            }
        }
        pages.push(rects);
    }
    Ok(pages)
}

/// Whether any rectangle contains the user-space point `(x, y)`.
pub fn covers(rects: &[[f32; 4]], x: f32, y: f32) -> bool {
    rects
        .iter()
        .any(|r| r[0] <= x && x <= r[2] && r[1] <= y && y <= r[3])
}
