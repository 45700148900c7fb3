//! Per-unit document reassembly.
//!
//! A unit's document is a copy of the source keeping only the planned pages,
//! in source order, with that unit's annotations attached. Documents built
//! from several uploads are then merged into one by importing objects under
//! shifted ids.

use std::collections::BTreeMap;

use lopdf::{Document, Object, ObjectId};

use super::annotation::{add_annotations, inherited, Annotation};
use crate::error::{RedactorError, RedactorResult};

/// Page attributes a page may inherit from its ancestors.
const INHERITABLE_KEYS: [&str; 4] = ["MediaBox", "CropBox", "Resources", "Rotate"];

/// A page to keep and what to draw on it.
#[derive(Debug, Clone, Default)]
pub struct PagePlan {
    /// Zero-based page number in the source
    pub index: usize,
    pub annotations: Vec<Annotation>,
}

impl PagePlan {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            annotations: Vec::new(),
        }
    }
}

/// Loads a PDF with lopdf.
pub fn load_document(bytes: &[u8]) -> RedactorResult<Document> {
    Document::load_mem(bytes).map_err(|e| RedactorError::pdf("Failed to parse PDF", e))
}

/// Builds the document for one unit from one source.
///
/// `plans` are applied in page order regardless of their order in the
/// slice; a page listed twice is kept once with both annotation sets.
pub fn build_unit_document(source: &Document, plans: &[PagePlan]) -> RedactorResult<Document> {
    if plans.is_empty() {
        return Err(RedactorError::invalid_input(
            "pages",
            "a unit document needs at least one page",
        ));
    }

    let mut doc = source.clone();
    let pages = doc.get_pages();

    let mut selected: BTreeMap<u32, Vec<Annotation>> = BTreeMap::new();
    for plan in plans {
        let number = plan.index as u32 + 1;
        if !pages.contains_key(&number) {
            return Err(RedactorError::PdfProcessing {
                message: format!("document has {} page(s)", pages.len()),
                page: Some(plan.index + 1),
                source: None,
            });
        }
        selected
            .entry(number)
            .or_default()
            .extend(plan.annotations.iter().copied());
    }

    let mut kept = Vec::with_capacity(selected.len());
    for (number, annotations) in &selected {
        let page_id = pages[number];
        flatten_inherited(&mut doc, page_id)?;
        add_annotations(&mut doc, page_id, annotations).map_err(|e| match e {
            RedactorError::PdfProcessing { message, source, .. } => RedactorError::PdfProcessing {
                message,
                page: Some(*number as usize),
                source,
            },
            other => other,
        })?;
        kept.push(page_id);
    }

    set_page_tree(&mut doc, &kept)?;
    doc.prune_objects();
    Ok(doc)
}

/// Merges documents in order into the first one.
pub fn merge_documents(documents: Vec<Document>) -> RedactorResult<Document> {
    let mut documents = documents.into_iter();
    let mut dest = documents.next().ok_or_else(|| {
        RedactorError::invalid_input("documents", "no documents to merge")
    })?;

    let mut page_refs: Vec<ObjectId> = dest.get_pages().values().copied().collect();
    let mut max_id = dest.max_id;

    for source in documents {
        let source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();
        let offset = max_id;

        for (old_id, object) in source.objects {
            dest.objects
                .insert((old_id.0 + offset, old_id.1), remap_refs(object, offset));
        }
        page_refs.extend(source_pages.iter().map(|id| (id.0 + offset, id.1)));
        max_id = max_id.max(source.max_id + offset);
    }

    dest.max_id = max_id;
    set_page_tree(&mut dest, &page_refs)?;
    dest.prune_objects();
    Ok(dest)
}

/// Serializes a document to bytes.
pub fn save_document(doc: &mut Document) -> RedactorResult<Vec<u8>> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| RedactorError::pdf("Failed to save PDF", e))?;
    Ok(buffer)
}

/// Copies inherited attributes onto the page so it survives reparenting.
fn flatten_inherited(doc: &mut Document, page_id: ObjectId) -> RedactorResult<()> {
    let mut missing = Vec::new();
    {
        let page = doc
            .get_dictionary(page_id)
            .map_err(|e| RedactorError::pdf("Page is not a dictionary", e))?;
        for key in INHERITABLE_KEYS {
            if page.has(key.as_bytes()) {
                continue;
            }
            if let Some(value) = inherited(doc, page_id, key.as_bytes()) {
                missing.push((key, value.clone()));
            }
        }
    }

    if missing.is_empty() {
        return Ok(());
    }
    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| RedactorError::pdf("Page is not a dictionary", e))?;
    for (key, value) in missing {
        page.set(key, value);
    }
    Ok(())
}

/// Points the root page tree node at exactly `page_refs`.
fn set_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> RedactorResult<()> {
    let pages_id = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(|e| RedactorError::pdf("Document has no page tree", e))?;

    let pages = doc
        .get_object_mut(pages_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| RedactorError::pdf("Invalid pages dictionary", e))?;
    pages.set(
        "Kids",
        Object::Array(page_refs.iter().map(|&id| Object::Reference(id)).collect()),
    );
    pages.set("Count", Object::Integer(page_refs.len() as i64));

    for &page_id in page_refs {
        if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }
    Ok(())
}

fn remap_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => {
            Object::Array(arr.into_iter().map(|o| remap_refs(o, offset)).collect())
        }
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
