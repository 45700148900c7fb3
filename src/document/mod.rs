//! PDF access: word extraction, annotation writing and page reassembly.
//!
//! MuPDF reads text, lopdf writes. The two never share a document handle;
//! they only exchange page-space rectangles.

pub mod annotation;
pub mod assemble;
pub mod geometry;
pub mod text;

pub use annotation::{add_annotations, page_frame, Annotation, AnnotationRole, AnnotationStyle};
pub use assemble::{
    build_unit_document, load_document, merge_documents, save_document, PagePlan,
};
pub use geometry::{EdgeOffsets, PageFrame, Rect};
pub use text::{extract_pages, PageText, Word};
