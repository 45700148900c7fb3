//! Square annotations written with lopdf.
//!
//! Each annotation carries its own appearance stream so viewers render the
//! fill and opacity exactly, instead of synthesizing a default look.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::geometry::{visible_box, PageFrame, Rect};
use crate::error::{RedactorError, RedactorResult};

/// Annotation flag making the annotation read-only in conforming viewers.
pub const ANNOT_FLAG_READ_ONLY: i64 = 64;

/// What an annotation means for the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationRole {
    /// Matching identifier, yellow
    Highlight,
    /// Matching identifier left readable during a masking pass
    Reveal,
    /// Non-matching region, opaque gray
    Mask,
    /// Occurrence of the unit's own name
    UnitLabel,
}

impl AnnotationRole {
    /// Returns true if this annotation counts towards the mask total.
    pub fn is_mask(self) -> bool {
        matches!(self, Self::Mask)
    }
}

/// Visual treatment of an annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotationStyle {
    pub stroke: [f32; 3],
    pub fill: [f32; 3],
    pub opacity: f32,
    pub border_width: f32,
    pub read_only: bool,
}

impl AnnotationStyle {
    pub const YELLOW: [f32; 3] = [1.0, 1.0, 0.0];
    pub const WHITE: [f32; 3] = [1.0, 1.0, 1.0];
    pub const GRAY: [f32; 3] = [0.5, 0.5, 0.5];
    pub const BLUE: [f32; 3] = [0.0, 0.0, 1.0];

    /// Solid box with the same stroke and fill color.
    pub const fn solid(color: [f32; 3], opacity: f32, read_only: bool) -> Self {
        Self {
            stroke: color,
            fill: color,
            opacity,
            border_width: 1.0,
            read_only,
        }
    }

    pub const fn highlight() -> Self {
        Self::solid(Self::YELLOW, 0.3, true)
    }

    pub const fn reveal() -> Self {
        Self::solid(Self::WHITE, 0.3, true)
    }

    pub const fn mask() -> Self {
        Self::solid(Self::GRAY, 1.0, true)
    }
}

/// A rectangle to draw on a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Annotation {
    pub rect: Rect,
    pub role: AnnotationRole,
    pub style: AnnotationStyle,
}

impl Annotation {
    pub fn new(rect: Rect, role: AnnotationRole, style: AnnotationStyle) -> Self {
        Self { rect, role, style }
    }

    pub fn highlight(rect: Rect) -> Self {
        Self::new(rect, AnnotationRole::Highlight, AnnotationStyle::highlight())
    }

    pub fn reveal(rect: Rect) -> Self {
        Self::new(rect, AnnotationRole::Reveal, AnnotationStyle::reveal())
    }

    pub fn mask(rect: Rect) -> Self {
        Self::new(rect, AnnotationRole::Mask, AnnotationStyle::mask())
    }
}

/// Reads the frame of a page, following inherited `MediaBox`/`CropBox`/`Rotate`.
pub fn page_frame(doc: &Document, page_id: ObjectId) -> RedactorResult<PageFrame> {
    let media_box = page_box(doc, page_id, b"MediaBox");
    let crop_box = page_box(doc, page_id, b"CropBox");
    let rotation = inherited(doc, page_id, b"Rotate")
        .and_then(|obj| resolve(doc, obj).as_i64().ok())
        .unwrap_or(0);

    match media_box {
        Some(media) => Ok(PageFrame::new(visible_box(media, crop_box), rotation)),
        None => Ok(PageFrame {
            rotation: PageFrame::new([0.0; 4], rotation).rotation,
            ..PageFrame::default()
        }),
    }
}

fn page_box(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<[f32; 4]> {
    let arr = inherited(doc, page_id, key).and_then(|obj| resolve(doc, obj).as_array().ok())?;
    let nums: Vec<f32> = arr.iter().filter_map(number).collect();
    (nums.len() == 4).then(|| [nums[0], nums[1], nums[2], nums[3]])
}

/// Looks a key up on the page, then on its ancestors.
pub(crate) fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;
    // Page trees deeper than this are malformed.
    for _ in 0..64 {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Appends the annotations to a page of `doc`.
pub fn add_annotations(
    doc: &mut Document,
    page_id: ObjectId,
    annotations: &[Annotation],
) -> RedactorResult<usize> {
    if annotations.is_empty() {
        return Ok(0);
    }
    let frame = page_frame(doc, page_id)?;

    let mut refs = Vec::with_capacity(annotations.len());
    for annotation in annotations {
        let rect = frame.to_user_space(&annotation.rect);
        let appearance = doc.add_object(appearance_stream(&rect, &annotation.style));
        let annot_id =
            doc.add_object(annotation_dict(page_id, &rect, &annotation.style, appearance));
        refs.push(Object::Reference(annot_id));
    }

    let existing = doc
        .get_dictionary(page_id)
        .map_err(|e| RedactorError::pdf("Page is not a dictionary", e))?
        .get(b"Annots")
        .ok()
        .cloned();

    match existing {
        Some(Object::Reference(array_id)) => {
            let array = doc
                .get_object_mut(array_id)
                .and_then(Object::as_array_mut)
                .map_err(|e| RedactorError::pdf("Annots is not an array", e))?;
            array.extend(refs);
        }
        Some(Object::Array(mut array)) => {
            array.extend(refs);
            set_page_entry(doc, page_id, "Annots", Object::Array(array))?;
        }
        _ => set_page_entry(doc, page_id, "Annots", Object::Array(refs))?,
    }

    Ok(annotations.len())
}

fn set_page_entry(
    doc: &mut Document,
    page_id: ObjectId,
    key: &str,
    value: Object,
) -> RedactorResult<()> {
    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| RedactorError::pdf("Page is not a dictionary", e))?
        .set(key, value);
    Ok(())
}

fn color(rgb: [f32; 3]) -> Object {
    Object::Array(rgb.iter().map(|&c| Object::Real(c.into())).collect())
}

fn annotation_dict(
    page_id: ObjectId,
    rect: &Rect,
    style: &AnnotationStyle,
    appearance: ObjectId,
) -> Dictionary {
    let flags = if style.read_only { ANNOT_FLAG_READ_ONLY } else { 0 };
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Square",
        "Rect" => vec![
            Object::Real(rect.x0.into()),
            Object::Real(rect.y0.into()),
            Object::Real(rect.x1.into()),
            Object::Real(rect.y1.into()),
        ],
        "P" => page_id,
        "C" => color(style.stroke),
        "IC" => color(style.fill),
        "CA" => Object::Real(style.opacity.into()),
        "F" => flags,
        "Border" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(style.border_width.into()),
        ],
        "BS" => dictionary! { "W" => Object::Real(style.border_width.into()) },
        "AP" => dictionary! { "N" => appearance },
    }
}

fn appearance_stream(rect: &Rect, style: &AnnotationStyle) -> Stream {
    let (w, h) = (rect.width().max(0.0), rect.height().max(0.0));
    let half = style.border_width / 2.0;
    let [sr, sg, sb] = style.stroke;
    let [fr, fg, fb] = style.fill;
    let content = format!(
        "q /GS0 gs {fr:.3} {fg:.3} {fb:.3} rg {sr:.3} {sg:.3} {sb:.3} RG {bw:.2} w \
         {half:.2} {half:.2} {iw:.2} {ih:.2} re B Q",
        bw = style.border_width,
        iw = (w - style.border_width).max(0.0),
        ih = (h - style.border_width).max(0.0),
    );
    let opacity = Object::Real(style.opacity.into());
    let resources = dictionary! {
        "ExtGState" => dictionary! {
            "GS0" => dictionary! {
                "Type" => "ExtGState",
                "CA" => opacity.clone(),
                "ca" => opacity,
            },
        },
    };
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(w.into()),
                Object::Real(h.into()),
            ],
            "Resources" => resources,
        },
        content.into_bytes(),
    )
}
