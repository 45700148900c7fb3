//! Page-space rectangles.
//!
//! All rectangles in this crate live in MuPDF page space: origin at the top
//! left of the visible page, y growing downwards, units in points. They are
//! converted to PDF user space only when an annotation is written.

/// Axis-aligned rectangle in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Grows (or shrinks) each edge by the given deltas.
    pub fn offset_by(&self, offsets: &EdgeOffsets) -> Rect {
        Rect {
            x0: self.x0 + offsets.dx0,
            y0: self.y0 + offsets.dy0,
            x1: self.x1 + offsets.dx1,
            y1: self.y1 + offsets.dy1,
        }
    }

    /// Bounding box of a set of points.
    pub fn from_points(points: &[(f32, f32)]) -> Option<Rect> {
        let (first, rest) = points.split_first()?;
        let seed = Rect::new(first.0, first.1, first.0, first.1);
        Some(rest.iter().fold(seed, |acc, &(x, y)| Rect {
            x0: acc.x0.min(x),
            y0: acc.y0.min(y),
            x1: acc.x1.max(x),
            y1: acc.y1.max(y),
        }))
    }
}

/// Per-edge deltas added to a word box, calibrated per statement layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeOffsets {
    pub dx0: f32,
    pub dy0: f32,
    pub dx1: f32,
    pub dy1: f32,
}

impl EdgeOffsets {
    pub const fn new(dx0: f32, dy0: f32, dx1: f32, dy1: f32) -> Self {
        Self { dx0, dy0, dx1, dy1 }
    }
}

/// Where a page sits in PDF user space.
///
/// Maps page-space rectangles back to the unrotated user space that
/// annotation `/Rect` entries are written in. Page space starts at the
/// top-left corner of the visible box, so a cropped page is offset from its
/// MediaBox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    /// `[x0, y0, x1, y1]` of the visible box (CropBox clipped to MediaBox)
    pub view_box: [f32; 4],
    /// `/Rotate` normalized to 0, 90, 180 or 270
    pub rotation: i64,
}

impl PageFrame {
    pub fn new(view_box: [f32; 4], rotation: i64) -> Self {
        Self {
            view_box,
            rotation: rotation.rem_euclid(360) / 90 * 90,
        }
    }

    /// Converts a page-space rectangle to PDF user space.
    pub fn to_user_space(&self, rect: &Rect) -> Rect {
        let [mx0, my0, mx1, my1] = self.view_box;
        let map = |x: f32, y: f32| -> (f32, f32) {
            match self.rotation {
                90 => (y + mx0, x + my0),
                180 => (mx1 - x, y + my0),
                270 => (mx1 - y, my1 - x),
                _ => (x + mx0, my1 - y),
            }
        };
        let a = map(rect.x0, rect.y0);
        let b = map(rect.x1, rect.y1);
        Rect::new(a.0.min(b.0), a.1.min(b.1), a.0.max(b.0), a.1.max(b.1))
    }
}

/// Normalizes a box so that `x0 <= x1` and `y0 <= y1`.
pub fn normalize_box([x0, y0, x1, y1]: [f32; 4]) -> [f32; 4] {
    [x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1)]
}

/// Part of `crop` inside `media`; `media` when they do not overlap.
pub fn visible_box(media: [f32; 4], crop: Option<[f32; 4]>) -> [f32; 4] {
    let media = normalize_box(media);
    let Some(crop) = crop.map(normalize_box) else {
        return media;
    };
    let clipped = [
        crop[0].max(media[0]),
        crop[1].max(media[1]),
        crop[2].min(media[2]),
        crop[3].min(media[3]),
    ];
    if clipped[2] <= clipped[0] || clipped[3] <= clipped[1] {
        media
    } else {
        clipped
    }
}

impl Default for PageFrame {
    fn default() -> Self {
        Self::new([0.0, 0.0, 612.0, 792.0], 0)
    }
}
