//! Pure crop and rotation geometry.
//!
//! All functions here are pure and testable without any pixels or I/O: they
//! take rectangles, pointer coordinates, and image bounds, and return
//! rectangles. The pixel work they describe lives in
//! [`pipeline`](crate::pipeline).
//!
//! # The crop-rect contract
//!
//! Every rectangle produced by this module satisfies three conditions, which
//! the rest of the engine relies on:
//!
//! 1. Both edges are at least [`CROP_MIN_SIZE`] pixels (as far as the image
//!    bounds allow).
//! 2. The rectangle lies fully inside the image bounds.
//! 3. When an aspect ratio is locked, `width / height` matches it within
//!    [`RATIO_TOLERANCE`].

use serde::{Deserialize, Serialize};

/// Minimum crop rectangle edge, in image pixels.
pub const CROP_MIN_SIZE: f64 = 50.0;

/// Pointer-to-anchor distance below which a drag grabs a handle.
pub const HANDLE_HIT_RADIUS: f64 = 10.0;

/// Allowed drift when checking a locked aspect ratio.
pub const RATIO_TOLERANCE: f64 = 0.01;

/// Fraction of the constraining image dimension covered by a freshly
/// enabled crop rectangle.
const INITIAL_COVERAGE: f64 = 0.8;

/// An axis-aligned crop rectangle in image pixel coordinates.
///
/// Coordinates are `f64` because the rectangle tracks pointer positions
/// during a drag; it is rounded to whole pixels only when the crop is
/// applied to a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Y coordinate of the bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether the point lies inside the rectangle (edges inclusive).
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Whether the rectangle lies fully inside `bounds`.
    pub fn is_within(&self, bounds: (u32, u32)) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.right() <= bounds.0 as f64
            && self.bottom() <= bounds.1 as f64
    }

    /// Whether both edges meet the minimum crop size.
    pub fn meets_minimum(&self) -> bool {
        self.width >= CROP_MIN_SIZE && self.height >= CROP_MIN_SIZE
    }

    /// Whether `width / height` matches `ratio` within tolerance.
    pub fn matches_ratio(&self, ratio: f64) -> bool {
        self.height > 0.0 && (self.width / self.height - ratio).abs() <= RATIO_TOLERANCE
    }
}

/// One of the eight resize anchors on a crop rectangle: four corners plus
/// four edge midpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    Nw,
    Ne,
    Sw,
    Se,
    N,
    S,
    W,
    E,
}

impl Handle {
    /// Every handle, in hit-testing priority order (corners first).
    pub const ALL: [Handle; 8] = [
        Handle::Nw,
        Handle::Ne,
        Handle::Sw,
        Handle::Se,
        Handle::N,
        Handle::S,
        Handle::W,
        Handle::E,
    ];

    /// Stable compass-point name (`nw`, `ne`, ...) used by shells and in
    /// the persisted tool state.
    pub fn name(self) -> &'static str {
        match self {
            Handle::Nw => "nw",
            Handle::Ne => "ne",
            Handle::Sw => "sw",
            Handle::Se => "se",
            Handle::N => "n",
            Handle::S => "s",
            Handle::W => "w",
            Handle::E => "e",
        }
    }

    pub fn from_name(name: &str) -> Option<Handle> {
        Handle::ALL.into_iter().find(|h| h.name() == name)
    }

    /// Anchor position on `rect` (corner or edge midpoint).
    pub fn anchor(self, rect: &CropRect) -> (f64, f64) {
        let (cx, cy) = rect.center();
        match self {
            Handle::Nw => (rect.x, rect.y),
            Handle::Ne => (rect.right(), rect.y),
            Handle::Sw => (rect.x, rect.bottom()),
            Handle::Se => (rect.right(), rect.bottom()),
            Handle::N => (cx, rect.y),
            Handle::S => (cx, rect.bottom()),
            Handle::W => (rect.x, cy),
            Handle::E => (rect.right(), cy),
        }
    }

    fn moves_west_edge(self) -> bool {
        matches!(self, Handle::Nw | Handle::Sw | Handle::W)
    }

    fn moves_east_edge(self) -> bool {
        matches!(self, Handle::Ne | Handle::Se | Handle::E)
    }

    fn moves_north_edge(self) -> bool {
        matches!(self, Handle::Nw | Handle::Ne | Handle::N)
    }

    fn moves_south_edge(self) -> bool {
        matches!(self, Handle::Sw | Handle::Se | Handle::S)
    }

    /// East/west midpoint handles drive width; everything else drives height
    /// when an aspect ratio is locked.
    fn drives_width(self) -> bool {
        matches!(self, Handle::E | Handle::W)
    }
}

/// What a pointer-down over the crop area grabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Near a resize anchor: the drag resizes.
    Handle(Handle),
    /// Inside the rectangle but away from every anchor: the drag moves.
    Interior,
}

/// Hit-test a pointer position against a crop rectangle.
///
/// A position within [`HANDLE_HIT_RADIUS`] (Euclidean) of an anchor grabs
/// that handle; a position inside the rectangle starts a move; anything else
/// is a miss.
pub fn hit_test(px: f64, py: f64, rect: &CropRect) -> Option<HitTarget> {
    for handle in Handle::ALL {
        let (hx, hy) = handle.anchor(rect);
        if ((px - hx).powi(2) + (py - hy).powi(2)).sqrt() < HANDLE_HIT_RADIUS {
            return Some(HitTarget::Handle(handle));
        }
    }
    if rect.contains(px, py) {
        return Some(HitTarget::Interior);
    }
    None
}

/// Direction of a 90° rotation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Left,
    Right,
}

/// Accumulated rotation after one more 90° step, in degrees within 0..360.
pub fn rotation_after(rotation: u16, direction: RotateDirection) -> u16 {
    match direction {
        RotateDirection::Left => (rotation + 270) % 360,
        RotateDirection::Right => (rotation + 90) % 360,
    }
}

/// The centered rectangle shown when the crop tool is first enabled.
///
/// With a locked ratio the rectangle covers 80% of whichever image dimension
/// constrains it; without one it is a centered square over 80% of the shorter
/// edge.
pub fn initial_crop_rect(bounds: (u32, u32), ratio: Option<f64>) -> CropRect {
    let bw = bounds.0 as f64;
    let bh = bounds.1 as f64;

    let (width, height) = match ratio {
        Some(q) if bh > 0.0 && bw / bh > q => {
            let h = bh * INITIAL_COVERAGE;
            (h * q, h)
        }
        Some(q) => {
            let w = bw * INITIAL_COVERAGE;
            (w, if q > 0.0 { w / q } else { w })
        }
        None => {
            let side = bw.min(bh) * INITIAL_COVERAGE;
            (side, side)
        }
    };

    CropRect::new((bw - width) / 2.0, (bh - height) / 2.0, width, height)
}

/// Recompute a crop rectangle from a handle drag.
///
/// The steps, in order:
///
/// 1. Clamp the pointer to the image bounds.
/// 2. Move the one or two edges the handle controls to the pointer.
/// 3. With a locked ratio, recompute the non-dragged dimension, anchoring
///    the edge the handle does not move.
/// 4. Enforce the minimum size, growing back from the moving edge.
/// 5. Clamp the whole rectangle into bounds, shrinking if needed.
/// 6. Correct residual ratio drift by shrinking the larger-error dimension.
pub fn resize_crop_rect(
    rect: &CropRect,
    handle: Handle,
    pointer_x: f64,
    pointer_y: f64,
    ratio: Option<f64>,
    bounds: (u32, u32),
) -> CropRect {
    let bw = bounds.0 as f64;
    let bh = bounds.1 as f64;

    let px = pointer_x.clamp(0.0, bw);
    let py = pointer_y.clamp(0.0, bh);

    let mut out = *rect;
    if handle.moves_west_edge() {
        out.width = rect.right() - px;
        out.x = px;
    }
    if handle.moves_east_edge() {
        out.width = px - rect.x;
    }
    if handle.moves_north_edge() {
        out.height = rect.bottom() - py;
        out.y = py;
    }
    if handle.moves_south_edge() {
        out.height = py - rect.y;
    }

    if let Some(q) = ratio.filter(|q| *q > 0.0) {
        if handle.drives_width() {
            // Width was dragged; the rectangle grows/shrinks southwards.
            out.height = out.width / q;
        } else {
            out.width = out.height * q;
            if handle.moves_west_edge() {
                // Keep the east edge (the one the handle doesn't move) fixed.
                out.x = rect.right() - out.width;
            }
        }
    }

    constrain(out, rect, handle, ratio, bounds)
}

/// Translate a rectangle by a pointer delta, clamped inside the bounds.
pub fn translate_within(rect: &CropRect, dx: f64, dy: f64, bounds: (u32, u32)) -> CropRect {
    let bw = bounds.0 as f64;
    let bh = bounds.1 as f64;
    CropRect {
        x: (rect.x + dx).clamp(0.0, (bw - rect.width).max(0.0)),
        y: (rect.y + dy).clamp(0.0, (bh - rect.height).max(0.0)),
        ..*rect
    }
}

/// Shrink a rectangle about its center to a new aspect ratio.
///
/// Used when the locked ratio changes while the crop tool is active: the
/// larger dimension gives way so the rectangle never grows.
pub fn refit_to_ratio(rect: &CropRect, ratio: f64, bounds: (u32, u32)) -> CropRect {
    if ratio <= 0.0 || rect.height <= 0.0 {
        return *rect;
    }
    let (cx, cy) = rect.center();
    let (width, height) = if rect.width / rect.height > ratio {
        (rect.height * ratio, rect.height)
    } else {
        (rect.width, rect.width / ratio)
    };
    let refit = CropRect::new(cx - width / 2.0, cy - height / 2.0, width, height);
    constrain(refit, rect, Handle::Se, Some(ratio), bounds)
}

/// Clamp an arbitrary rectangle to the crop-rect contract.
///
/// Entry point for callers that construct rectangles directly (session
/// restore, CLI arguments) rather than via a drag.
pub fn sanitize(rect: &CropRect, ratio: Option<f64>, bounds: (u32, u32)) -> CropRect {
    constrain(*rect, rect, Handle::Se, ratio, bounds)
}

/// Steps 4–6 of the resize solve: minimum size, bounds, residual ratio.
///
/// `prev` is the rectangle before the drag — minimum-size enforcement grows
/// back towards the edge that was not moving.
fn constrain(
    mut out: CropRect,
    prev: &CropRect,
    handle: Handle,
    ratio: Option<f64>,
    bounds: (u32, u32),
) -> CropRect {
    let bw = bounds.0 as f64;
    let bh = bounds.1 as f64;
    let (min_w, min_h) = min_dimensions(ratio, bw, bh);

    if out.width < min_w {
        if handle.moves_west_edge() {
            out.x = prev.right() - min_w;
        }
        out.width = min_w;
    }
    if out.height < min_h {
        if handle.moves_north_edge() {
            out.y = prev.bottom() - min_h;
        }
        out.height = min_h;
    }
    out.width = out.width.min(bw);
    out.height = out.height.min(bh);

    // The minimums above are ratio-consistent, so shrinking the larger-error
    // dimension cannot fall below them.
    if let Some(q) = ratio.filter(|q| *q > 0.0)
        && out.height > 0.0
        && (out.width / out.height - q).abs() > RATIO_TOLERANCE
    {
        if out.width / out.height > q {
            out.width = out.height * q;
        } else {
            out.height = out.width / q;
        }
        out.width = out.width.min(bw);
        out.height = out.height.min(bh);
    }

    out.x = out.x.clamp(0.0, (bw - out.width).max(0.0));
    out.y = out.y.clamp(0.0, (bh - out.height).max(0.0));
    out
}

/// Smallest legal dimensions: [`CROP_MIN_SIZE`] on the shorter edge, scaled
/// up on the other edge when a ratio is locked, capped by the image bounds.
fn min_dimensions(ratio: Option<f64>, bw: f64, bh: f64) -> (f64, f64) {
    let (min_w, min_h) = match ratio {
        Some(q) if q >= 1.0 => (CROP_MIN_SIZE * q, CROP_MIN_SIZE),
        Some(q) if q > 0.0 => (CROP_MIN_SIZE, CROP_MIN_SIZE / q),
        _ => (CROP_MIN_SIZE, CROP_MIN_SIZE),
    };
    (min_w.min(bw), min_h.min(bh))
}
