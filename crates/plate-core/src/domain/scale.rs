//! Scale resolver: fits a plate grid inside the available viewport.
//!
//! Given the row/column count of a [`PlateGrid`](super::grid::PlateGrid) and
//! the rectangle the diagram may occupy, the resolver picks:
//!
//! 1. a **geometry profile** (standard or compact, by grid size),
//! 2. the largest **uniform scale** ≤ 1 at which the whole grid fits,
//! 3. the **gaps** between columns and rows, redistributing leftover space.
//!
//! # Why compress row gaps on tall grids? (for beginners)
//!
//! A 9×9 cabinet has eight row gaps.  Keeping the generous default gap would
//! force a tiny cell scale just to leave room for whitespace, and the plate
//! labels would become unreadable.  Recognising a plate's colour and state
//! matters more than the whitespace around it, so grids with more than four
//! rows shrink their row gap (more than six rows shrink it aggressively) and
//! spend the saved height on the cells instead.
//!
//! Every division in this module is guarded: the resolver never emits a
//! zero, negative, NaN or infinite value.

use serde::{Deserialize, Serialize};

/// A grid with more rows or columns than this uses the compact profile.
pub const LARGE_GRID_THRESHOLD: usize = 6;

/// Smallest width/height assumed for the viewport.
///
/// A viewport that has not been measured yet reports 0; flooring it keeps the
/// scale from collapsing to zero.
pub const MIN_VIEWPORT_EXTENT: f64 = 300.0;

/// Lowest scale the fit pass will shrink to.
pub const MIN_SCALE: f64 = 0.01;

/// Allowed column gap range `[min, max]`.
pub const GAP_X_RANGE: (f64, f64) = (4.0, 64.0);

/// Allowed row gap range `[min, max]`.
pub const GAP_Y_RANGE: (f64, f64) = (1.0, 32.0);

/// Geometry profile of one grid cell at scale 1.
///
/// Nesting, outermost first: the *slot* is the cell's horizontal footprint,
/// the *bezel* is the decorative frame inside it, and the *plate* is the
/// switch graphic inside the bezel.  `extra_vertical_text` is reserved below
/// every bezel for the label and coordinate caption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellGeometry {
    pub slot_width: f64,
    pub bezel_width: f64,
    pub bezel_height: f64,
    pub plate_width: f64,
    pub plate_height: f64,
    pub base_gap_x: f64,
    pub base_gap_y: f64,
    pub padding: f64,
    pub extra_vertical_text: f64,
    pub font_size: f64,
}

impl CellGeometry {
    /// Profile for grids up to 6×6.
    pub const STANDARD: CellGeometry = CellGeometry {
        slot_width: 96.0,
        bezel_width: 80.0,
        bezel_height: 128.0,
        plate_width: 52.0,
        plate_height: 100.0,
        base_gap_x: 32.0,
        base_gap_y: 24.0,
        padding: 24.0,
        extra_vertical_text: 44.0,
        font_size: 14.0,
    };

    /// Profile for larger grids, about 64% of the standard linear size.
    pub const COMPACT: CellGeometry = CellGeometry {
        slot_width: 62.0,
        bezel_width: 52.0,
        bezel_height: 82.0,
        plate_width: 34.0,
        plate_height: 64.0,
        base_gap_x: 20.0,
        base_gap_y: 16.0,
        padding: 16.0,
        extra_vertical_text: 30.0,
        font_size: 10.0,
    };

    /// Vertical space one row of cells needs, caption included.
    pub fn row_height(&self) -> f64 {
        self.bezel_height + self.extra_vertical_text
    }

    /// Returns a copy with every dimension multiplied by `scale`.
    pub fn scaled(&self, scale: f64) -> CellGeometry {
        CellGeometry {
            slot_width: self.slot_width * scale,
            bezel_width: self.bezel_width * scale,
            bezel_height: self.bezel_height * scale,
            plate_width: self.plate_width * scale,
            plate_height: self.plate_height * scale,
            base_gap_x: self.base_gap_x * scale,
            base_gap_y: self.base_gap_y * scale,
            padding: self.padding * scale,
            extra_vertical_text: self.extra_vertical_text * scale,
            font_size: self.font_size * scale,
        }
    }
}

/// Which geometry profile the resolver chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Standard,
    Compact,
}

impl ProfileKind {
    /// The unscaled geometry for this profile.
    pub fn geometry(self) -> CellGeometry {
        match self {
            ProfileKind::Standard => CellGeometry::STANDARD,
            ProfileKind::Compact => CellGeometry::COMPACT,
        }
    }
}

/// The dimension that bound the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitingAxis {
    Height,
    Width,
}

/// Rectangle available to the diagram, already reduced by fixed margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Shrinks the viewport by horizontal and vertical margins (never below 0).
    pub fn inset(self, margin_x: f64, margin_y: f64) -> Self {
        Self {
            width: (self.width - margin_x).max(0.0),
            height: (self.height - margin_y).max(0.0),
        }
    }

    /// Applies [`MIN_VIEWPORT_EXTENT`] to each axis; non-finite values are
    /// treated as unmeasured.
    pub fn floored(self) -> Self {
        Self {
            width: floor_extent(self.width),
            height: floor_extent(self.height),
        }
    }
}

fn floor_extent(value: f64) -> f64 {
    if value.is_finite() {
        value.max(MIN_VIEWPORT_EXTENT)
    } else {
        MIN_VIEWPORT_EXTENT
    }
}

/// Output of the resolver; everything the presentation layer needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub profile: ProfileKind,
    /// Uniform multiplier applied to the profile geometry, in `(0, 1]`.
    pub scale: f64,
    /// Space between adjacent columns.
    pub gap_x: f64,
    /// Space between adjacent rows.
    pub gap_y: f64,
    pub limiting_axis: LimitingAxis,
    /// Scaled slot width.
    pub cell_width: f64,
    /// Scaled row height (bezel plus caption).
    pub cell_height: f64,
    /// Scaled outer padding on each side.
    pub padding: f64,
    /// Width of the whole grid at the final scale and gaps.
    pub grid_width: f64,
    /// Height of the whole grid at the final scale and gaps.
    pub grid_height: f64,
}

impl LayoutResult {
    /// The profile geometry at the resolved scale.
    pub fn scaled_geometry(&self) -> CellGeometry {
        self.profile.geometry().scaled(self.scale)
    }
}

/// Chooses the compact profile when either dimension exceeds
/// [`LARGE_GRID_THRESHOLD`].
pub fn select_profile(rows: usize, cols: usize) -> ProfileKind {
    if rows > LARGE_GRID_THRESHOLD || cols > LARGE_GRID_THRESHOLD {
        ProfileKind::Compact
    } else {
        ProfileKind::Standard
    }
}

/// Resolves scale and gaps for a `rows × cols` grid inside `available`.
///
/// Zero `rows`/`cols` are treated as 1.  The viewport is floored with
/// [`Viewport::floored`] first.
pub fn resolve_layout(rows: usize, cols: usize, available: Viewport) -> LayoutResult {
    let rows = rows.max(1);
    let cols = cols.max(1);
    let profile = select_profile(rows, cols);
    let geometry = profile.geometry();
    let avail = available.floored();

    let rows_f = rows as f64;
    let cols_f = cols as f64;

    // Parts of the footprint that scale with the cells.
    let content_w = cols_f * geometry.slot_width + 2.0 * geometry.padding;
    let content_h = rows_f * geometry.row_height() + 2.0 * geometry.padding;

    // Unscaled footprint including the base gaps.
    let footprint_w = content_w + (cols_f - 1.0) * geometry.base_gap_x;
    let footprint_h = content_h + (rows_f - 1.0) * geometry.base_gap_y;

    let scale_w = safe_ratio(avail.width, footprint_w);
    let scale_h = safe_ratio(avail.height, footprint_h);

    let mut scale = scale_w.min(scale_h).min(1.0);
    if !(scale.is_finite() && scale > 0.0) {
        scale = 1.0;
    }
    let mut limiting_axis = if scale_h <= scale_w {
        LimitingAxis::Height
    } else {
        LimitingAxis::Width
    };

    let extra_w = (avail.width - footprint_w * scale).max(0.0);
    let extra_h = (avail.height - footprint_h * scale).max(0.0);

    let gap_x = column_gap(geometry.base_gap_x * scale, cols, extra_w);
    let gap_y = row_gap(geometry.base_gap_y * scale, rows, extra_h);

    // The gap floors can push the footprint past the viewport on tiny
    // viewports; shrink the cells so that cells plus final gaps still fit.
    let fit_w = safe_ratio(avail.width - (cols_f - 1.0) * gap_x, content_w);
    let fit_h = safe_ratio(avail.height - (rows_f - 1.0) * gap_y, content_h);
    let fitted = fit_w.min(fit_h);
    if fitted < scale {
        scale = fitted.max(MIN_SCALE);
        limiting_axis = if fit_h <= fit_w {
            LimitingAxis::Height
        } else {
            LimitingAxis::Width
        };
    }

    LayoutResult {
        profile,
        scale,
        gap_x,
        gap_y,
        limiting_axis,
        cell_width: geometry.slot_width * scale,
        cell_height: geometry.row_height() * scale,
        padding: geometry.padding * scale,
        grid_width: content_w * scale + (cols_f - 1.0) * gap_x,
        grid_height: content_h * scale + (rows_f - 1.0) * gap_y,
    }
}

/// Column gap: scaled base gap plus an equal share of the horizontal slack.
fn column_gap(scaled_base: f64, cols: usize, extra_w: f64) -> f64 {
    let share = if cols > 1 {
        extra_w / (cols - 1) as f64
    } else {
        0.0
    };
    clamp_gap(scaled_base + share, GAP_X_RANGE)
}

/// Row gap: compressed on tall grids, otherwise widened by at most half the
/// scaled base gap.
fn row_gap(scaled_base: f64, rows: usize, extra_h: f64) -> f64 {
    let gap = if rows > 6 {
        (scaled_base * 0.2).max(1.0)
    } else if rows > 4 {
        (scaled_base * 0.5).max(4.0)
    } else if rows > 1 && extra_h > 0.0 {
        scaled_base + (extra_h / (rows - 1) as f64).min(scaled_base * 0.5)
    } else {
        scaled_base
    };
    clamp_gap(gap, GAP_Y_RANGE)
}

fn clamp_gap(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        min
    }
}

/// `numerator / denominator`, or 0 when the result would not be a finite
/// non-negative number.
fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        0.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
