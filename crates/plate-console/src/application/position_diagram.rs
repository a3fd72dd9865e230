//! PositionDiagramUseCase: lays out one protection screen's plates.
//!
//! # Data flow (for beginners)
//!
//! ```text
//! DeviceDirectory ──► devices of the selected screen
//!                         │
//!                         ▼
//!                    build_grid      (rows × cols matrix, last write wins)
//!                         │
//!                         ▼
//!                  resolve_layout    (profile, scale, gaps for the viewport)
//!                         │
//!                         ▼
//!                  PositionDiagram   (cells with label lines + layout)
//! ```
//!
//! The viewport the caller passes is the raw window size.  Fixed margins
//! (title bar, legend, paddings around the diagram) are subtracted before
//! the resolver sees it.

use plate_core::{
    build_grid, chunk_label, resolve_layout, Device, DeviceFilter, DeviceId, LayoutResult,
    PlateColor, PlateLayer, PlateStatus, Viewport, DEFAULT_LABEL_CHUNK,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::manage_devices::{DeviceDirectory, DirectoryError};

/// Inputs that come from configuration rather than from the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagramOptions {
    /// Raw window area available to the diagram dialog.
    pub viewport: Viewport,
    /// Horizontal space reserved outside the grid.
    pub margin_x: f64,
    /// Vertical space reserved outside the grid.
    pub margin_y: f64,
    /// Characters per label line.
    pub label_chunk: usize,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::new(1280.0, 800.0),
            margin_x: 48.0,
            margin_y: 160.0,
            label_chunk: DEFAULT_LABEL_CHUNK,
        }
    }
}

/// One occupied cell of the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramCell {
    pub device_id: DeviceId,
    /// 1-based row, i.e. the normalised `position_x`.
    pub row: usize,
    /// 1-based column, i.e. the normalised `position_y`.
    pub col: usize,
    pub label_lines: Vec<String>,
    pub color: PlateColor,
    pub layer: PlateLayer,
    pub status: PlateStatus,
}

/// A laid-out protection screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDiagram {
    pub screen: String,
    pub rows: usize,
    pub cols: usize,
    /// Row-major; `cells[r][c]` is `None` for an empty slot.
    pub cells: Vec<Vec<Option<DiagramCell>>>,
    pub layout: LayoutResult,
}

impl PositionDiagram {
    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// Plain-text rendering for terminals: one line per row, each occupied
    /// cell showing its status and first label line.
    pub fn render_text(&self) -> String {
        const EMPTY: &str = ".";
        let width = self
            .cells
            .iter()
            .flatten()
            .flatten()
            .map(|c| cell_text(c).chars().count())
            .max()
            .unwrap_or(EMPTY.len());

        let mut out = format!(
            "{} ({}x{}, {} profile, scale {:.2})\n",
            self.screen,
            self.rows,
            self.cols,
            match self.layout.profile {
                plate_core::ProfileKind::Standard => "standard",
                plate_core::ProfileKind::Compact => "compact",
            },
            self.layout.scale
        );
        for row in &self.cells {
            let line: Vec<String> = row
                .iter()
                .map(|cell| {
                    let text = cell.as_ref().map_or_else(|| EMPTY.to_string(), cell_text);
                    format!("{text:<width$}")
                })
                .collect();
            out.push_str(line.join(" | ").trim_end());
            out.push('\n');
        }
        out
    }
}

fn cell_text(cell: &DiagramCell) -> String {
    let first = cell.label_lines.first().map(String::as_str).unwrap_or("");
    format!("[{:<3}] {}", cell.status, first)
}

/// Builds the diagram for `screen`.
///
/// Only devices whose screen name equals `screen` exactly are placed.  A
/// screen without devices yields a 1×1 diagram with one empty cell.
///
/// # Errors
///
/// Returns the directory's error if listing fails.
pub async fn position_diagram(
    directory: &dyn DeviceDirectory,
    screen: &str,
    options: &DiagramOptions,
) -> Result<PositionDiagram, DirectoryError> {
    let filter = DeviceFilter {
        protection_screen: Some(screen.to_string()),
        ..DeviceFilter::default()
    };
    let devices: Vec<Device> = directory
        .list(&filter)
        .await?
        .into_iter()
        .filter(|d| d.protection_screen == screen)
        .collect();

    Ok(layout_devices(screen, &devices, options))
}

/// The synchronous part of [`position_diagram`], for callers that already
/// hold the screen's devices.
pub fn layout_devices(screen: &str, devices: &[Device], options: &DiagramOptions) -> PositionDiagram {
    let grid = build_grid(devices);
    let available = options.viewport.inset(options.margin_x, options.margin_y);
    let layout = resolve_layout(grid.rows(), grid.cols(), available);

    debug!(
        screen,
        rows = grid.rows(),
        cols = grid.cols(),
        scale = layout.scale,
        "position diagram resolved"
    );

    let cells = grid
        .iter_rows()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, slot)| {
                    slot.map(|device| DiagramCell {
                        device_id: device.id,
                        row: r + 1,
                        col: c + 1,
                        label_lines: chunk_label(&device.plate_name, options.label_chunk),
                        color: device.color,
                        layer: device.layer,
                        status: device.effective_status(),
                    })
                })
                .collect()
        })
        .collect();

    PositionDiagram {
        screen: screen.to_string(),
        rows: grid.rows(),
        cols: grid.cols(),
        cells,
        layout,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
