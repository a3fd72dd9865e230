//! Grid builder: positioned devices to a dense row-major matrix.
//!
//! Every device carries a 1-based `(position_x, position_y)` pair, where
//! `position_x` is the row and `position_y` the column inside its
//! protection screen.  The pairs are not guaranteed to be contiguous or
//! unique, so the builder:
//!
//! - sizes the matrix from the largest row and column seen (at least 1×1),
//! - normalises missing or non-positive coordinates to 1,
//! - lets the later device win when two devices share a cell.
//!
//! The last rule is kept for compatibility with existing data sets.  A
//! collision usually means a data-entry mistake upstream, so the builder
//! reports it at `debug` level instead of hiding it completely.

use std::collections::BTreeMap;

use tracing::debug;

use super::device::Device;

/// Largest row or column count the builder will allocate.
///
/// Devices beyond this extent are dropped from the matrix.  Real cabinets
/// hold at most a few dozen rows, so this only guards against corrupt data.
pub const MAX_GRID_EXTENT: usize = 512;

/// Anything that can be placed on the position grid.
pub trait Positioned {
    /// Returns the raw `(row, column)` coordinate, 1-based.
    ///
    /// Values ≤ 0 are treated as 1 by the builder.
    fn grid_position(&self) -> (i64, i64);
}

impl Positioned for Device {
    fn grid_position(&self) -> (i64, i64) {
        (self.position_x, self.position_y)
    }
}

impl<T: Positioned + ?Sized> Positioned for &T {
    fn grid_position(&self) -> (i64, i64) {
        (**self).grid_position()
    }
}

/// Dense matrix of optional device references for one protection screen.
///
/// Cells are stored row-major; `get(r, c)` is 0-indexed, so a device at
/// position `(x, y)` lives at `get(x - 1, y - 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateGrid<'a, T> {
    rows: usize,
    cols: usize,
    cells: Vec<Option<&'a T>>,
}

impl<'a, T> PlateGrid<'a, T> {
    /// Number of rows (≥ 1).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (≥ 1).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the device at the 0-indexed `(row, col)`, if any.
    pub fn get(&self, row: usize, col: usize) -> Option<&'a T> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.cells[row * self.cols + col]
    }

    /// Iterates over the rows, top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Option<&'a T>]> + '_ {
        self.cells.chunks(self.cols)
    }

    /// Number of cells holding a device.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Copies the grid into a nested `rows × cols` matrix.
    pub fn to_matrix(&self) -> Vec<Vec<Option<&'a T>>> {
        self.iter_rows().map(<[_]>::to_vec).collect()
    }
}

/// Builds the grid for one screen's devices.
///
/// Accepts anything that iterates over device references, e.g. `&Vec<Device>`
/// or `group.iter().copied()` for a `Vec<&Device>`.
pub fn build_grid<'a, T, I>(items: I) -> PlateGrid<'a, T>
where
    T: Positioned + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let placed: Vec<(usize, usize, &'a T)> = items
        .into_iter()
        .map(|item| {
            let (x, y) = item.grid_position();
            (normalize_coordinate(x), normalize_coordinate(y), item)
        })
        .collect();

    let rows = placed
        .iter()
        .map(|(x, _, _)| *x)
        .max()
        .unwrap_or(1)
        .clamp(1, MAX_GRID_EXTENT);
    let cols = placed
        .iter()
        .map(|(_, y, _)| *y)
        .max()
        .unwrap_or(1)
        .clamp(1, MAX_GRID_EXTENT);

    let mut cells: Vec<Option<&'a T>> = vec![None; rows * cols];
    for (x, y, item) in placed {
        if x > rows || y > cols {
            debug!(row = x, col = y, "device outside grid extent dropped");
            continue;
        }
        let slot = &mut cells[(x - 1) * cols + (y - 1)];
        if slot.is_some() {
            debug!(row = x, col = y, "grid cell collision, later device wins");
        }
        *slot = Some(item);
    }

    PlateGrid { rows, cols, cells }
}

/// Partitions devices by protection screen, ordered by screen name.
///
/// Within each group the input order is preserved, which keeps the
/// last-write-wins rule of [`build_grid`] meaningful.
pub fn group_by_screen(devices: &[Device]) -> BTreeMap<&str, Vec<&Device>> {
    let mut groups: BTreeMap<&str, Vec<&Device>> = BTreeMap::new();
    for device in devices {
        groups
            .entry(device.protection_screen.as_str())
            .or_default()
            .push(device);
    }
    groups
}

fn normalize_coordinate(raw: i64) -> usize {
    if raw < 1 {
        1
    } else {
        usize::try_from(raw).unwrap_or(usize::MAX)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal positioned item so the tests do not depend on the full record.
    #[derive(Debug, PartialEq)]
    struct Plate {
        name: &'static str,
        x: i64,
        y: i64,
    }

    impl Positioned for Plate {
        fn grid_position(&self) -> (i64, i64) {
            (self.x, self.y)
        }
    }

    fn plate(name: &'static str, x: i64, y: i64) -> Plate {
        Plate { name, x, y }
    }

    #[test]
    fn test_build_grid_sizes_from_max_coordinates() {
        let plates = vec![plate("a", 1, 1), plate("b", 3, 2), plate("c", 2, 4)];
        let grid = build_grid(&plates);
        assert_eq!((grid.rows(), grid.cols()), (3, 4));
    }

    #[test]
    fn test_build_grid_places_each_device_at_zero_indexed_cell() {
        let plates = vec![plate("a", 1, 1), plate("b", 3, 2)];
        let grid = build_grid(&plates);
        assert_eq!(grid.get(0, 0).map(|p| p.name), Some("a"));
        assert_eq!(grid.get(2, 1).map(|p| p.name), Some("b"));
        assert_eq!(grid.get(1, 1), None);
        assert_eq!(grid.occupied(), 2);
    }

    #[test]
    fn test_build_grid_empty_input_yields_single_empty_cell() {
        let plates: Vec<Plate> = Vec::new();
        let grid = build_grid(&plates);
        assert_eq!((grid.rows(), grid.cols()), (1, 1));
        assert_eq!(grid.to_matrix(), vec![vec![None]]);
    }

    #[test]
    fn test_build_grid_single_device_at_origin() {
        let plates = vec![plate("only", 1, 1)];
        let grid = build_grid(&plates);
        let matrix = grid.to_matrix();
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix[0][0].map(|p| p.name), Some("only"));
    }

    #[test]
    fn test_build_grid_collision_last_write_wins() {
        let plates = vec![plate("first", 2, 3), plate("second", 2, 3)];
        let grid = build_grid(&plates);
        assert_eq!(grid.get(1, 2).map(|p| p.name), Some("second"));
        assert_eq!(grid.occupied(), 1);
    }

    #[test]
    fn test_build_grid_normalizes_non_positive_coordinates_to_one() {
        let plates = vec![plate("zero", 0, -4), plate("far", 2, 2)];
        let grid = build_grid(&plates);
        assert_eq!(grid.get(0, 0).map(|p| p.name), Some("zero"));
    }

    #[test]
    fn test_build_grid_drops_devices_beyond_max_extent() {
        let plates = vec![plate("ok", 1, 1), plate("corrupt", 1, 1_000_000)];
        let grid = build_grid(&plates);
        assert_eq!(grid.cols(), MAX_GRID_EXTENT);
        assert_eq!(grid.occupied(), 1);
    }

    #[test]
    fn test_build_grid_accepts_reference_groups() {
        let plates = vec![plate("a", 1, 2)];
        let refs: Vec<&Plate> = plates.iter().collect();
        let grid = build_grid(refs.iter().copied());
        assert_eq!(grid.get(0, 1).map(|p| p.name), Some("a"));
    }

    #[test]
    fn test_iter_rows_yields_rows_of_col_width() {
        let plates = vec![plate("a", 2, 3)];
        let grid = build_grid(&plates);
        let widths: Vec<usize> = grid.iter_rows().map(<[_]>::len).collect();
        assert_eq!(widths, vec![3, 3]);
    }

    #[test]
    fn test_build_grid_is_deterministic() {
        let plates = vec![plate("a", 1, 1), plate("b", 1, 1), plate("c", 4, 2)];
        assert_eq!(build_grid(&plates), build_grid(&plates));
    }
}
