//! # plate-core
//!
//! Shared library for the pressure-plate console containing the device
//! model, the terminology configuration, and the position-diagram layout
//! engine.
//!
//! It has zero dependencies on storage, UI frameworks, or async runtimes.
//!
//! # Architecture overview (for beginners)
//!
//! A *pressure plate* is a labelled switch mounted in a protection-relay
//! cabinet (a "protection screen").  Every plate sits at a 1-based
//! `(row, column)` position inside its screen.  The console shows those
//! plates as a grid of coloured cells so an operator can see at a glance
//! which plates are switched on.
//!
//! This crate (`plate-core`) is the pure foundation.  It defines:
//!
//! - **`domain::device`** – The `Device` record, its enums, and the filter /
//!   patch payloads used by the directory.
//!
//! - **`domain::grid`** – Turns an unordered list of positioned devices into
//!   a dense row-major matrix.
//!
//! - **`domain::scale`** – Picks a geometry profile and the largest uniform
//!   scale (≤ 1) that lets the whole matrix fit inside the viewport, then
//!   spreads any leftover space into the gaps between cells.
//!
//! - **`domain::label`** – Splits plate names into fixed-width lines.
//!
//! - **`domain::terminology`** – The per-plate-type order in which a
//!   plate's descriptive fields are joined into its display label.

// Rust will look for the module in src/domain/mod.rs.
pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `plate_core::build_grid` instead of `plate_core::domain::grid::build_grid`.
pub use domain::device::{
    Device, DeviceFilter, DeviceId, DevicePatch, NewDevice, PlateColor, PlateLayer, PlateStatus,
    PlateType,
};
pub use domain::grid::{build_grid, group_by_screen, PlateGrid, Positioned};
pub use domain::label::{chunk_label, DEFAULT_LABEL_CHUNK};
pub use domain::scale::{
    resolve_layout, select_profile, CellGeometry, LayoutResult, LimitingAxis, ProfileKind,
    Viewport,
};
pub use domain::terminology::{TerminologyConfig, TerminologyKey};
