//! Domain entities for the pressure-plate console.
//!
//! This module contains pure business logic with no infrastructure dependencies.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! Clean Architecture organises code into concentric layers.  The innermost
//! layer is called the **domain** (or "entities" layer).  Domain code:
//!
//! - Contains the core business rules of the application.
//! - Has **no** imports from storage backends, async runtimes, or UI
//!   frameworks.
//! - Can be compiled and tested on any platform without any external setup.
//!
//! Code in outer layers (application, infrastructure) depends on the domain,
//! but the domain never depends on them.  In particular the layout engine
//! receives its device list as an explicit argument; it never reaches into
//! the directory or any other shared state.

/// Device record, enums and directory payloads.
pub mod device;

/// Grid builder: positioned devices to a dense matrix.
///
/// See [`grid::build_grid`] for the main entry point.
pub mod grid;

/// Label chunking for multi-line cell captions.
pub mod label;

/// Scale resolver: the core layout computation.
///
/// See [`scale::resolve_layout`] for the main entry point.
pub mod scale;

/// Plate terminology (label field order) configuration.
pub mod terminology;
