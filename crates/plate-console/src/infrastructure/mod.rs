//! Infrastructure layer for the console.
//!
//! Contains the outward-facing adapters: key-value storage, the TOML
//! configuration file, and the command bridge the CLI (or a UI shell) calls.
//!
//! **Dependency rule**: this layer may depend on `application` and `plate_core`,
//! but MUST NOT be imported by the `application` or domain layers.

pub mod storage;
pub mod ui_bridge;
