//! Storage infrastructure: data documents and configuration file persistence.
//!
//! - **`local_store`** – The string key-value store (file-backed or in-memory)
//!   the data documents live in.
//! - **`repository`**  – Typed loading/saving of devices, update logs and the
//!   terminology config, including data-version gating and seeding.
//! - **`config`**      – The TOML configuration file in the platform config
//!   directory, with defaults for first run.
//!
//! Keeping storage concerns here, rather than scattered throughout the
//! application, means the file format can change without touching any other
//! part of the codebase.

pub mod config;
pub mod local_store;
pub mod repository;
