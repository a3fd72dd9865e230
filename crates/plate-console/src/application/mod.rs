//! Application layer use cases for the console.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure business rules in `plate-core`) and the infrastructure
//! (files, configuration, the command bridge).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil an operator goal (e.g., "show
//!   the position diagram of screen A in this window").
//! - **Depend on abstractions** (traits) rather than concrete implementations,
//!   so the storage can be swapped without changing this code.
//! - **Contain no file system access**.
//!
//! # Sub-modules
//!
//! - **`manage_devices`**    – The `DeviceDirectory` seam and the in-memory
//!   `DeviceRegistry` that backs it.
//! - **`update_logs`**       – One status-change log entry per device, with
//!   hide/restore and viewer filters.
//! - **`adjust_status`**     – Switches a plate on or off and records the change.
//! - **`paginate`**          – Page maths for the inventory and log tables.
//! - **`position_diagram`**  – Directory → grid builder → scale resolver.
//! - **`seed`**              – The reproducible first-run data set.

pub mod adjust_status;
pub mod manage_devices;
pub mod paginate;
pub mod position_diagram;
pub mod seed;
pub mod update_logs;
