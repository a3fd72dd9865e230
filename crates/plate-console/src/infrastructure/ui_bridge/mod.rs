//! Command bridge: exposes application-layer operations to the front end.
//!
//! Every command is an `async fn` taking the shared [`AppState`] and
//! returning a [`CommandResult`].  The CLI in `main.rs` is one consumer; a
//! desktop shell could register the same functions as its command handlers.
//! This module must NOT be imported by the application or domain layers.
//!
//! # Data Transfer Objects (DTOs)
//!
//! Table rows and log entries are flattened into DTOs (`DeviceRowDto`,
//! `LogEntryDto`) that:
//!
//! - Contain only display-ready, JSON-serialisable fields.
//! - Carry the composed terminology label, so the front end never needs to
//!   know the configured field order.
//!
//! Domain types that are already display-ready (`Device`,
//! `PositionDiagram`, `TerminologyConfig`) are returned as they are.
//!
//! # `CommandResult<T>` wrapper
//!
//! All commands return `CommandResult<T>` rather than `Result<T, E>`.
//! This ensures every command response has the same shape:
//! `{ success: bool, data: T | null, error: string | null }`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plate_core::{
    Device, DeviceFilter, DeviceId, DevicePatch, NewDevice, PlateColor, PlateLayer, PlateStatus,
    PlateType, TerminologyConfig, Viewport,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::application::{
    adjust_status::{apply_adjustment, StatusAdjustment},
    manage_devices::{DeviceDirectory, DeviceRegistry, DirectoryError},
    paginate::{paginate, Page, PageRequest},
    position_diagram::{position_diagram, PositionDiagram},
    update_logs::{ChangeType, LogId, LogQuery, UpdateLogBook, UpdateLogEntry},
};
use crate::infrastructure::storage::{
    config::{AppConfig, ConfigError},
    local_store::{FileStore, KeyValueStore},
    repository::{ConsoleRepository, RepositoryError},
};

/// Error type for building the [`AppState`].
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// ── Shared application state ──────────────────────────────────────────────────

/// Application state shared between commands.
///
/// All fields are `Mutex<...>` (async Tokio mutex) because commands run in
/// an async Tokio context.  Each lock guards one document; a command that
/// holds two of them at once always takes `registry` before `logs`.
pub struct AppState {
    /// The in-memory device records.
    pub registry: Mutex<DeviceRegistry>,
    /// The update log book.
    pub logs: Mutex<UpdateLogBook>,
    /// Label field order for hard and soft plates.
    pub terminology: Mutex<TerminologyConfig>,
    /// The current configuration file contents.
    pub config: Mutex<AppConfig>,
    /// Typed access to the stored documents.
    pub repository: ConsoleRepository,
}

impl AppState {
    /// Opens the file-backed data directory named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError`] if the data directory cannot be determined
    /// or the store cannot be read.
    pub fn open(config: AppConfig) -> Result<Arc<Self>, StartupError> {
        let dir = config.data_dir()?;
        info!(data_dir = %dir.display(), "opening data directory");
        Ok(Self::with_store(config, Arc::new(FileStore::new(dir)))?)
    }

    /// Builds the state over any store, seeding it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the store fails.
    pub fn with_store(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Arc<Self>, RepositoryError> {
        let repository = ConsoleRepository::new(store);
        let loaded = repository.load_devices(Utc::now())?;
        let logs = repository.load_logs()?;
        let terminology = repository.load_terminology()?;

        info!(
            devices = loaded.devices.len(),
            logs = logs.len(),
            reseeded = loaded.reseeded,
            "console state loaded"
        );

        Ok(Arc::new(Self {
            registry: Mutex::new(DeviceRegistry::from_devices(loaded.devices)),
            logs: Mutex::new(UpdateLogBook::from_entries(logs)),
            terminology: Mutex::new(terminology),
            config: Mutex::new(config),
            repository,
        }))
    }
}

// ── Device directory over the shared state ────────────────────────────────────

/// [`DeviceDirectory`] backed by the shared registry; every mutation is
/// written through to the store.
#[derive(Clone)]
pub struct LocalDeviceDirectory {
    state: Arc<AppState>,
}

impl LocalDeviceDirectory {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    fn persist(&self, registry: &DeviceRegistry) -> Result<(), DirectoryError> {
        self.state
            .repository
            .save_devices(registry.all())
            .map_err(|e| DirectoryError::Storage(e.to_string()))
    }
}

#[async_trait]
impl DeviceDirectory for LocalDeviceDirectory {
    async fn list(&self, filter: &DeviceFilter) -> Result<Vec<Device>, DirectoryError> {
        Ok(self.state.registry.lock().await.list(filter))
    }

    async fn get(&self, id: DeviceId) -> Result<Device, DirectoryError> {
        self.state
            .registry
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or(DirectoryError::NotFound(id))
    }

    async fn update(&self, id: DeviceId, patch: DevicePatch) -> Result<Device, DirectoryError> {
        let mut registry = self.state.registry.lock().await;
        let device = registry.update(id, patch, Utc::now())?;
        self.persist(&registry)?;
        Ok(device)
    }

    async fn create(&self, device: NewDevice) -> Result<Device, DirectoryError> {
        let mut registry = self.state.registry.lock().await;
        let device = registry.create(device, Utc::now());
        self.persist(&registry)?;
        info!(device_id = device.id, "device created");
        Ok(device)
    }

    async fn delete(&self, id: DeviceId) -> Result<Device, DirectoryError> {
        let mut registry = self.state.registry.lock().await;
        let device = registry.delete(id)?;
        self.persist(&registry)?;
        info!(device_id = id, "device deleted");
        Ok(device)
    }
}

// ── Data Transfer Objects (Presentation layer) ────────────────────────────────

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn display_time(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.format(DISPLAY_TIME_FORMAT).to_string())
}

/// One row of the inventory table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRowDto {
    pub id: DeviceId,
    pub sequence: u32,
    /// Screen, bay and plate name joined in the configured order.
    pub label: String,
    pub power_station: String,
    pub protection_screen: String,
    pub bay: String,
    pub plate_name: String,
    pub plate_type: PlateType,
    pub color: PlateColor,
    pub layer: PlateLayer,
    pub position_x: i64,
    pub position_y: i64,
    pub status: PlateStatus,
    pub last_changed_by: Option<String>,
    pub last_changed_at: Option<String>,
}

impl DeviceRowDto {
    pub fn new(device: &Device, terminology: &TerminologyConfig) -> Self {
        Self {
            id: device.id,
            sequence: device.sequence,
            label: terminology.compose_label(device),
            power_station: device.power_station.clone(),
            protection_screen: device.protection_screen.clone(),
            bay: device.bay.clone(),
            plate_name: device.plate_name.clone(),
            plate_type: device.plate_type,
            color: device.color,
            layer: device.layer,
            position_x: device.position_x,
            position_y: device.position_y,
            status: device.effective_status(),
            last_changed_by: device.last_changed_by.clone(),
            last_changed_at: display_time(device.latest_update()),
        }
    }
}

/// One row of the update-log table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntryDto {
    pub id: LogId,
    pub sequence: u32,
    pub device_id: DeviceId,
    pub power_station: String,
    pub protection_screen: String,
    pub bay: String,
    pub plate_name: String,
    pub plate_type: PlateType,
    pub change_type: ChangeType,
    pub change_source: String,
    pub change_time: String,
    pub status: PlateStatus,
    pub hidden: bool,
}

impl From<&UpdateLogEntry> for LogEntryDto {
    fn from(e: &UpdateLogEntry) -> Self {
        Self {
            id: e.id,
            sequence: e.sequence,
            device_id: e.device_id,
            power_station: e.power_station.clone(),
            protection_screen: e.protection_screen.clone(),
            bay: e.bay.clone(),
            plate_name: e.plate_name.clone(),
            plate_type: e.plate_type,
            change_type: e.change_type,
            change_source: e.change_source.clone(),
            change_time: e.change_time.format(DISPLAY_TIME_FORMAT).to_string(),
            status: e.status,
            hidden: e.hidden,
        }
    }
}

/// Result of a status adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustResultDto {
    pub device: DeviceRowDto,
    pub log: LogEntryDto,
}

/// Unified response wrapper used by all commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

impl<T: Serialize, E: std::fmt::Display> From<Result<T, E>> for CommandResult<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

async fn page_request(state: &AppState, page: usize, page_size: Option<usize>) -> PageRequest {
    let page_size = match page_size {
        Some(size) => size,
        None => state.config.lock().await.console.effective_page_size(),
    };
    PageRequest { page, page_size }
}

fn persist_logs(state: &AppState, logs: &UpdateLogBook) -> Result<(), String> {
    state
        .repository
        .save_logs(logs.entries())
        .map_err(|e| format!("failed to save update logs: {e}"))
}

// ── Device commands ───────────────────────────────────────────────────────────

/// Returns one page of the inventory table.
///
/// `page_size` of `None` uses the configured page size.
pub async fn list_devices(
    state: Arc<AppState>,
    filter: DeviceFilter,
    page: usize,
    page_size: Option<usize>,
) -> CommandResult<Page<DeviceRowDto>> {
    let request = page_request(&state, page, page_size).await;
    let directory = LocalDeviceDirectory::new(Arc::clone(&state));
    let devices = match directory.list(&filter).await {
        Ok(d) => d,
        Err(e) => return CommandResult::err(e.to_string()),
    };

    let terminology = state.terminology.lock().await;
    let rows: Vec<DeviceRowDto> = devices
        .iter()
        .map(|d| DeviceRowDto::new(d, &terminology))
        .collect();
    CommandResult::ok(paginate(rows, request))
}

/// Returns the full record of one device.
pub async fn get_device(state: Arc<AppState>, id: DeviceId) -> CommandResult<Device> {
    LocalDeviceDirectory::new(state).get(id).await.into()
}

pub async fn create_device(state: Arc<AppState>, device: NewDevice) -> CommandResult<Device> {
    LocalDeviceDirectory::new(state).create(device).await.into()
}

pub async fn update_device(
    state: Arc<AppState>,
    id: DeviceId,
    patch: DevicePatch,
) -> CommandResult<Device> {
    LocalDeviceDirectory::new(state).update(id, patch).await.into()
}

pub async fn delete_device(state: Arc<AppState>, id: DeviceId) -> CommandResult<Device> {
    LocalDeviceDirectory::new(state).delete(id).await.into()
}

/// Switches a plate on or off and records the change in the update log.
pub async fn adjust_plate_status(
    state: Arc<AppState>,
    adjustment: StatusAdjustment,
) -> CommandResult<AdjustResultDto> {
    let operator = state.config.lock().await.console.operator.clone();
    let directory = LocalDeviceDirectory::new(Arc::clone(&state));

    // The directory takes and releases `registry`; `logs` is locked only
    // afterwards.
    let (device, change) =
        match apply_adjustment(&directory, adjustment, &operator, Utc::now()).await {
            Ok(applied) => applied,
            Err(e) => {
                error!("status adjustment failed: {e}");
                return CommandResult::err(e.to_string());
            }
        };

    let mut logs = state.logs.lock().await;
    let log = logs.record(change);
    if let Err(e) = persist_logs(&state, &logs) {
        return CommandResult::err(e);
    }
    drop(logs);

    let terminology = state.terminology.lock().await;
    CommandResult::ok(AdjustResultDto {
        device: DeviceRowDto::new(&device, &terminology),
        log: LogEntryDto::from(&log),
    })
}

/// Distinct protection-screen names, sorted.
pub async fn list_screens(state: Arc<AppState>) -> CommandResult<Vec<String>> {
    CommandResult::ok(state.registry.lock().await.screens())
}

/// Lays out one protection screen for the given window size.
///
/// `viewport` of `None` uses the configured default window size.
pub async fn get_position_diagram(
    state: Arc<AppState>,
    screen: String,
    viewport: Option<Viewport>,
) -> CommandResult<PositionDiagram> {
    let options = state.config.lock().await.diagram.options(viewport);
    let directory = LocalDeviceDirectory::new(Arc::clone(&state));
    position_diagram(&directory, &screen, &options).await.into()
}

// ── Update log commands ───────────────────────────────────────────────────────

/// Returns one page of the update log, newest first.
pub async fn get_update_logs(
    state: Arc<AppState>,
    query: LogQuery,
    page: usize,
    page_size: Option<usize>,
) -> CommandResult<Page<LogEntryDto>> {
    let request = page_request(&state, page, page_size).await;
    let logs = state.logs.lock().await;
    let rows: Vec<LogEntryDto> = logs.query(&query).iter().map(LogEntryDto::from).collect();
    CommandResult::ok(paginate(rows, request))
}

/// Hides (or restores) log entries by id; returns how many matched.
pub async fn set_logs_hidden_by_ids(
    state: Arc<AppState>,
    ids: Vec<LogId>,
    hidden: bool,
) -> CommandResult<usize> {
    let mut logs = state.logs.lock().await;
    let changed = logs.set_hidden_by_ids(&ids, hidden);
    if let Err(e) = persist_logs(&state, &logs) {
        return CommandResult::err(e);
    }
    info!(changed, hidden, "log entries updated by id");
    CommandResult::ok(changed)
}

/// Hides (or restores) log entries by device and inclusive time range;
/// returns how many changed state.
pub async fn set_logs_hidden_in_range(
    state: Arc<AppState>,
    device_id: Option<DeviceId>,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    hidden: bool,
) -> CommandResult<usize> {
    let mut logs = state.logs.lock().await;
    let changed = logs.set_hidden_in_range(device_id, from, to, hidden);
    if let Err(e) = persist_logs(&state, &logs) {
        return CommandResult::err(e);
    }
    info!(changed, hidden, "log entries updated by range");
    CommandResult::ok(changed)
}

// ── Terminology commands ──────────────────────────────────────────────────────

pub async fn get_terminology(state: Arc<AppState>) -> CommandResult<TerminologyConfig> {
    CommandResult::ok(state.terminology.lock().await.clone())
}

/// Normalises, stores and returns the new terminology config.
pub async fn update_terminology(
    state: Arc<AppState>,
    config: TerminologyConfig,
) -> CommandResult<TerminologyConfig> {
    let config = config.normalized();
    if let Err(e) = state.repository.save_terminology(&config) {
        return CommandResult::err(format!("failed to save terminology: {e}"));
    }
    *state.terminology.lock().await = config.clone();
    CommandResult::ok(config)
}

// ── Data set commands ─────────────────────────────────────────────────────────

/// The full device set as pretty-printed JSON.
pub async fn export_devices(state: Arc<AppState>) -> CommandResult<String> {
    state.registry.lock().await.export_json().into()
}

/// Replaces the device set with `json`; returns the number of devices.
pub async fn import_devices(state: Arc<AppState>, json: String) -> CommandResult<usize> {
    let mut registry = state.registry.lock().await;
    let count = match registry.import_json(&json) {
        Ok(c) => c,
        Err(e) => return CommandResult::err(e.to_string()),
    };
    if let Err(e) = state.repository.save_devices(registry.all()) {
        return CommandResult::err(format!("failed to save devices: {e}"));
    }
    info!(count, "device set imported");
    CommandResult::ok(count)
}

/// Discards devices and logs and restores the seeded data set.
pub async fn reset_data(state: Arc<AppState>) -> CommandResult<usize> {
    let mut registry = state.registry.lock().await;
    let mut logs = state.logs.lock().await;
    let devices = match state.repository.reset(Utc::now()) {
        Ok(d) => d,
        Err(e) => return CommandResult::err(format!("reset failed: {e}")),
    };
    let count = devices.len();
    registry.replace_all(devices);
    logs.clear();
    CommandResult::ok(count)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
