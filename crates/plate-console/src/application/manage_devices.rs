//! ManageDevicesUseCase: the device directory and its in-memory registry.
//!
//! The [`DeviceDirectory`] trait is the seam between the use cases and
//! whatever holds the device records.  The position diagram and the status
//! adjustment only ever talk to this trait, which keeps them unit-testable
//! with a mock directory.
//!
//! [`DeviceRegistry`] is the console's in-memory record set.  The command
//! bridge wraps it together with the persistent store to implement the
//! directory for real.
//!
//! # Identifier assignment (for beginners)
//!
//! Ids are never reused while a device with a higher id exists: a new
//! device always gets `max(existing ids) + 1`.  Deleting the newest device
//! and then creating another one will reuse its id, which is the behaviour
//! existing data sets were built with.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plate_core::{Device, DeviceFilter, DeviceId, DevicePatch, NewDevice};
use thiserror::Error;

/// Error type for directory operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DirectoryError {
    #[error("device {0} not found")]
    NotFound(DeviceId),
    #[error("storage failure: {0}")]
    Storage(String),
}

/// Error type for JSON import/export of the whole device set.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("import data is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("import data must be a JSON array of devices")]
    NotAnArray,
    #[error("invalid device record: {0}")]
    InvalidRecord(#[source] serde_json::Error),
    #[error("failed to serialize devices: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Read/write access to the device records.
///
/// Implementations must return [`DirectoryError::NotFound`] for unknown ids
/// rather than an empty success.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Devices matching `filter`, ordered by `sequence`.
    async fn list(&self, filter: &DeviceFilter) -> Result<Vec<Device>, DirectoryError>;

    /// A single device by id.
    async fn get(&self, id: DeviceId) -> Result<Device, DirectoryError>;

    /// Merges `patch` into the device and returns the updated record.
    async fn update(&self, id: DeviceId, patch: DevicePatch) -> Result<Device, DirectoryError>;

    /// Stores a new device and returns it with its assigned id.
    async fn create(&self, device: NewDevice) -> Result<Device, DirectoryError>;

    /// Removes a device and returns the removed record.
    async fn delete(&self, id: DeviceId) -> Result<Device, DirectoryError>;
}

/// In-memory device record set.
///
/// Records keep their insertion order; listing sorts by `sequence`.
#[derive(Debug, Default, Clone)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_devices(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    /// All records in insertion order.
    pub fn all(&self) -> &[Device] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Replaces every record.
    pub fn replace_all(&mut self, devices: Vec<Device>) {
        self.devices = devices;
    }

    /// Returns the devices matching `filter`, ordered by `sequence`.
    ///
    /// The sort is stable, so devices sharing a sequence number keep their
    /// insertion order.
    pub fn list(&self, filter: &DeviceFilter) -> Vec<Device> {
        let mut matched: Vec<Device> = self
            .devices
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        matched.sort_by_key(|d| d.sequence);
        matched
    }

    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Stores a new device with `id = max + 1`.
    pub fn create(&mut self, device: NewDevice, now: DateTime<Utc>) -> Device {
        let next_id = self.devices.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let device = device.into_device(next_id, now);
        self.devices.push(device.clone());
        device
    }

    /// Merges `patch` into the device and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] if no device has this id.
    pub fn update(
        &mut self,
        id: DeviceId,
        patch: DevicePatch,
        now: DateTime<Utc>,
    ) -> Result<Device, DirectoryError> {
        let device = self
            .devices
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(DirectoryError::NotFound(id))?;
        patch.apply(device);
        device.updated_at = Some(now);
        Ok(device.clone())
    }

    /// Removes the device and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::NotFound`] if no device has this id.
    pub fn delete(&mut self, id: DeviceId) -> Result<Device, DirectoryError> {
        let index = self
            .devices
            .iter()
            .position(|d| d.id == id)
            .ok_or(DirectoryError::NotFound(id))?;
        Ok(self.devices.remove(index))
    }

    /// Distinct protection-screen names, sorted.
    pub fn screens(&self) -> Vec<String> {
        let mut screens: Vec<String> = self
            .devices
            .iter()
            .map(|d| d.protection_screen.clone())
            .collect();
        screens.sort();
        screens.dedup();
        screens
    }

    /// Pretty-printed JSON array of every record.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Serialize`] if serialization fails.
    pub fn export_json(&self) -> Result<String, TransferError> {
        serde_json::to_string_pretty(&self.devices).map_err(TransferError::Serialize)
    }

    /// Replaces every record with the devices in `json` and returns how many
    /// were imported.
    ///
    /// The current records are left untouched when the input is rejected.
    ///
    /// # Errors
    ///
    /// - [`TransferError::Parse`] if `json` is not valid JSON.
    /// - [`TransferError::NotAnArray`] if the top-level value is not an array.
    /// - [`TransferError::InvalidRecord`] if an element is not a device.
    pub fn import_json(&mut self, json: &str) -> Result<usize, TransferError> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(TransferError::Parse)?;
        if !value.is_array() {
            return Err(TransferError::NotAnArray);
        }
        let devices: Vec<Device> =
            serde_json::from_value(value).map_err(TransferError::InvalidRecord)?;
        let count = devices.len();
        self.devices = devices;
        Ok(count)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use plate_core::{PlateStatus, PlateType};

    fn new_device(sequence: u32, screen: &str, name: &str) -> NewDevice {
        NewDevice {
            sequence,
            power_station: "North Station".to_string(),
            protection_screen: screen.to_string(),
            bay: format!("Bay {sequence}"),
            plate_name: name.to_string(),
            plate_type: PlateType::Hard,
            plate_box: String::new(),
            plate_verbs: String::new(),
            general_name: String::new(),
            color: Default::default(),
            layer: Default::default(),
            position_x: 1,
            position_y: sequence as i64,
            status: Some(PlateStatus::On),
            last_changed_by: None,
            change_remarks: None,
        }
    }

    fn make_registry() -> DeviceRegistry {
        let mut registry = DeviceRegistry::new();
        let now = Utc::now();
        registry.create(new_device(3, "Screen B", "Busbar protection"), now);
        registry.create(new_device(1, "Screen A", "Line distance trip"), now);
        registry.create(new_device(2, "Screen A", "Reclose enable"), now);
        registry
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = DeviceRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.screens().is_empty());
    }

    #[test]
    fn test_create_assigns_max_plus_one() {
        let mut registry = make_registry();
        let created = registry.create(new_device(4, "Screen C", "Trip circuit"), Utc::now());
        assert_eq!(created.id, 4);
        assert!(created.created_at.is_some());
    }

    #[test]
    fn test_create_after_gap_continues_from_max() {
        let mut registry = make_registry();
        registry.delete(2).unwrap();
        let created = registry.create(new_device(9, "Screen C", "Trip circuit"), Utc::now());
        assert_eq!(created.id, 4);
    }

    #[test]
    fn test_list_orders_by_sequence() {
        let registry = make_registry();
        let sequences: Vec<u32> = registry
            .list(&DeviceFilter::default())
            .iter()
            .map(|d| d.sequence)
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[test]
    fn test_list_applies_filter() {
        let registry = make_registry();
        let filter = DeviceFilter {
            protection_screen: Some("screen a".to_string()),
            ..DeviceFilter::default()
        };
        assert_eq!(registry.list(&filter).len(), 2);
    }

    #[test]
    fn test_update_merges_patch_and_touches_updated_at() {
        // Arrange
        let mut registry = make_registry();
        let later = Utc::now() + chrono::Duration::seconds(60);
        let patch = DevicePatch {
            status: Some(PlateStatus::Off),
            ..DevicePatch::default()
        };

        // Act
        let updated = registry.update(1, patch, later).unwrap();

        // Assert
        assert_eq!(updated.status, Some(PlateStatus::Off));
        assert_eq!(updated.updated_at, Some(later));
        assert_eq!(updated.plate_name, "Busbar protection");
        assert_eq!(registry.get(1).unwrap().status, Some(PlateStatus::Off));
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let mut registry = make_registry();
        let result = registry.update(99, DevicePatch::default(), Utc::now());
        assert_eq!(result, Err(DirectoryError::NotFound(99)));
    }

    #[test]
    fn test_delete_returns_removed_device() {
        let mut registry = make_registry();
        let removed = registry.delete(3).unwrap();
        assert_eq!(removed.plate_name, "Reclose enable");
        assert!(registry.get(3).is_none());
        assert_eq!(registry.delete(3), Err(DirectoryError::NotFound(3)));
    }

    #[test]
    fn test_screens_are_distinct_and_sorted() {
        let registry = make_registry();
        assert_eq!(registry.screens(), vec!["Screen A", "Screen B"]);
    }

    #[test]
    fn test_export_then_import_restores_records() {
        let registry = make_registry();
        let json = registry.export_json().unwrap();

        let mut restored = DeviceRegistry::new();
        let count = restored.import_json(&json).unwrap();

        assert_eq!(count, 3);
        assert_eq!(restored.all(), registry.all());
    }

    #[test]
    fn test_import_rejects_non_array_and_keeps_records() {
        let mut registry = make_registry();
        let result = registry.import_json(r#"{"id": 1}"#);
        assert!(matches!(result, Err(TransferError::NotAnArray)));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_import_rejects_malformed_json() {
        let mut registry = make_registry();
        assert!(matches!(
            registry.import_json("[{"),
            Err(TransferError::Parse(_))
        ));
    }

    #[test]
    fn test_import_rejects_invalid_record() {
        let mut registry = make_registry();
        let result = registry.import_json(r#"[{"id": "seven"}]"#);
        assert!(matches!(result, Err(TransferError::InvalidRecord(_))));
        assert_eq!(registry.len(), 3);
    }
}
