//! AdjustStatusUseCase: switches a plate on or off.
//!
//! An adjustment is two writes: the device record gets the new status, the
//! changer, the change time and the remarks; then the update log records a
//! manual change for the device.  The log is only written once the device
//! update succeeded, so a failed update never leaves a stray log entry.

use chrono::{DateTime, Utc};
use plate_core::{Device, DeviceId, DevicePatch, PlateStatus};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::manage_devices::{DeviceDirectory, DirectoryError};
use super::update_logs::{ChangeType, NewLogEntry, UpdateLogBook, UpdateLogEntry};

/// An operator's request to change a plate's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusAdjustment {
    pub device_id: DeviceId,
    pub status: PlateStatus,
    /// Who made the change; blank falls back to the configured operator.
    #[serde(default)]
    pub changer: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// The updated device and the log entry written for it.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustOutcome {
    pub device: Device,
    pub log: UpdateLogEntry,
}

/// Applies `adjustment` through `directory` and records it in `logs`.
///
/// # Errors
///
/// Returns the directory's error (typically [`DirectoryError::NotFound`])
/// if the device cannot be read or updated; `logs` is left untouched then.
pub async fn adjust_status(
    directory: &dyn DeviceDirectory,
    logs: &mut UpdateLogBook,
    adjustment: StatusAdjustment,
    default_operator: &str,
    now: DateTime<Utc>,
) -> Result<AdjustOutcome, DirectoryError> {
    let (device, change) = apply_adjustment(directory, adjustment, default_operator, now).await?;
    let log = logs.record(change);
    Ok(AdjustOutcome { device, log })
}

/// The device half of [`adjust_status`]: updates the device and returns it
/// with the log entry still to be recorded.
///
/// Callers that guard the log book with its own lock record the entry after
/// this returns, so the device and log locks are never held together.
///
/// # Errors
///
/// Same as [`adjust_status`].
pub async fn apply_adjustment(
    directory: &dyn DeviceDirectory,
    adjustment: StatusAdjustment,
    default_operator: &str,
    now: DateTime<Utc>,
) -> Result<(Device, NewLogEntry), DirectoryError> {
    let StatusAdjustment {
        device_id,
        status,
        changer,
        remarks,
    } = adjustment;

    // Fail early (and without writing) for unknown devices.
    directory.get(device_id).await?;

    let changer = changer
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default_operator.to_string());

    let patch = DevicePatch {
        status: Some(status),
        last_changed_by: Some(changer.clone()),
        last_changed_at: Some(now),
        change_remarks: Some(remarks.unwrap_or_default()),
        ..DevicePatch::default()
    };
    let device = directory.update(device_id, patch).await?;

    info!(device_id, %status, changer = %changer, "plate status adjusted");
    let change = NewLogEntry::for_device(&device, ChangeType::Manual, changer, now, status);
    Ok((device, change))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::manage_devices::MockDeviceDirectory;
    use plate_core::NewDevice;

    fn make_device(id: DeviceId) -> Device {
        NewDevice {
            sequence: 1,
            power_station: "North Station".to_string(),
            protection_screen: "Screen A".to_string(),
            bay: "Bay 1".to_string(),
            plate_name: "Line distance trip".to_string(),
            plate_type: Default::default(),
            plate_box: String::new(),
            plate_verbs: String::new(),
            general_name: String::new(),
            color: Default::default(),
            layer: Default::default(),
            position_x: 1,
            position_y: 1,
            status: Some(PlateStatus::On),
            last_changed_by: None,
            change_remarks: None,
        }
        .into_device(id, Utc::now())
    }

    fn adjustment(changer: Option<&str>) -> StatusAdjustment {
        StatusAdjustment {
            device_id: 7,
            status: PlateStatus::Off,
            changer: changer.map(str::to_string),
            remarks: None,
        }
    }

    #[tokio::test]
    async fn test_adjust_status_updates_device_and_records_log() {
        // Arrange
        let mut directory = MockDeviceDirectory::new();
        directory.expect_get().returning(|id| Ok(make_device(id)));
        directory
            .expect_update()
            .withf(|id, patch| {
                *id == 7
                    && patch.status == Some(PlateStatus::Off)
                    && patch.last_changed_by.as_deref() == Some("Operator Li")
                    && patch.change_remarks.as_deref() == Some("")
            })
            .times(1)
            .returning(|id, patch| {
                let mut device = make_device(id);
                patch.apply(&mut device);
                Ok(device)
            });
        let mut logs = UpdateLogBook::new();
        let now = Utc::now();

        // Act
        let outcome = adjust_status(&directory, &mut logs, adjustment(Some("Operator Li")), "System", now)
            .await
            .expect("adjustment succeeds");

        // Assert
        assert_eq!(outcome.device.status, Some(PlateStatus::Off));
        assert_eq!(outcome.log.device_id, 7);
        assert_eq!(outcome.log.change_type, ChangeType::Manual);
        assert_eq!(outcome.log.change_source, "Operator Li");
        assert_eq!(outcome.log.change_time, now);
        assert_eq!(logs.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_changer_falls_back_to_operator() {
        let mut directory = MockDeviceDirectory::new();
        directory.expect_get().returning(|id| Ok(make_device(id)));
        directory.expect_update().returning(|id, patch| {
            let mut device = make_device(id);
            patch.apply(&mut device);
            Ok(device)
        });
        let mut logs = UpdateLogBook::new();

        let outcome = adjust_status(&directory, &mut logs, adjustment(Some("  ")), "Shift lead", Utc::now())
            .await
            .unwrap();

        assert_eq!(outcome.device.last_changed_by.as_deref(), Some("Shift lead"));
        assert_eq!(outcome.log.change_source, "Shift lead");
    }

    #[tokio::test]
    async fn test_unknown_device_writes_nothing() {
        // Arrange
        let mut directory = MockDeviceDirectory::new();
        directory
            .expect_get()
            .returning(|id| Err(DirectoryError::NotFound(id)));
        directory.expect_update().never();
        let mut logs = UpdateLogBook::new();

        // Act
        let result = adjust_status(&directory, &mut logs, adjustment(None), "System", Utc::now()).await;

        // Assert
        assert_eq!(result, Err(DirectoryError::NotFound(7)));
        assert!(logs.entries().is_empty());
    }

    #[tokio::test]
    async fn test_failed_update_writes_no_log() {
        let mut directory = MockDeviceDirectory::new();
        directory.expect_get().returning(|id| Ok(make_device(id)));
        directory
            .expect_update()
            .returning(|_, _| Err(DirectoryError::Storage("disk full".to_string())));
        let mut logs = UpdateLogBook::new();

        let result = adjust_status(&directory, &mut logs, adjustment(None), "System", Utc::now()).await;

        assert!(matches!(result, Err(DirectoryError::Storage(_))));
        assert!(logs.entries().is_empty());
    }
}
