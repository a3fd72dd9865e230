//! Pressure-plate device record and the payloads used to query and edit it.
//!
//! A [`Device`] is one plate mounted in a protection screen.  Only four of
//! its fields matter to the layout engine (`protection_screen`,
//! `position_x`, `position_y` and `plate_name`); the rest is inventory data
//! shown in the console tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Numeric identifier of a device, unique within the directory.
pub type DeviceId = u64;

/// Whether the plate is a physical switch or a software flag in the relay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateType {
    Soft,
    #[default]
    Hard,
}

/// Colour code painted on the plate; it identifies the plate's function class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateColor {
    #[default]
    Red,
    Yellow,
    Gray,
    Black,
}

/// Vertical band of the cabinet the plate is mounted in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateLayer {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Switch state of a plate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlateStatus {
    /// Plate engaged: the protection function is active.
    #[default]
    On,
    /// Plate withdrawn.
    Off,
}

impl std::fmt::Display for PlateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlateStatus::On => f.pad("on"),
            PlateStatus::Off => f.pad("off"),
        }
    }
}

impl std::str::FromStr for PlateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(PlateStatus::On),
            "off" => Ok(PlateStatus::Off),
            other => Err(format!("unknown plate status: {other}")),
        }
    }
}

impl std::str::FromStr for PlateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(PlateType::Soft),
            "hard" => Ok(PlateType::Hard),
            other => Err(format!("unknown plate type: {other}")),
        }
    }
}

/// One pressure plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    /// Display order in the inventory table.
    pub sequence: u32,
    #[serde(default)]
    pub power_station: String,
    /// Cabinet the plate belongs to; one diagram grid is laid out per screen.
    pub protection_screen: String,
    /// Equipment bay the plate protects.
    #[serde(default)]
    pub bay: String,
    pub plate_name: String,
    #[serde(default)]
    pub plate_type: PlateType,
    #[serde(default)]
    pub plate_box: String,
    /// Verbs used when operating the plate (e.g. "engage, withdraw").
    #[serde(default)]
    pub plate_verbs: String,
    #[serde(default)]
    pub general_name: String,
    #[serde(default)]
    pub color: PlateColor,
    #[serde(default)]
    pub layer: PlateLayer,
    /// 1-based grid row.  Values ≤ 0 mean "unset" and are laid out at row 1.
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub position_x: i64,
    /// 1-based grid column.  Values ≤ 0 mean "unset" and are laid out at column 1.
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub position_y: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlateStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Device {
    /// Status shown to the operator; a plate with no recorded status counts as on.
    pub fn effective_status(&self) -> PlateStatus {
        self.status.unwrap_or_default()
    }

    /// Latest change timestamp, falling back to the record's update time.
    pub fn latest_update(&self) -> Option<DateTime<Utc>> {
        self.last_changed_at.or(self.updated_at)
    }
}

/// Accepts any JSON value for a grid coordinate.
///
/// Integers pass through; floats, strings, booleans and `null` become 0,
/// which the grid builder treats as "unset".
fn lenient_coordinate<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_i64().unwrap_or(0))
}

// ── Directory payloads ────────────────────────────────────────────────────────

/// Criteria for listing devices.  Unset (or empty) criteria match everything.
///
/// Text criteria are case-insensitive substring matches; `plate_type` must
/// match exactly and `status` is compared with the displayed status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protection_screen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate_type: Option<PlateType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PlateStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed_by: Option<String>,
}

impl DeviceFilter {
    /// Returns `true` if `device` satisfies every set criterion.
    pub fn matches(&self, device: &Device) -> bool {
        contains_ci(&device.protection_screen, self.protection_screen.as_deref())
            && contains_ci(&device.bay, self.bay.as_deref())
            && contains_ci(&device.plate_name, self.plate_name.as_deref())
            && contains_ci(
                device.last_changed_by.as_deref().unwrap_or(""),
                self.last_changed_by.as_deref(),
            )
            && self.plate_type.map_or(true, |t| device.plate_type == t)
            && self.status.map_or(true, |s| device.effective_status() == s)
    }
}

fn contains_ci(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        None | Some("") => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

/// Partial update of a device.  `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevicePatch {
    pub sequence: Option<u32>,
    pub power_station: Option<String>,
    pub protection_screen: Option<String>,
    pub bay: Option<String>,
    pub plate_name: Option<String>,
    pub plate_type: Option<PlateType>,
    pub plate_box: Option<String>,
    pub plate_verbs: Option<String>,
    pub general_name: Option<String>,
    pub color: Option<PlateColor>,
    pub layer: Option<PlateLayer>,
    pub position_x: Option<i64>,
    pub position_y: Option<i64>,
    pub status: Option<PlateStatus>,
    pub last_changed_by: Option<String>,
    pub last_changed_at: Option<DateTime<Utc>>,
    pub change_remarks: Option<String>,
}

impl DevicePatch {
    /// Merges the set fields into `device`.  Timestamps are the caller's job.
    pub fn apply(self, device: &mut Device) {
        if let Some(v) = self.sequence {
            device.sequence = v;
        }
        if let Some(v) = self.power_station {
            device.power_station = v;
        }
        if let Some(v) = self.protection_screen {
            device.protection_screen = v;
        }
        if let Some(v) = self.bay {
            device.bay = v;
        }
        if let Some(v) = self.plate_name {
            device.plate_name = v;
        }
        if let Some(v) = self.plate_type {
            device.plate_type = v;
        }
        if let Some(v) = self.plate_box {
            device.plate_box = v;
        }
        if let Some(v) = self.plate_verbs {
            device.plate_verbs = v;
        }
        if let Some(v) = self.general_name {
            device.general_name = v;
        }
        if let Some(v) = self.color {
            device.color = v;
        }
        if let Some(v) = self.layer {
            device.layer = v;
        }
        if let Some(v) = self.position_x {
            device.position_x = v;
        }
        if let Some(v) = self.position_y {
            device.position_y = v;
        }
        if self.status.is_some() {
            device.status = self.status;
        }
        if self.last_changed_by.is_some() {
            device.last_changed_by = self.last_changed_by;
        }
        if self.last_changed_at.is_some() {
            device.last_changed_at = self.last_changed_at;
        }
        if self.change_remarks.is_some() {
            device.change_remarks = self.change_remarks;
        }
    }
}

/// Fields supplied when creating a device; the directory assigns the id and
/// timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDevice {
    pub sequence: u32,
    #[serde(default)]
    pub power_station: String,
    pub protection_screen: String,
    #[serde(default)]
    pub bay: String,
    pub plate_name: String,
    #[serde(default)]
    pub plate_type: PlateType,
    #[serde(default)]
    pub plate_box: String,
    #[serde(default)]
    pub plate_verbs: String,
    #[serde(default)]
    pub general_name: String,
    #[serde(default)]
    pub color: PlateColor,
    #[serde(default)]
    pub layer: PlateLayer,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub position_x: i64,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub position_y: i64,
    #[serde(default)]
    pub status: Option<PlateStatus>,
    #[serde(default)]
    pub last_changed_by: Option<String>,
    #[serde(default)]
    pub change_remarks: Option<String>,
}

impl NewDevice {
    /// Builds the stored record with the given id and creation time.
    pub fn into_device(self, id: DeviceId, now: DateTime<Utc>) -> Device {
        Device {
            id,
            sequence: self.sequence,
            power_station: self.power_station,
            protection_screen: self.protection_screen,
            bay: self.bay,
            plate_name: self.plate_name,
            plate_type: self.plate_type,
            plate_box: self.plate_box,
            plate_verbs: self.plate_verbs,
            general_name: self.general_name,
            color: self.color,
            layer: self.layer,
            position_x: self.position_x,
            position_y: self.position_y,
            status: Some(self.status.unwrap_or_default()),
            last_changed_by: self.last_changed_by,
            last_changed_at: Some(now),
            change_remarks: self.change_remarks,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
