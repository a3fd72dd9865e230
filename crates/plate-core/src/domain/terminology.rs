//! Plate terminology: the order in which descriptive fields form a label.
//!
//! Operators refer to a plate by a compound name such as
//! `"Screen A-Bay 12-Line distance trip"`.  Sites disagree on the order of
//! the parts, and hard and soft plates are often named differently, so the
//! order is configurable per plate type.

use serde::{Deserialize, Serialize};

use super::device::{Device, PlateType};

/// One descriptive field of a plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminologyKey {
    ProtectionScreen,
    Bay,
    PlateName,
}

impl TerminologyKey {
    /// Order used when nothing (or nothing valid) is configured.
    pub const DEFAULT_ORDER: [TerminologyKey; 3] = [
        TerminologyKey::ProtectionScreen,
        TerminologyKey::Bay,
        TerminologyKey::PlateName,
    ];

    fn field<'a>(&self, device: &'a Device) -> &'a str {
        match self {
            TerminologyKey::ProtectionScreen => &device.protection_screen,
            TerminologyKey::Bay => &device.bay,
            TerminologyKey::PlateName => &device.plate_name,
        }
    }
}

impl std::str::FromStr for TerminologyKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "protection_screen" | "screen" => Ok(TerminologyKey::ProtectionScreen),
            "bay" => Ok(TerminologyKey::Bay),
            "plate_name" | "name" => Ok(TerminologyKey::PlateName),
            other => Err(format!("unknown terminology key: {other}")),
        }
    }
}

/// Field order for hard and soft plates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminologyConfig {
    #[serde(default)]
    pub hard: Vec<TerminologyKey>,
    #[serde(default)]
    pub soft: Vec<TerminologyKey>,
}

impl Default for TerminologyConfig {
    fn default() -> Self {
        Self {
            hard: TerminologyKey::DEFAULT_ORDER.to_vec(),
            soft: TerminologyKey::DEFAULT_ORDER.to_vec(),
        }
    }
}

impl TerminologyConfig {
    /// Drops repeated keys and restores the default order for empty lists.
    pub fn normalized(self) -> Self {
        Self {
            hard: normalize_order(self.hard),
            soft: normalize_order(self.soft),
        }
    }

    /// Field order for the given plate type.
    pub fn order_for(&self, plate_type: PlateType) -> &[TerminologyKey] {
        match plate_type {
            PlateType::Hard => &self.hard,
            PlateType::Soft => &self.soft,
        }
    }

    /// Joins the device's fields in configured order, skipping empty ones.
    pub fn compose_label(&self, device: &Device) -> String {
        self.order_for(device.plate_type)
            .iter()
            .map(|key| key.field(device).trim())
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

fn normalize_order(keys: Vec<TerminologyKey>) -> Vec<TerminologyKey> {
    let mut seen = Vec::with_capacity(keys.len());
    for key in keys {
        if !seen.contains(&key) {
            seen.push(key);
        }
    }
    if seen.is_empty() {
        TerminologyKey::DEFAULT_ORDER.to_vec()
    } else {
        seen
    }
}
