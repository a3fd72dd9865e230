//! Typed access to the console's stored documents.
//!
//! The repository turns the raw strings of a [`KeyValueStore`] into devices,
//! update-log entries and the terminology config.
//!
//! # Data-version gating (for beginners)
//!
//! The device set is stored together with a version marker.  When the
//! marker is missing or differs from [`CURRENT_DATA_VERSION`] (the data was
//! written by an older console), or when the stored JSON cannot be parsed,
//! the repository throws the stored devices away and writes a freshly seeded
//! set instead.  Logs and terminology are more forgiving: malformed content
//! simply loads as empty/default.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use plate_core::{Device, TerminologyConfig};
use thiserror::Error;
use tracing::{info, warn};

use super::local_store::{KeyValueStore, StoreError};
use crate::application::seed::{generate_devices, DEFAULT_RNG_SEED};
use crate::application::update_logs::UpdateLogEntry;

pub const DEVICES_KEY: &str = "pressure_plate_devices";
pub const DATA_VERSION_KEY: &str = "pressure_plate_data_version";
pub const LOGS_KEY: &str = "pressure_plate_update_logs";
pub const TERMINOLOGY_KEY: &str = "terminology_config";

/// Version of the stored device set this console writes and accepts.
pub const CURRENT_DATA_VERSION: &str = "3.3";

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to serialize {key}: {source}")]
    Serialize {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Result of [`ConsoleRepository::load_devices`].
#[derive(Debug, Clone)]
pub struct LoadedDevices {
    pub devices: Vec<Device>,
    /// `true` when the stored set was missing, outdated or unreadable and a
    /// seeded set was written in its place.
    pub reseeded: bool,
}

/// Typed facade over a [`KeyValueStore`].
#[derive(Clone)]
pub struct ConsoleRepository {
    store: Arc<dyn KeyValueStore>,
    rng_seed: u64,
}

impl ConsoleRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            rng_seed: DEFAULT_RNG_SEED,
        }
    }

    /// Uses `seed` for the name generator when seeding.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = seed;
        self
    }

    /// Loads the device set, reseeding when it is missing, outdated or
    /// unreadable.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Store`] if the store itself fails.
    pub fn load_devices(&self, now: DateTime<Utc>) -> Result<LoadedDevices, RepositoryError> {
        let version = self.store.get(DATA_VERSION_KEY)?;
        let stored = self.store.get(DEVICES_KEY)?;

        let reason = match (version.as_deref(), stored) {
            (Some(CURRENT_DATA_VERSION), Some(json)) => {
                match serde_json::from_str::<Vec<Device>>(&json) {
                    Ok(devices) => {
                        info!(count = devices.len(), "device set loaded");
                        return Ok(LoadedDevices {
                            devices,
                            reseeded: false,
                        });
                    }
                    Err(e) => {
                        warn!("stored device set is unreadable: {e}");
                        "unreadable"
                    }
                }
            }
            (Some(CURRENT_DATA_VERSION), None) | (None, _) => "missing",
            (Some(_), _) => "outdated",
        };

        info!(reason, version = CURRENT_DATA_VERSION, "seeding device set");
        let devices = self.seed(now)?;
        Ok(LoadedDevices {
            devices,
            reseeded: true,
        })
    }

    /// Persists the device set.
    pub fn save_devices(&self, devices: &[Device]) -> Result<(), RepositoryError> {
        self.save_json(DEVICES_KEY, devices)
    }

    /// Loads the update log; a missing or malformed document loads as empty.
    pub fn load_logs(&self) -> Result<Vec<UpdateLogEntry>, RepositoryError> {
        let Some(json) = self.store.get(LOGS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&json) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("stored update log is unreadable, starting empty: {e}");
                Ok(Vec::new())
            }
        }
    }

    pub fn save_logs(&self, entries: &[UpdateLogEntry]) -> Result<(), RepositoryError> {
        self.save_json(LOGS_KEY, entries)
    }

    /// Loads the terminology config, normalised; defaults when missing or
    /// malformed.
    pub fn load_terminology(&self) -> Result<TerminologyConfig, RepositoryError> {
        let Some(json) = self.store.get(TERMINOLOGY_KEY)? else {
            return Ok(TerminologyConfig::default());
        };
        match serde_json::from_str::<TerminologyConfig>(&json) {
            Ok(config) => Ok(config.normalized()),
            Err(e) => {
                warn!("stored terminology config is unreadable, using default: {e}");
                Ok(TerminologyConfig::default())
            }
        }
    }

    pub fn save_terminology(&self, config: &TerminologyConfig) -> Result<(), RepositoryError> {
        self.save_json(TERMINOLOGY_KEY, config)
    }

    /// Drops devices and logs and writes a fresh seeded set.
    ///
    /// The terminology config is kept.
    pub fn reset(&self, now: DateTime<Utc>) -> Result<Vec<Device>, RepositoryError> {
        self.store.remove(DATA_VERSION_KEY)?;
        self.store.remove(DEVICES_KEY)?;
        self.store.remove(LOGS_KEY)?;
        let devices = self.seed(now)?;
        self.save_logs(&[])?;
        info!(count = devices.len(), "data reset to seed");
        Ok(devices)
    }

    fn seed(&self, now: DateTime<Utc>) -> Result<Vec<Device>, RepositoryError> {
        let devices = generate_devices(self.rng_seed, now);
        self.save_devices(&devices)?;
        self.store.set(DATA_VERSION_KEY, CURRENT_DATA_VERSION)?;
        Ok(devices)
    }

    fn save_json<T: serde::Serialize + ?Sized>(
        &self,
        key: &'static str,
        value: &T,
    ) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(value)
            .map_err(|source| RepositoryError::Serialize { key, source })?;
        self.store.set(key, &json)?;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
