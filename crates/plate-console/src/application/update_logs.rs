//! Update log book: the status-change history shown on the logs page.
//!
//! The book keeps **one entry per device**.  Recording a change for a
//! device that already has an entry overwrites that entry in place (and
//! makes it visible again); only the first change of a device creates a new
//! entry, with `id = max + 1`.
//!
//! Entries loaded from older data sets may still hold several entries for
//! the same device, so every query first reduces the book to the newest
//! entry per device.  The display `sequence` is not stored meaningfully; it
//! is renumbered from 1 over each result set.
//!
//! Hiding is a soft delete: hidden entries stay in the book and can be
//! restored by id or by time range.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use plate_core::{Device, DeviceId, PlateStatus, PlateType};
use serde::{Deserialize, Serialize};

/// Numeric identifier of a log entry.
pub type LogId = u64;

/// How a status change came about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// An operator adjusted the plate in the console.
    #[default]
    Manual,
    /// Any value this version does not know; kept so old logs still load.
    #[serde(other)]
    Other,
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(ChangeType::Manual),
            "other" => Ok(ChangeType::Other),
            other => Err(format!("unknown change type: {other}")),
        }
    }
}

/// One row of the update log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateLogEntry {
    pub id: LogId,
    pub device_id: DeviceId,
    /// Display position inside the last query result, 1-based.
    #[serde(default)]
    pub sequence: u32,
    #[serde(default)]
    pub power_station: String,
    #[serde(default)]
    pub protection_screen: String,
    #[serde(default)]
    pub bay: String,
    #[serde(default)]
    pub plate_name: String,
    #[serde(default)]
    pub plate_type: PlateType,
    #[serde(default)]
    pub change_type: ChangeType,
    /// Who or what made the change (the operator name for manual changes).
    #[serde(default)]
    pub change_source: String,
    pub change_time: DateTime<Utc>,
    pub status: PlateStatus,
    #[serde(default)]
    pub hidden: bool,
}

/// Payload for [`UpdateLogBook::record`]; the book assigns id and sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub device_id: DeviceId,
    pub power_station: String,
    pub protection_screen: String,
    pub bay: String,
    pub plate_name: String,
    pub plate_type: PlateType,
    pub change_type: ChangeType,
    pub change_source: String,
    pub change_time: DateTime<Utc>,
    pub status: PlateStatus,
}

impl NewLogEntry {
    /// Copies the descriptive fields from `device`.
    pub fn for_device(
        device: &Device,
        change_type: ChangeType,
        change_source: impl Into<String>,
        change_time: DateTime<Utc>,
        status: PlateStatus,
    ) -> Self {
        Self {
            device_id: device.id,
            power_station: device.power_station.clone(),
            protection_screen: device.protection_screen.clone(),
            bay: device.bay.clone(),
            plate_name: device.plate_name.clone(),
            plate_type: device.plate_type,
            change_type,
            change_source: change_source.into(),
            change_time,
            status,
        }
    }
}

/// Viewer filters.  Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogQuery {
    #[serde(default)]
    pub device_id: Option<DeviceId>,
    #[serde(default)]
    pub change_type: Option<ChangeType>,
    #[serde(default)]
    pub status: Option<PlateStatus>,
    /// Substring of the change source.
    #[serde(default)]
    pub source: Option<String>,
    /// Inclusive lower bound on the change time.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the change time.
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub include_hidden: bool,
}

impl LogQuery {
    fn matches(&self, entry: &UpdateLogEntry) -> bool {
        (self.include_hidden || !entry.hidden)
            && self.change_type.map_or(true, |t| entry.change_type == t)
            && self.status.map_or(true, |s| entry.status == s)
            && self
                .source
                .as_deref()
                .map_or(true, |s| s.is_empty() || entry.change_source.contains(s))
            && in_range(entry.change_time, self.from, self.to)
    }
}

/// Expands a calendar-day range into inclusive UTC bounds:
/// the start of `first` to the last millisecond of `last`.
pub fn day_range(first: NaiveDate, last: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = first.and_time(NaiveTime::MIN);
    let end = last.and_time(NaiveTime::MIN) + Duration::days(1) - Duration::milliseconds(1);
    (Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end))
}

fn in_range(ts: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.map_or(true, |f| ts >= f) && to.map_or(true, |t| ts <= t)
}

/// The in-memory log book.
#[derive(Debug, Default, Clone)]
pub struct UpdateLogBook {
    entries: Vec<UpdateLogEntry>,
}

impl UpdateLogBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<UpdateLogEntry>) -> Self {
        Self { entries }
    }

    /// Raw entries in storage order, hidden ones included.
    pub fn entries(&self) -> &[UpdateLogEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Records a change, overwriting the device's existing entry if any.
    pub fn record(&mut self, change: NewLogEntry) -> UpdateLogEntry {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.device_id == change.device_id)
        {
            let id = existing.id;
            *existing = entry_from(id, change);
            return existing.clone();
        }

        let next_id = self.entries.iter().map(|e| e.id).max().unwrap_or(0) + 1;
        let entry = entry_from(next_id, change);
        self.entries.push(entry.clone());
        entry
    }

    /// Newest entry per device (or just for `device_id`), newest first,
    /// hidden entries included.
    pub fn latest(&self, device_id: Option<DeviceId>) -> Vec<UpdateLogEntry> {
        let mut newest: HashMap<DeviceId, &UpdateLogEntry> = HashMap::new();
        for entry in &self.entries {
            if device_id.is_some_and(|id| id != entry.device_id) {
                continue;
            }
            newest
                .entry(entry.device_id)
                .and_modify(|current| {
                    if entry.change_time > current.change_time {
                        *current = entry;
                    }
                })
                .or_insert(entry);
        }

        let mut result: Vec<UpdateLogEntry> = newest.into_values().cloned().collect();
        sort_newest_first(&mut result);
        renumber(&mut result);
        result
    }

    /// Newest entry per device, filtered for the viewer and renumbered.
    ///
    /// The newest-per-device reduction happens before filtering: a device
    /// whose newest entry is hidden does not fall back to an older one.
    pub fn query(&self, query: &LogQuery) -> Vec<UpdateLogEntry> {
        let mut result: Vec<UpdateLogEntry> = self
            .latest(query.device_id)
            .into_iter()
            .filter(|e| query.matches(e))
            .collect();
        renumber(&mut result);
        result
    }

    /// Sets `hidden` on every entry whose id is listed; returns how many
    /// entries matched.
    pub fn set_hidden_by_ids(&mut self, ids: &[LogId], hidden: bool) -> usize {
        let mut changed = 0;
        for entry in self.entries.iter_mut().filter(|e| ids.contains(&e.id)) {
            entry.hidden = hidden;
            changed += 1;
        }
        changed
    }

    /// Sets `hidden` on entries of `device_id` (or every device) whose change
    /// time lies in the inclusive range.  Entries already in the target state
    /// are skipped and not counted.
    pub fn set_hidden_in_range(
        &mut self,
        device_id: Option<DeviceId>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        hidden: bool,
    ) -> usize {
        let mut changed = 0;
        for entry in &mut self.entries {
            if entry.hidden == hidden {
                continue;
            }
            if device_id.is_some_and(|id| id != entry.device_id) {
                continue;
            }
            if in_range(entry.change_time, from, to) {
                entry.hidden = hidden;
                changed += 1;
            }
        }
        changed
    }
}

fn entry_from(id: LogId, change: NewLogEntry) -> UpdateLogEntry {
    UpdateLogEntry {
        id,
        device_id: change.device_id,
        sequence: 0,
        power_station: change.power_station,
        protection_screen: change.protection_screen,
        bay: change.bay,
        plate_name: change.plate_name,
        plate_type: change.plate_type,
        change_type: change.change_type,
        change_source: change.change_source,
        change_time: change.change_time,
        status: change.status,
        hidden: false,
    }
}

/// Newest first; ties broken by id so the order is deterministic.
fn sort_newest_first(entries: &mut [UpdateLogEntry]) {
    entries.sort_by(|a, b| b.change_time.cmp(&a.change_time).then(a.id.cmp(&b.id)));
}

fn renumber(entries: &mut [UpdateLogEntry]) {
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.sequence = index as u32 + 1;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn change(device_id: DeviceId, minutes: i64, status: PlateStatus, source: &str) -> NewLogEntry {
        NewLogEntry {
            device_id,
            power_station: "North Station".to_string(),
            protection_screen: "Screen A".to_string(),
            bay: format!("Bay {device_id}"),
            plate_name: format!("Plate {device_id}"),
            plate_type: PlateType::Hard,
            change_type: ChangeType::Manual,
            change_source: source.to_string(),
            change_time: at(minutes),
            status,
        }
    }

    fn make_book() -> UpdateLogBook {
        let mut book = UpdateLogBook::new();
        book.record(change(1, 0, PlateStatus::Off, "Operator Li"));
        book.record(change(2, 10, PlateStatus::On, "Operator Wang"));
        book.record(change(3, 20, PlateStatus::Off, "Operator Li"));
        book
    }

    // ── record ────────────────────────────────────────────────────────────────

    #[test]
    fn test_record_new_device_assigns_max_plus_one() {
        let mut book = make_book();
        let entry = book.record(change(9, 30, PlateStatus::On, "Operator Li"));
        assert_eq!(entry.id, 4);
        assert!(!entry.hidden);
    }

    #[test]
    fn test_record_existing_device_overwrites_and_unhides() {
        // Arrange
        let mut book = make_book();
        book.set_hidden_by_ids(&[1], true);

        // Act
        let entry = book.record(change(1, 40, PlateStatus::On, "Operator Zhao"));

        // Assert
        assert_eq!(entry.id, 1);
        assert!(!entry.hidden);
        assert_eq!(entry.sequence, 0);
        assert_eq!(entry.change_source, "Operator Zhao");
        assert_eq!(book.entries().len(), 3);
    }

    // ── latest / query ────────────────────────────────────────────────────────

    #[test]
    fn test_latest_is_newest_first_and_renumbered() {
        let book = make_book();
        let latest = book.latest(None);
        let ids: Vec<DeviceId> = latest.iter().map(|e| e.device_id).collect();
        let seqs: Vec<u32> = latest.iter().map(|e| e.sequence).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn test_latest_reduces_legacy_duplicates_to_newest() {
        let older = entry_from(1, change(5, 0, PlateStatus::On, "a"));
        let newer = entry_from(2, change(5, 50, PlateStatus::Off, "b"));
        let book = UpdateLogBook::from_entries(vec![older, newer]);

        let latest = book.latest(Some(5));

        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id, 2);
        assert_eq!(latest[0].sequence, 1);
    }

    #[test]
    fn test_latest_for_unknown_device_is_empty() {
        assert!(make_book().latest(Some(42)).is_empty());
    }

    #[test]
    fn test_query_excludes_hidden_unless_requested() {
        let mut book = make_book();
        book.set_hidden_by_ids(&[2], true);

        let visible = book.query(&LogQuery::default());
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[1].sequence, 2);

        let all = book.query(&LogQuery {
            include_hidden: true,
            ..LogQuery::default()
        });
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_query_filters_by_status_source_and_range() {
        let book = make_book();
        let query = LogQuery {
            status: Some(PlateStatus::Off),
            source: Some("Li".to_string()),
            from: Some(at(5)),
            to: Some(at(20)),
            ..LogQuery::default()
        };
        let result = book.query(&query);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].device_id, 3);
    }

    #[test]
    fn test_query_by_change_type() {
        let book = make_book();
        let query = LogQuery {
            change_type: Some(ChangeType::Other),
            ..LogQuery::default()
        };
        assert!(book.query(&query).is_empty());
    }

    // ── hide / restore ────────────────────────────────────────────────────────

    #[test]
    fn test_set_hidden_by_ids_counts_matches() {
        let mut book = make_book();
        assert_eq!(book.set_hidden_by_ids(&[1, 3, 99], true), 2);
        assert!(book.entries()[0].hidden);
        assert!(!book.entries()[1].hidden);
    }

    #[test]
    fn test_set_hidden_in_range_skips_entries_already_in_state() {
        // Arrange
        let mut book = make_book();
        book.set_hidden_by_ids(&[1], true);

        // Act: hide everything up to minute 10
        let changed = book.set_hidden_in_range(None, None, Some(at(10)), true);

        // Assert: entry 1 was already hidden; only entry 2 changed
        assert_eq!(changed, 1);
    }

    #[test]
    fn test_set_hidden_in_range_bounds_are_inclusive() {
        let mut book = make_book();
        let changed = book.set_hidden_in_range(None, Some(at(10)), Some(at(20)), true);
        assert_eq!(changed, 2);
    }

    #[test]
    fn test_restore_in_range_for_single_device() {
        let mut book = make_book();
        book.set_hidden_in_range(None, None, None, true);
        let restored = book.set_hidden_in_range(Some(2), None, None, false);
        assert_eq!(restored, 1);
        assert_eq!(book.query(&LogQuery::default()).len(), 1);
    }

    // ── serde / helpers ───────────────────────────────────────────────────────

    #[test]
    fn test_unknown_change_type_loads_as_other() {
        let json = r#"{
            "id": 1, "device_id": 2, "change_type": "bulk_edit",
            "change_time": "2024-03-01T08:00:00Z", "status": "on"
        }"#;
        let entry: UpdateLogEntry = serde_json::from_str(json).expect("deserialize");
        assert_eq!(entry.change_type, ChangeType::Other);
        assert!(!entry.hidden);
    }

    #[test]
    fn test_day_range_covers_whole_days() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let (start, end) = day_range(day, day);
        assert!(in_range(at(0), Some(start), Some(end)));
        assert!(in_range(at(15 * 60 + 59), Some(start), Some(end)));
        assert!(!in_range(at(16 * 60), Some(start), Some(end)));
    }
}
