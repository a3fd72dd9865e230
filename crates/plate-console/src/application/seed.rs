//! First-run data set: 121 plates on three protection screens.
//!
//! - **Screen A** is a full 9×9 cabinet (81 plates).  Colours are assigned
//!   by position: the first 30 red, the next 28 yellow, then 15 gray and 8
//!   black.  Three of every four plates are on.  Rows 1–3 sit in the top
//!   layer, 4–6 in the middle, 7–9 at the bottom.
//! - **Screens B and C** are 5×4 cabinets (20 plates each).  Colours cycle
//!   through red, yellow and gray and the status alternates, both driven by
//!   the running sequence number and the position.
//!
//! Plate names are drawn from a small substation vocabulary with a seeded
//! RNG, so the same seed always produces the same data set.

use chrono::{DateTime, Utc};
use plate_core::{Device, DeviceId, PlateColor, PlateLayer, PlateStatus, PlateType};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Seed used when the console generates its first-run data.
pub const DEFAULT_RNG_SEED: u64 = 20_240_301;

pub const SEED_POWER_STATION: &str = "North Ridge Power Station";
pub const SEED_CHANGER: &str = "System";

const SUBJECTS: [&str; 12] = [
    "Bus", "Line", "Main", "Gen", "Tie", "Aux", "Cap", "PT", "CT", "LV", "HV", "Feeder",
];
const FUNCTIONS: [&str; 8] = ["diff", "backup", "dist", "earth", "trip", "signal", "arc", "xfer"];
const QUALIFIERS: [&str; 8] = [
    "enable", "block", "permit", "test", "remote", "local", "reset", "check",
];

/// Builds a plate name of 10–20 characters.
///
/// Every vocabulary entry is at most 6 characters, so "subject function
/// qualifier" never exceeds 20 and never drops below 11.
fn plate_name(rng: &mut StdRng) -> String {
    let subject = SUBJECTS[rng.gen_range(0..SUBJECTS.len())];
    let function = FUNCTIONS[rng.gen_range(0..FUNCTIONS.len())];
    let qualifier = QUALIFIERS[rng.gen_range(0..QUALIFIERS.len())];
    format!("{subject} {function} {qualifier}")
}

fn screen_a_color(index: u32) -> PlateColor {
    match index {
        0..=30 => PlateColor::Red,
        31..=58 => PlateColor::Yellow,
        59..=73 => PlateColor::Gray,
        _ => PlateColor::Black,
    }
}

struct SeedBuilder {
    rng: StdRng,
    now: DateTime<Utc>,
    next_id: DeviceId,
    next_sequence: u32,
    devices: Vec<Device>,
}

impl SeedBuilder {
    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        screen: &str,
        index: u32,
        x: i64,
        y: i64,
        color: PlateColor,
        layer: PlateLayer,
        status: PlateStatus,
    ) {
        let device = Device {
            id: self.next_id,
            sequence: self.next_sequence,
            power_station: SEED_POWER_STATION.to_string(),
            protection_screen: screen.to_string(),
            bay: format!("Bay {index}"),
            plate_name: plate_name(&mut self.rng),
            plate_type: PlateType::Hard,
            plate_box: format!("{screen} box"),
            plate_verbs: "engage, withdraw".to_string(),
            general_name: "General plate".to_string(),
            color,
            layer,
            position_x: x,
            position_y: y,
            status: Some(status),
            last_changed_by: Some(SEED_CHANGER.to_string()),
            last_changed_at: Some(self.now),
            change_remarks: Some(String::new()),
            created_at: Some(self.now),
            updated_at: Some(self.now),
        };
        self.devices.push(device);
        self.next_id += 1;
        self.next_sequence += 1;
    }
}

/// Generates the first-run device set.
pub fn generate_devices(rng_seed: u64, now: DateTime<Utc>) -> Vec<Device> {
    let mut builder = SeedBuilder {
        rng: StdRng::seed_from_u64(rng_seed),
        now,
        next_id: 1,
        next_sequence: 1,
        devices: Vec::with_capacity(121),
    };

    for x in 1..=9i64 {
        for y in 1..=9i64 {
            let index = ((x - 1) * 9 + y) as u32;
            let layer = match x {
                1..=3 => PlateLayer::Top,
                4..=6 => PlateLayer::Middle,
                _ => PlateLayer::Bottom,
            };
            let status = if (index - 1) % 4 < 3 {
                PlateStatus::On
            } else {
                PlateStatus::Off
            };
            builder.push("Screen A", index, x, y, screen_a_color(index), layer, status);
        }
    }

    const CYCLE: [PlateColor; 3] = [PlateColor::Red, PlateColor::Yellow, PlateColor::Gray];
    for screen in ["Screen B", "Screen C"] {
        for x in 1..=5i64 {
            for y in 1..=4i64 {
                let index = ((x - 1) * 4 + y) as u32;
                let layer = match x {
                    1..=2 => PlateLayer::Top,
                    3..=4 => PlateLayer::Middle,
                    _ => PlateLayer::Bottom,
                };
                let mix = builder.next_sequence as i64 + x + y;
                let color = CYCLE[(mix % 3) as usize];
                let status = if mix % 2 == 0 {
                    PlateStatus::On
                } else {
                    PlateStatus::Off
                };
                builder.push(screen, index, x, y, color, layer, status);
            }
        }
    }

    builder.devices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Vec<Device> {
        generate_devices(DEFAULT_RNG_SEED, Utc::now())
    }

    fn screen<'a>(devices: &'a [Device], name: &str) -> Vec<&'a Device> {
        devices.iter().filter(|d| d.protection_screen == name).collect()
    }

    #[test]
    fn test_seed_has_121_devices_with_sequential_ids() {
        let devices = seeded();
        assert_eq!(devices.len(), 121);
        assert!(devices
            .iter()
            .enumerate()
            .all(|(i, d)| d.id == i as u64 + 1 && d.sequence == i as u32 + 1));
    }

    #[test]
    fn test_screen_a_color_distribution() {
        let devices = seeded();
        let a = screen(&devices, "Screen A");
        let count = |c: PlateColor| a.iter().filter(|d| d.color == c).count();
        assert_eq!(a.len(), 81);
        assert_eq!(count(PlateColor::Red), 30);
        assert_eq!(count(PlateColor::Yellow), 28);
        assert_eq!(count(PlateColor::Gray), 15);
        assert_eq!(count(PlateColor::Black), 8);
    }

    #[test]
    fn test_screen_a_status_ratio_is_three_to_one() {
        let devices = seeded();
        let a = screen(&devices, "Screen A");
        let off = a.iter().filter(|d| d.status == Some(PlateStatus::Off)).count();
        // indices 4, 8, ..., 80 are off
        assert_eq!(off, 20);
        assert_eq!(a.len() - off, 61);
    }

    #[test]
    fn test_screen_a_layers_follow_row_thirds() {
        let devices = seeded();
        let a = screen(&devices, "Screen A");
        assert!(a
            .iter()
            .filter(|d| d.position_x <= 3)
            .all(|d| d.layer == PlateLayer::Top));
        assert!(a
            .iter()
            .filter(|d| d.position_x >= 7)
            .all(|d| d.layer == PlateLayer::Bottom));
    }

    #[test]
    fn test_screens_b_and_c_are_five_by_four() {
        let devices = seeded();
        for name in ["Screen B", "Screen C"] {
            let s = screen(&devices, name);
            assert_eq!(s.len(), 20);
            assert_eq!(s.iter().map(|d| d.position_x).max(), Some(5));
            assert_eq!(s.iter().map(|d| d.position_y).max(), Some(4));
            assert!(s.iter().all(|d| d.color != PlateColor::Black));
        }
    }

    #[test]
    fn test_plate_names_are_ten_to_twenty_chars() {
        for device in seeded() {
            let len = device.plate_name.chars().count();
            assert!((10..=20).contains(&len), "{:?} has {len} chars", device.plate_name);
        }
    }

    #[test]
    fn test_same_seed_produces_same_names() {
        let now = Utc::now();
        let first: Vec<String> = generate_devices(7, now).into_iter().map(|d| d.plate_name).collect();
        let second: Vec<String> = generate_devices(7, now).into_iter().map(|d| d.plate_name).collect();
        assert_eq!(first, second);
    }
}
