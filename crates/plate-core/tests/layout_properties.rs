//! Property-style tests for the grid builder and scale resolver working
//! together on real `Device` records.

use chrono::Utc;
use plate_core::{
    build_grid, chunk_label, group_by_screen, resolve_layout, Device, LimitingAxis, NewDevice,
    ProfileKind, Viewport, DEFAULT_LABEL_CHUNK,
};

fn make_device(id: u64, screen: &str, x: i64, y: i64) -> Device {
    NewDevice {
        sequence: id as u32,
        power_station: "North Station".to_string(),
        protection_screen: screen.to_string(),
        bay: format!("Bay {id}"),
        plate_name: format!("Plate number {id}"),
        plate_type: Default::default(),
        plate_box: String::new(),
        plate_verbs: String::new(),
        general_name: String::new(),
        color: Default::default(),
        layer: Default::default(),
        position_x: x,
        position_y: y,
        status: None,
        last_changed_by: None,
        change_remarks: None,
    }
    .into_device(id, Utc::now())
}

fn nine_by_nine() -> Vec<Device> {
    let mut devices = Vec::new();
    let mut id = 1;
    for x in 1..=9 {
        for y in 1..=9 {
            devices.push(make_device(id, "Screen A", x, y));
            id += 1;
        }
    }
    devices
}

#[test]
fn test_nine_by_nine_screen_end_to_end() {
    let devices = nine_by_nine();
    let grid = build_grid(&devices);
    assert_eq!((grid.rows(), grid.cols()), (9, 9));
    assert_eq!(grid.occupied(), 81);

    let available = Viewport::new(900.0, 700.0);
    let layout = resolve_layout(grid.rows(), grid.cols(), available);

    assert_eq!(layout.profile, ProfileKind::Compact);
    assert_eq!(layout.limiting_axis, LimitingAxis::Height);
    assert!(layout.scale > 0.0 && layout.scale <= 1.0);
    assert!(layout.gap_y < 4.0);
    assert!(layout.grid_width <= 900.0 + 1e-6);
    assert!(layout.grid_height <= 700.0 + 1e-6);
}

#[test]
fn test_every_device_lands_in_its_cell() {
    let devices = nine_by_nine();
    let grid = build_grid(&devices);
    for device in &devices {
        let cell = grid
            .get(device.position_x as usize - 1, device.position_y as usize - 1)
            .expect("cell must be occupied");
        assert_eq!(cell.id, device.id);
    }
}

#[test]
fn test_duplicate_coordinates_keep_later_device() {
    let devices = vec![
        make_device(1, "Screen B", 2, 3),
        make_device(2, "Screen B", 2, 3),
    ];
    let grid = build_grid(&devices);
    assert_eq!(grid.get(1, 2).map(|d| d.id), Some(2));
}

#[test]
fn test_screens_are_laid_out_independently() {
    let mut devices = nine_by_nine();
    devices.push(make_device(100, "Screen B", 2, 2));

    let groups = group_by_screen(&devices);
    let names: Vec<&str> = groups.keys().copied().collect();
    assert_eq!(names, vec!["Screen A", "Screen B"]);

    let screen_b = build_grid(groups["Screen B"].iter().copied());
    assert_eq!((screen_b.rows(), screen_b.cols()), (2, 2));
    let layout = resolve_layout(screen_b.rows(), screen_b.cols(), Viewport::new(900.0, 700.0));
    assert_eq!(layout.profile, ProfileKind::Standard);
}

#[test]
fn test_same_inputs_give_same_outputs() {
    let devices = nine_by_nine();
    let viewport = Viewport::new(1280.0, 720.0);
    let first = build_grid(&devices);
    let second = build_grid(&devices);
    assert_eq!(first, second);
    assert_eq!(
        resolve_layout(first.rows(), first.cols(), viewport),
        resolve_layout(second.rows(), second.cols(), viewport)
    );
}

#[test]
fn test_device_names_wrap_at_default_width() {
    let device = make_device(12, "Screen A", 1, 1);
    let lines = chunk_label(&device.plate_name, DEFAULT_LABEL_CHUNK);
    assert_eq!(lines, vec!["Plate numb", "er 12"]);
}
