//! Human readable rendering of a [`State`].

use crate::input::ButtonData;
use crate::ir::IrSource;
use crate::state::{AccelerometerData, State};

pub const TITLE: &str = "=== Wii Remote Input Reader ===";
pub const NO_BUTTONS: &str = "None";
pub const NO_IR_SOURCES: &str = "No IR sources detected";
pub const EXIT_HINT: &str = "Press Ctrl+C to exit";
const RULE_WIDTH: usize = 30;

/// Display labels of the core buttons, in display order.
pub const BUTTON_NAMES: [(ButtonData, &str); 11] = [
    (ButtonData::ONE, "1"),
    (ButtonData::TWO, "2"),
    (ButtonData::A, "A"),
    (ButtonData::B, "B"),
    (ButtonData::PLUS, "PLUS"),
    (ButtonData::MINUS, "MINUS"),
    (ButtonData::HOME, "HOME"),
    (ButtonData::LEFT, "LEFT"),
    (ButtonData::RIGHT, "RIGHT"),
    (ButtonData::UP, "UP"),
    (ButtonData::DOWN, "DOWN"),
];

/// Buttons announced one per line by the simple front end.
const ANNOUNCED_BUTTONS: [(ButtonData, &str); 5] = [
    (ButtonData::A, "A"),
    (ButtonData::B, "B"),
    (ButtonData::ONE, "1"),
    (ButtonData::TWO, "2"),
    (ButtonData::HOME, "HOME"),
];

/// Labels of every held button in [`BUTTON_NAMES`] order.
#[must_use]
pub fn pressed_button_names(buttons: ButtonData) -> Vec<&'static str> {
    BUTTON_NAMES
        .iter()
        .filter(|(button, _)| buttons.contains(*button))
        .map(|(_, name)| *name)
        .collect()
}

#[must_use]
pub fn format_buttons(buttons: ButtonData) -> String {
    let names = pressed_button_names(buttons);
    if names.is_empty() {
        NO_BUTTONS.to_string()
    } else {
        names.join(", ")
    }
}

/// The button bits in binary, `0b0` when nothing is held.
#[must_use]
pub fn format_raw_buttons(buttons: ButtonData) -> String {
    format!("{:#b}", buttons.bits())
}

#[must_use]
pub fn format_accelerometer(accelerometer: &AccelerometerData) -> String {
    format!(
        "X: {:3}, Y: {:3}, Z: {:3}",
        accelerometer.x, accelerometer.y, accelerometer.z
    )
}

/// Present IR sources numbered by their slot, absent slots are skipped.
#[must_use]
pub fn format_ir(sources: &[Option<IrSource>]) -> String {
    let present: Vec<String> = sources
        .iter()
        .enumerate()
        .filter_map(|(index, source)| {
            source.map(|source| {
                format!(
                    "Source{}: ({:3}, {:3}) size:{:3}",
                    index + 1,
                    source.x,
                    source.y,
                    source.size
                )
            })
        })
        .collect();

    if present.is_empty() {
        NO_IR_SOURCES.to_string()
    } else {
        present.join(" | ")
    }
}

/// Battery ratio as a percentage with one decimal.
#[must_use]
pub fn format_battery(ratio: f32) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// The full frame of the reader front end.
#[must_use]
pub fn dashboard(state: &State) -> Vec<String> {
    vec![
        TITLE.to_string(),
        format!("Battery: {}", format_battery(state.battery)),
        "=".repeat(RULE_WIDTH),
        format!("Buttons: {}", format_buttons(state.buttons)),
        format!(
            "Accelerometer: {}",
            format_accelerometer(&state.accelerometer)
        ),
        format!("IR Sensor: {}", format_ir(&state.ir)),
        format!("Raw Button State: {}", format_raw_buttons(state.buttons)),
        String::new(),
        EXIT_HINT.to_string(),
    ]
}

/// One line per held button of the simple front end.
#[must_use]
pub fn press_lines(state: &State) -> Vec<String> {
    ANNOUNCED_BUTTONS
        .iter()
        .filter(|(button, _)| state.buttons.contains(*button))
        .map(|(_, name)| format!("{name} button pressed!"))
        .collect()
}
