//! The sampled state of a Wii remote.
//!
//! A [`State`] is an immutable copy of the latest values of every enabled
//! reporting channel. Drivers keep one up to date and hand out copies.

use bitflags::bitflags;

use crate::input::ButtonData;
use crate::ir::IrSource;

/// Raw battery level of a full set of batteries as reported in the status report.
pub const BATTERY_MAX: u8 = 0xD0;

bitflags! {
    /// Categories of data included in each snapshot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Channels: u8 {
        const BUTTONS = 0b001;
        const ACCELEROMETER = 0b010;
        const IR = 0b100;
    }
}

/// The raw accelerometer data from the Wii remote, around 512 when at rest on an axis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AccelerometerData {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl AccelerometerData {
    #[must_use]
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// The first two bytes are button data, the next three bytes are acceleration data.
    ///
    /// X has 10 bits of precision, Y and Z only 9; the missing LSBs are stored in the button bytes.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)] // 10 bit values
    pub const fn from_normal_reporting(data: &[u8]) -> Self {
        Self {
            x: (((data[2] as u16) << 2) | (((data[0] as u16) >> 5) & 0b11)) as i16,
            y: (((data[3] as u16) << 2) | (((data[1] as u16) >> 4) & 0b10)) as i16,
            z: (((data[4] as u16) << 2) | (((data[1] as u16) >> 5) & 0b10)) as i16,
        }
    }
}

/// One sampled reading of all enabled channels.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct State {
    pub buttons: ButtonData,
    pub accelerometer: AccelerometerData,
    pub ir: [Option<IrSource>; 4],
    /// Battery charge in `[0, 1]`.
    pub battery: f32,
}

impl State {
    /// Returns whether every button in `buttons` is held.
    #[must_use]
    pub const fn is_pressed(&self, buttons: ButtonData) -> bool {
        self.buttons.contains(buttons)
    }
}

/// Converts the raw status report battery level to a ratio in `[0, 1]`.
#[must_use]
pub fn battery_ratio(level: u8) -> f32 {
    (f32::from(level) / f32::from(BATTERY_MAX)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_ratio_is_clamped() {
        assert_eq!(battery_ratio(0), 0.0);
        assert_eq!(battery_ratio(BATTERY_MAX), 1.0);
        assert_eq!(battery_ratio(0xFF), 1.0);
        assert!((battery_ratio(0x68) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_is_pressed() {
        let state = State {
            buttons: ButtonData::A | ButtonData::HOME,
            ..State::default()
        };

        assert!(state.is_pressed(ButtonData::HOME));
        assert!(state.is_pressed(ButtonData::A | ButtonData::HOME));
        assert!(!state.is_pressed(ButtonData::B));
    }

    #[test]
    fn test_neutral_accelerometer() {
        let data = [0u8, 0, 0x80, 0x80, 0x80];

        assert_eq!(
            AccelerometerData::from_normal_reporting(&data),
            AccelerometerData::new(512, 512, 512)
        );
    }
}
