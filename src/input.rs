use crate::ir::IrSource;
use crate::prelude::*;
use crate::state::AccelerometerData;
use bitflags::bitflags;

const STATUS_ID: u8 = 0x20;
const ACKNOWLEDGE_ID: u8 = 0x22;

pub const BUTTONS_MODE: u8 = 0x30;
pub const BUTTONS_ACCELEROMETER_MODE: u8 = 0x31;
pub const BUTTONS_ACCELEROMETER_IR12_MODE: u8 = 0x33;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ButtonData: u16 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const DOWN = 1 << 2;
        const UP = 1 << 3;
        const PLUS = 1 << 4;

        const TWO = 1 << 8;
        const ONE = 1 << 9;
        const B = 1 << 10;
        const A = 1 << 11;
        const MINUS = 1 << 12;

        const HOME = 1 << 15;
    }
}

impl ButtonData {
    /// Reads the two core button bytes.
    ///
    /// Bits 5 and 6 of both bytes carry accelerometer LSBs in some modes, so only known buttons are kept.
    #[must_use]
    pub const fn from_report_bytes(low: u8, high: u8) -> Self {
        Self::from_bits_truncate(u16::from_le_bytes([low, high]))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StatusData {
    buttons: ButtonData,
    battery_level: u8,
}

impl StatusData {
    /// Parses the payload following the report ID.
    fn from_payload(payload: &[u8]) -> WiimoteResult<Self> {
        if payload.len() < 6 {
            return Err(WiimoteDeviceError::InvalidData.into());
        }
        Ok(Self {
            buttons: ButtonData::from_report_bytes(payload[0], payload[1]),
            battery_level: payload[5],
        })
    }

    /// Returns the core button data.
    #[must_use]
    pub const fn buttons(&self) -> ButtonData {
        self.buttons
    }

    /// Returns the raw battery level.
    #[must_use]
    pub const fn battery_level(&self) -> u8 {
        self.battery_level
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AcknowledgeData {
    buttons: ButtonData,
    report_number: u8,
    error_code: u8,
}

impl AcknowledgeData {
    fn from_payload(payload: &[u8]) -> WiimoteResult<Self> {
        if payload.len() < 4 {
            return Err(WiimoteDeviceError::InvalidData.into());
        }
        Ok(Self {
            buttons: ButtonData::from_report_bytes(payload[0], payload[1]),
            report_number: payload[2],
            error_code: payload[3],
        })
    }

    /// Returns the core button data.
    #[must_use]
    pub const fn buttons(&self) -> ButtonData {
        self.buttons
    }

    /// Returns the output report number this acknowledges.
    #[must_use]
    pub const fn report_number(&self) -> u8 {
        self.report_number
    }

    /// Returns the error code, 0 on success.
    #[must_use]
    pub const fn error_code(&self) -> u8 {
        self.error_code
    }
}

#[derive(Debug, Clone)]
pub struct WiimoteData {
    pub data: [u8; 21],
}

impl WiimoteData {
    /// Returns the core button data.
    #[must_use]
    pub const fn buttons(&self) -> ButtonData {
        ButtonData::from_report_bytes(self.data[0], self.data[1])
    }

    /// Returns the accelerometer reading for modes that carry one.
    #[must_use]
    pub fn accelerometer(&self, mode: u8) -> Option<AccelerometerData> {
        match mode {
            BUTTONS_ACCELEROMETER_MODE | BUTTONS_ACCELEROMETER_IR12_MODE => {
                Some(AccelerometerData::from_normal_reporting(&self.data))
            }
            _ => None,
        }
    }

    /// Returns the IR objects for modes that carry camera data.
    #[must_use]
    pub fn ir_sources(&self, mode: u8) -> Option<[Option<IrSource>; 4]> {
        match mode {
            BUTTONS_ACCELEROMETER_IR12_MODE => {
                let mut bytes = [0u8; 12];
                bytes.copy_from_slice(&self.data[5..17]);
                Some(IrSource::from_extended(&bytes))
            }
            _ => None,
        }
    }
}

/// An input report represents the data sent from the Wii remote to the computer.
#[derive(Debug, Clone)]
pub enum InputReport {
    /// Status information report (ID 0x20).
    ///
    /// Sent when requested with output report 0x15 and whenever an extension is plugged or unplugged.
    /// An unrequested status report resets the data reporting mode.
    ///
    /// WiiBrew Documentation: https://www.wiibrew.org/wiki/Wiimote#0x20:_Status
    StatusInformation(StatusData),
    /// Acknowledge report (ID 0x22).
    ///
    /// WiiBrew Documentation: https://www.wiibrew.org/wiki/Wiimote#0x22:_Acknowledge_output_report.2C_return_function_result
    Acknowledge(AcknowledgeData),
    /// Data report (IDs 0x30-0x3F).
    ///
    /// The contents depend on the mode selected with output report 0x12.
    ///
    /// WiiBrew Documentation: https://www.wiibrew.org/wiki/Wiimote#Data_Reporting
    DataReport(u8, WiimoteData),
}

/// Payload bytes a data report needs for the fields decoded in its mode.
const fn data_payload_size(mode: u8) -> usize {
    match mode {
        BUTTONS_ACCELEROMETER_MODE => 5,
        BUTTONS_ACCELEROMETER_IR12_MODE => 17,
        _ => 2,
    }
}

impl InputReport {
    fn from_data_report(value: &[u8]) -> WiimoteResult<Self> {
        const DATA_SIZE: usize = 21;
        let mode = value[0];
        let payload = &value[1..];
        if payload.len() < data_payload_size(mode) {
            return Err(WiimoteDeviceError::InvalidData.into());
        }

        let mut data = [0u8; DATA_SIZE];
        let bytes_to_copy = usize::min(payload.len(), DATA_SIZE);
        data[..bytes_to_copy].copy_from_slice(&payload[..bytes_to_copy]);

        Ok(Self::DataReport(mode, WiimoteData { data }))
    }
}

impl TryFrom<&[u8]> for InputReport {
    type Error = WiimoteError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.is_empty() {
            return Err(WiimoteDeviceError::MissingData.into());
        }
        match value[0] {
            STATUS_ID => Ok(Self::StatusInformation(StatusData::from_payload(&value[1..])?)),
            ACKNOWLEDGE_ID => Ok(Self::Acknowledge(AcknowledgeData::from_payload(&value[1..])?)),
            0x30..=0x3F => Self::from_data_report(value),
            _ => Err(WiimoteDeviceError::InvalidData.into()),
        }
    }
}
