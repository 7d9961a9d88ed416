use crate::prelude::*;
use bitflags::bitflags;

const RUMBLE_ID: u8 = 0x10;
const PLAYER_LED_ID: u8 = 0x11;
const DATA_REPORTING_MODE_ID: u8 = 0x12;
const IR_CAMERA_ENABLE_ID: u8 = 0x13;
const STATUS_REQUEST_ID: u8 = 0x15;
const WRITE_MEMORY_ID: u8 = 0x16;
const IR_CAMERA_ENABLE_2_ID: u8 = 0x1A;

bitflags! {
    /// The four player LEDs, used as the connection indicator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PlayerLedFlags: u8 {
        const LED_1 = 0b0001_0000;
        const LED_2 = 0b0010_0000;
        const LED_3 = 0b0100_0000;
        const LED_4 = 0b1000_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataReportingMode {
    pub continuous: bool,
    pub mode: u8,
}

/// Location of a control register write.
#[derive(Debug, Clone, Copy)]
pub struct Addressing {
    pub(crate) address: u32,
    pub(crate) size: u16,
}

impl Addressing {
    #[must_use]
    pub const fn control_registers(address: u32, size: u16) -> Self {
        Self { address, size }
    }
}

/// An output report represents the data sent from the computer to the Wii remote.
///
/// The least significant bit of the first byte of any output report enables or disables the rumble.
#[derive(Debug, Clone)]
pub enum OutputReport {
    /// Turn rumble on or off without any other changes.
    ///
    /// WiiBrew Documentation: https://www.wiibrew.org/wiki/Wiimote#Rumble
    Rumble(bool),
    /// Set the player LED lights.
    ///
    /// WiiBrew Documentation: https://www.wiibrew.org/wiki/Wiimote#Player_LEDs
    PlayerLed(PlayerLedFlags),
    /// Set the data reporting mode of the input reports.
    ///
    /// WiiBrew Documentation: https://www.wiibrew.org/wiki/Wiimote#Data_Reporting
    DataReportingMode(DataReportingMode),
    /// Enable or disable the IR camera pixel clock (first step of enable sequence).
    ///
    /// WiiBrew Documentation: https://www.wiibrew.org/wiki/Wiimote#IR_Camera
    IrCameraEnable(bool),
    /// Request a status input report from the Wii remote.
    ///
    /// WiiBrew Documentation: https://www.wiibrew.org/wiki/Wiimote#0x20:_Status
    StatusRequest,
    /// Write up to 16 bytes of data to the Wii remote's control registers.
    ///
    /// WiiBrew Documentation: https://www.wiibrew.org/wiki/Wiimote#Memory_and_Registers
    WriteMemory(Addressing, [u8; 16]),
    /// Enable or disable the IR camera chip (second step of enable sequence).
    ///
    /// WiiBrew Documentation: https://www.wiibrew.org/wiki/Wiimote#IR_Camera
    IrCameraEnable2(bool),
}

impl OutputReport {
    /// Converts the output report to a byte array.
    /// The rumble flag is used in all output reports to enable or disable the rumble motor.
    ///
    /// Returns a tuple containing the byte array and the actual length of the data.
    #[must_use]
    pub fn to_array(&self, rumble: bool) -> ([u8; WIIMOTE_DEFAULT_REPORT_BUFFER_SIZE], usize) {
        let mut buffer = [0u8; WIIMOTE_DEFAULT_REPORT_BUFFER_SIZE];
        let length = self.fill_buffer(rumble, &mut buffer);
        (buffer, length)
    }

    /// Fills an existing buffer with the output report data.
    /// The rumble flag is used in all output reports to enable or disable the rumble motor.
    ///
    /// Returns the actual length of the data.
    pub fn fill_buffer(&self, mut rumble: bool, buffer: &mut [u8]) -> usize {
        buffer[1] = 0;
        let length = match self {
            Self::Rumble(rumble_enabled) => {
                rumble = *rumble_enabled;
                buffer[0] = RUMBLE_ID;
                2
            }
            Self::PlayerLed(flags) => {
                buffer[0] = PLAYER_LED_ID;
                buffer[1] = flags.bits();
                2
            }
            Self::DataReportingMode(mode) => {
                buffer[0] = DATA_REPORTING_MODE_ID;
                buffer[1] = if mode.continuous { 0x04 } else { 0x00 };
                buffer[2] = mode.mode;
                3
            }
            Self::IrCameraEnable(enable) => {
                buffer[0] = IR_CAMERA_ENABLE_ID;
                buffer[1] = if *enable { 0x04 } else { 0x00 };
                2
            }
            Self::StatusRequest => {
                buffer[0] = STATUS_REQUEST_ID;
                2
            }
            Self::WriteMemory(addressing, data) => {
                buffer[0] = WRITE_MEMORY_ID;
                buffer[1..=4].copy_from_slice(&addressing.address.to_be_bytes());
                // Address is 3 bytes long, byte 1 selects the control registers and holds rumble.
                buffer[1] = 0x04;
                buffer[5] = u8::try_from(addressing.size).map_or(16, |size| size.min(16));
                buffer[6..=21].copy_from_slice(data);
                22
            }
            Self::IrCameraEnable2(enable) => {
                buffer[0] = IR_CAMERA_ENABLE_2_ID;
                buffer[1] = if *enable { 0x04 } else { 0x00 };
                2
            }
        };
        if rumble {
            // https://www.wiibrew.org/wiki/Wiimote#Rumble
            // Setting the LSB (bit 0) of the first byte of any output report will activate the rumble motor,
            // and unsetting it will deactivate it.
            buffer[1] |= 0x01;
        }
        length
    }
}
