use crate::output::{Addressing, OutputReport};

// https://www.wiibrew.org/wiki/Wiimote#IR_Camera
const IR_CONTROL_REGISTER: u32 = 0x00B0_0030;
const IR_SENSITIVITY_BLOCK_1_REGISTER: u32 = 0x00B0_0000;
const IR_SENSITIVITY_BLOCK_2_REGISTER: u32 = 0x00B0_001A;
const IR_MODE_REGISTER: u32 = 0x00B0_0033;

/// Extended format: 12 bytes for 4 objects including size, matches reporting mode 0x33.
const IR_EXTENDED_MODE: u8 = 3;

// Sensitivity blocks of the level the Wii uses by default
const IR_SENSITIVITY_BLOCK_1: [u8; 9] = [0x02, 0x00, 0x00, 0x71, 0x01, 0x00, 0xaa, 0x00, 0x64];
const IR_SENSITIVITY_BLOCK_2: [u8; 2] = [0x63, 0x03];

/// A tracked infrared light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrSource {
    pub x: u16,
    pub y: u16,
    /// Rough size of the blob.
    pub size: u8,
}

impl IrSource {
    /// Decodes 12 bytes of extended IR data: one object per 3 bytes.
    #[must_use]
    pub fn from_extended(data: &[u8; 12]) -> [Option<Self>; 4] {
        let mut sources = [None; 4];
        for (source, r) in sources.iter_mut().zip(data.chunks_exact(3)) {
            if r.iter().all(|&b| b == 0xFF) {
                continue;
            }
            *source = Some(Self {
                x: u16::from(r[0]) | (u16::from(r[2] & 0b0011_0000) << 4),
                y: u16::from(r[1]) | (u16::from(r[2] & 0b1100_0000) << 2),
                size: r[2] & 0b0000_1111,
            });
        }
        sources
    }
}

/// Output reports that turn the IR camera on in extended mode.
#[must_use]
pub fn enable_sequence() -> Vec<OutputReport> {
    vec![
        OutputReport::IrCameraEnable(true),
        OutputReport::IrCameraEnable2(true),
        OutputReport::WriteMemory(
            Addressing::control_registers(IR_CONTROL_REGISTER, 1),
            pad(&[0x08]),
        ),
        OutputReport::WriteMemory(
            Addressing::control_registers(IR_SENSITIVITY_BLOCK_1_REGISTER, 9),
            pad(&IR_SENSITIVITY_BLOCK_1),
        ),
        OutputReport::WriteMemory(
            Addressing::control_registers(IR_SENSITIVITY_BLOCK_2_REGISTER, 2),
            pad(&IR_SENSITIVITY_BLOCK_2),
        ),
        OutputReport::WriteMemory(
            Addressing::control_registers(IR_MODE_REGISTER, 1),
            pad(&[IR_EXTENDED_MODE]),
        ),
        OutputReport::WriteMemory(
            Addressing::control_registers(IR_CONTROL_REGISTER, 1),
            pad(&[0x08]),
        ),
    ]
}

/// Output reports that turn the IR camera off.
#[must_use]
pub fn disable_sequence() -> Vec<OutputReport> {
    vec![
        OutputReport::IrCameraEnable(false),
        OutputReport::IrCameraEnable2(false),
    ]
}

fn pad(data: &[u8]) -> [u8; 16] {
    let mut padded = [0u8; 16];
    padded[..data.len()].copy_from_slice(data);
    padded
}
