mod common;
mod hid;

pub use hid::{wiimotes_scan, HidNativeWiimote as NativeWiimoteDevice};

use crate::prelude::*;

/// Raw report transport to a single Wii remote.
///
/// Buffers start with the report ID.
pub trait NativeWiimote {
    /// Returns `Ok(0)` if no report arrived within `timeout_millis`.
    fn read_timeout(&mut self, buffer: &mut [u8], timeout_millis: usize) -> WiimoteResult<usize>;
    fn write(&mut self, buffer: &[u8]) -> WiimoteResult<usize>;
    fn identifier(&self) -> String;
}
