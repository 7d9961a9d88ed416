use hidapi::{DeviceInfo, HidApi, HidDevice};
use log::{debug, warn};

use super::common::{is_wiimote, is_wiimote_device_name};
use super::NativeWiimote;
use crate::prelude::*;

fn is_wiimote_info(info: &DeviceInfo) -> bool {
    is_wiimote(info.vendor_id(), info.product_id())
        || info.product_string().is_some_and(is_wiimote_device_name)
}

/// Opens every Wii remote currently known to the HID layer.
///
/// Pairing is left to the operating system, a remote shows up here once it is connected.
///
/// # Errors
///
/// This function will return an error if the HID device list could not be refreshed.
pub fn wiimotes_scan(api: &mut HidApi, wiimotes: &mut Vec<HidNativeWiimote>) -> WiimoteResult<()> {
    api.refresh_devices()?;
    let api: &HidApi = api;

    let mut seen_paths = Vec::new();
    for info in api.device_list().filter(|info| is_wiimote_info(info)) {
        let path = info.path().to_string_lossy().into_owned();
        if seen_paths.contains(&path) {
            continue;
        }
        seen_paths.push(path.clone());

        match info.open_device(api) {
            Ok(device) => {
                debug!("Opened Wii remote at {path}");
                let identifier = info
                    .serial_number()
                    .filter(|serial| !serial.is_empty())
                    .map_or(path, str::to_string);
                wiimotes.push(HidNativeWiimote::new(identifier, device));
            }
            Err(error) => warn!("Failed to open Wii remote at {path}: {error}"),
        }
    }
    Ok(())
}

pub struct HidNativeWiimote {
    identifier: String,
    device: HidDevice,
}

impl HidNativeWiimote {
    fn new(identifier: String, device: HidDevice) -> Self {
        Self { identifier, device }
    }
}

impl NativeWiimote for HidNativeWiimote {
    fn read_timeout(&mut self, buffer: &mut [u8], timeout_millis: usize) -> WiimoteResult<usize> {
        let timeout = i32::try_from(timeout_millis).unwrap_or(i32::MAX);
        Ok(self.device.read_timeout(buffer, timeout)?)
    }

    fn write(&mut self, buffer: &[u8]) -> WiimoteResult<usize> {
        Ok(self.device.write(buffer)?)
    }

    fn identifier(&self) -> String {
        self.identifier.clone()
    }
}
