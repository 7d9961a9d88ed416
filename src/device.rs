use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use log::debug;

use crate::input::InputReport;
use crate::native::{NativeWiimote, NativeWiimoteDevice};
use crate::output::OutputReport;
use crate::prelude::*;

/// A `WiimoteDevice` can be used to communicate with a Wii remote.
pub struct WiimoteDevice {
    device: Mutex<Option<NativeWiimoteDevice>>,
    identifier: String,
    rumble_enabled: AtomicBool,
}

impl WiimoteDevice {
    /// Wraps the `NativeWiimoteDevice` as a `WiimoteDevice`.
    pub(crate) fn new(device: NativeWiimoteDevice) -> Self {
        let identifier = device.identifier();
        Self {
            device: Mutex::new(Some(device)),
            identifier,
            rumble_enabled: AtomicBool::new(false),
        }
    }

    /// Returns the unique identifier of the Wii remote.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Writes the report to the connected Wii remote.
    ///
    /// # Errors
    ///
    /// This function will return an error if the Wii remote is disconnected or write failed.
    /// A failed write closes the connection.
    pub fn write(&self, output_report: &OutputReport) -> WiimoteResult<()> {
        let mut device = self.lock();
        let Some(native) = device.as_mut() else {
            return Err(WiimoteError::Disconnected);
        };

        let rumble = if let OutputReport::Rumble(new_rumble) = output_report {
            // Rumble is sent in every output report, so the new value needs to be stored.
            self.rumble_enabled.store(*new_rumble, Ordering::Relaxed);
            *new_rumble
        } else {
            self.rumble_enabled.load(Ordering::Relaxed)
        };
        let (buffer, size) = output_report.to_array(rumble);
        debug!("send {:02x?}", &buffer[..size]);
        if let Err(error) = native.write(&buffer[..size]) {
            _ = device.take();
            return Err(error);
        }
        Ok(())
    }

    /// Reads a report from the connected Wii remote waiting for a maximum of `timeout_millis`.
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    ///
    /// # Errors
    ///
    /// This function will return an error if the Wii remote is disconnected, read failed or
    /// the report could not be decoded. Only transport failures close the connection.
    pub fn read_timeout(&self, timeout_millis: usize) -> WiimoteResult<Option<InputReport>> {
        let mut device = self.lock();
        let Some(native) = device.as_mut() else {
            return Err(WiimoteError::Disconnected);
        };

        let mut buffer = [0u8; WIIMOTE_DEFAULT_REPORT_BUFFER_SIZE];
        match native.read_timeout(&mut buffer, timeout_millis) {
            Ok(0) => Ok(None),
            Ok(bytes_read) => InputReport::try_from(&buffer[..bytes_read]).map(Some),
            Err(error) => {
                _ = device.take();
                Err(error)
            }
        }
    }

    /// Closes the connection. Does nothing if already closed.
    pub fn disconnect(&self) {
        if self.lock().take().is_some() {
            debug!("Closed Wii remote {}", self.identifier);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<NativeWiimoteDevice>> {
        match self.device.lock() {
            Ok(device) => device,
            Err(err) => err.into_inner(),
        }
    }
}

impl Drop for WiimoteDevice {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_device_is_shareable_with_reader_thread() {
        assert_send_sync::<WiimoteDevice>();
    }
}
