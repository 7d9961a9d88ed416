//! The input device driver seam and its HID implementation.
//!
//! The poller only needs six operations from a driver: connect, configure,
//! read the latest state, set the indicator LEDs, switch vibration and close.
//! The three setters are expressed as [`DeviceRequest`]s.

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::TryRecvError;
use hidapi::HidApi;
use log::{debug, error, info, warn};

use crate::device::WiimoteDevice;
use crate::input::{
    InputReport, BUTTONS_ACCELEROMETER_IR12_MODE, BUTTONS_ACCELEROMETER_MODE, BUTTONS_MODE,
};
use crate::ir;
use crate::native::wiimotes_scan;
use crate::output::{DataReportingMode, OutputReport, PlayerLedFlags};
use crate::prelude::*;
use crate::signal::StopSignal;
use crate::state::{battery_ratio, AccelerometerData, Channels, State};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_millis(500);
const READ_TIMEOUT_MILLIS: usize = 20;
const STATUS_INTERVAL: Duration = Duration::from_secs(5);
const REGISTER_WRITE_DELAY: Duration = Duration::from_millis(10);

/// A change of device configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRequest {
    /// Select which channels are included in each snapshot.
    Configure(Channels),
    /// Show a pattern on the player LEDs.
    SetIndicator(PlayerLedFlags),
    /// Switch the rumble motor on or off.
    SetVibration(bool),
}

/// An open connection to an input device.
pub trait DeviceHandle {
    /// Applies a configuration request.
    ///
    /// # Errors
    ///
    /// This function will return an error if the request could not be sent to the device.
    fn apply(&mut self, request: DeviceRequest) -> WiimoteResult<()>;

    /// Returns the latest state received from the device without waiting for a new one.
    ///
    /// # Errors
    ///
    /// This function will return an error if the device failed or was disconnected.
    fn read_state(&mut self) -> WiimoteResult<State>;

    /// Releases the device. Calling it again does nothing.
    fn close(&mut self);

    fn configure(&mut self, channels: Channels) -> WiimoteResult<()> {
        self.apply(DeviceRequest::Configure(channels))
    }

    fn set_indicator(&mut self, pattern: PlayerLedFlags) -> WiimoteResult<()> {
        self.apply(DeviceRequest::SetIndicator(pattern))
    }

    fn set_vibration(&mut self, enabled: bool) -> WiimoteResult<()> {
        self.apply(DeviceRequest::SetVibration(enabled))
    }
}

/// Something that can open a [`DeviceHandle`].
pub trait InputDriver {
    type Handle: DeviceHandle;

    /// Waits for a device and opens it.
    ///
    /// # Errors
    ///
    /// This function will return an error if no device could be opened.
    fn connect(&mut self) -> WiimoteResult<Self::Handle>;
}

/// Returns the data reporting mode that carries every channel in `channels`.
#[must_use]
pub fn reporting_mode_for(channels: Channels) -> u8 {
    if channels.contains(Channels::IR) {
        BUTTONS_ACCELEROMETER_IR12_MODE
    } else if channels.contains(Channels::ACCELEROMETER) {
        BUTTONS_ACCELEROMETER_MODE
    } else {
        BUTTONS_MODE
    }
}

/// Opens Wii remotes that the operating system has connected over Bluetooth HID.
pub struct HidDriver {
    connect_timeout: Duration,
    scan_interval: Duration,
    stop: StopSignal,
}

impl HidDriver {
    #[must_use]
    pub fn new(stop: StopSignal) -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            stop,
        }
    }
}

impl InputDriver for HidDriver {
    type Handle = HidHandle;

    fn connect(&mut self) -> WiimoteResult<HidHandle> {
        let mut api = HidApi::new()?;
        let deadline = Instant::now() + self.connect_timeout;

        loop {
            if self.stop.is_raised() {
                return Err(WiimoteError::Interrupted);
            }

            let mut native_devices = Vec::new();
            wiimotes_scan(&mut api, &mut native_devices)?;
            if let Some(native) = native_devices.into_iter().next() {
                let device = WiimoteDevice::new(native);
                info!("Connected to Wii remote {}", device.identifier());
                return HidHandle::start(device);
            }

            if Instant::now() >= deadline {
                return Err(WiimoteError::NotFound);
            }
            std::thread::sleep(self.scan_interval);
        }
    }
}

/// Latest state merged from incoming reports.
#[derive(Debug)]
struct StateTracker {
    state: State,
    channels: Channels,
    reporting_mode: DataReportingMode,
    failure: Option<WiimoteError>,
    connected: bool,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            state: State::default(),
            channels: Channels::BUTTONS,
            reporting_mode: DataReportingMode {
                continuous: false,
                mode: BUTTONS_MODE,
            },
            failure: None,
            connected: true,
        }
    }

    /// Returns the latest state, or the failure that ended the connection.
    ///
    /// A recorded failure is reported once, later calls see `Disconnected`.
    fn latest(&mut self) -> WiimoteResult<State> {
        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }
        if !self.connected {
            return Err(WiimoteError::Disconnected);
        }
        Ok(self.state.clone())
    }

    fn fail(&mut self, failure: WiimoteError) {
        self.failure = Some(failure);
        self.connected = false;
    }

    /// Merges `report` into the state.
    ///
    /// Returns the reporting mode when it has to be sent again.
    fn apply(&mut self, report: &InputReport) -> Option<DataReportingMode> {
        match report {
            InputReport::StatusInformation(status) => {
                self.state.buttons = status.buttons();
                self.state.battery = battery_ratio(status.battery_level());
                // Any status report resets the data reporting mode
                Some(self.reporting_mode)
            }
            InputReport::Acknowledge(acknowledge) => {
                self.state.buttons = acknowledge.buttons();
                if acknowledge.error_code() != 0 {
                    warn!(
                        "Output report 0x{:02x} failed with error {}",
                        acknowledge.report_number(),
                        acknowledge.error_code()
                    );
                }
                None
            }
            InputReport::DataReport(mode, data) => {
                self.state.buttons = data.buttons();
                if self.channels.contains(Channels::ACCELEROMETER) {
                    if let Some(accelerometer) = data.accelerometer(*mode) {
                        self.state.accelerometer = accelerometer;
                    }
                }
                if self.channels.contains(Channels::IR) {
                    if let Some(sources) = data.ir_sources(*mode) {
                        self.state.ir = sources;
                    }
                }
                None
            }
        }
    }

    fn set_channels(&mut self, channels: Channels) {
        self.channels = channels;
        self.reporting_mode.mode = reporting_mode_for(channels);
        if !channels.contains(Channels::ACCELEROMETER) {
            self.state.accelerometer = AccelerometerData::default();
        }
        if !channels.contains(Channels::IR) {
            self.state.ir = [None; 4];
        }
    }
}

type SharedTracker = Arc<Mutex<StateTracker>>;

fn lock(tracker: &SharedTracker) -> MutexGuard<'_, StateTracker> {
    match tracker.lock() {
        Ok(tracker) => tracker,
        Err(err) => err.into_inner(),
    }
}

/// An open Wii remote. A background thread keeps the latest [`State`] up to date.
pub struct HidHandle {
    device: Arc<WiimoteDevice>,
    tracker: SharedTracker,
    reader: Option<(crossbeam_channel::Sender<()>, JoinHandle<()>)>,
}

impl HidHandle {
    fn start(device: WiimoteDevice) -> WiimoteResult<Self> {
        let device = Arc::new(device);
        let tracker = Arc::new(Mutex::new(StateTracker::new()));
        let (stop_sender, stop_receiver) = crossbeam_channel::bounded::<()>(1);

        let reader = {
            let device = Arc::clone(&device);
            let tracker = Arc::clone(&tracker);
            std::thread::Builder::new()
                .name("wiimote-reader".to_string())
                .spawn(move || read_reports(&device, &tracker, &stop_receiver))?
        };

        Ok(Self {
            device,
            tracker,
            reader: Some((stop_sender, reader)),
        })
    }

    fn write_all(&self, reports: &[OutputReport]) -> WiimoteResult<()> {
        for report in reports {
            self.device.write(report)?;
            std::thread::sleep(REGISTER_WRITE_DELAY);
        }
        Ok(())
    }

    fn configure_channels(&mut self, channels: Channels) -> WiimoteResult<()> {
        let ir_was_enabled = lock(&self.tracker).channels.contains(Channels::IR);
        if channels.contains(Channels::IR) {
            self.write_all(&ir::enable_sequence())?;
        } else if ir_was_enabled {
            self.write_all(&ir::disable_sequence())?;
        }

        let reporting_mode = {
            let mut tracker = lock(&self.tracker);
            tracker.set_channels(channels);
            tracker.reporting_mode
        };
        debug!("Reporting mode 0x{:02x} for {channels:?}", reporting_mode.mode);
        self.device
            .write(&OutputReport::DataReportingMode(reporting_mode))?;
        // Battery level only arrives with status reports
        self.device.write(&OutputReport::StatusRequest)
    }
}

impl DeviceHandle for HidHandle {
    fn apply(&mut self, request: DeviceRequest) -> WiimoteResult<()> {
        match request {
            DeviceRequest::Configure(channels) => self.configure_channels(channels),
            DeviceRequest::SetIndicator(pattern) => {
                self.device.write(&OutputReport::PlayerLed(pattern))
            }
            DeviceRequest::SetVibration(enabled) => self.device.write(&OutputReport::Rumble(enabled)),
        }
    }

    fn read_state(&mut self) -> WiimoteResult<State> {
        lock(&self.tracker).latest()
    }

    fn close(&mut self) {
        if let Some((stop_sender, reader)) = self.reader.take() {
            // Disconnecting the channel ends the reader thread
            drop(stop_sender);
            if reader.join().is_err() {
                error!("Wii remote reader thread panicked");
            }
            self.device.disconnect();
            lock(&self.tracker).connected = false;
            info!("Disconnected Wii remote {}", self.device.identifier());
        }
    }
}

impl Drop for HidHandle {
    fn drop(&mut self) {
        self.close();
    }
}

fn read_reports(
    device: &WiimoteDevice,
    tracker: &SharedTracker,
    stop_receiver: &crossbeam_channel::Receiver<()>,
) {
    let mut last_status_request = Instant::now();

    loop {
        if !matches!(stop_receiver.try_recv(), Err(TryRecvError::Empty)) {
            return;
        }

        if last_status_request.elapsed() >= STATUS_INTERVAL {
            last_status_request = Instant::now();
            if let Err(failure) = device.write(&OutputReport::StatusRequest) {
                record_failure(tracker, failure);
                return;
            }
        }

        let resend_mode = match device.read_timeout(READ_TIMEOUT_MILLIS) {
            Ok(Some(report)) => lock(tracker).apply(&report),
            Ok(None) => None,
            Err(WiimoteError::WiimoteDeviceError(error)) => {
                debug!("Skipping report: {error}");
                None
            }
            Err(failure) => {
                record_failure(tracker, failure);
                return;
            }
        };

        if let Some(mode) = resend_mode {
            if let Err(failure) = device.write(&OutputReport::DataReportingMode(mode)) {
                record_failure(tracker, failure);
                return;
            }
        }
    }
}

fn record_failure(tracker: &SharedTracker, failure: WiimoteError) {
    error!("Wii remote connection failed: {failure}");
    lock(tracker).fail(failure);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ButtonData;
    use crate::ir::IrSource;

    fn report(bytes: &[u8]) -> InputReport {
        InputReport::try_from(bytes).unwrap()
    }

    #[test]
    fn test_reporting_mode_for_channels() {
        assert_eq!(reporting_mode_for(Channels::BUTTONS), 0x30);
        assert_eq!(
            reporting_mode_for(Channels::BUTTONS | Channels::ACCELEROMETER),
            0x31
        );
        assert_eq!(reporting_mode_for(Channels::all()), 0x33);
        assert_eq!(reporting_mode_for(Channels::BUTTONS | Channels::IR), 0x33);
    }

    #[test]
    fn test_status_report_updates_battery_and_resends_mode() {
        let mut tracker = StateTracker::new();
        tracker.set_channels(Channels::all());

        let resend = tracker.apply(&report(&[0x20, 0x00, 0x08, 0x10, 0x00, 0x00, 0x68]));

        assert_eq!(
            resend,
            Some(DataReportingMode {
                continuous: false,
                mode: 0x33
            })
        );
        assert_eq!(tracker.state.buttons, ButtonData::A);
        assert!((tracker.state.battery - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_data_report_updates_enabled_channels() {
        let mut tracker = StateTracker::new();
        tracker.set_channels(Channels::all());

        let mut bytes = [0xFFu8; 18];
        bytes[0] = 0x33;
        bytes[1] = 0x00;
        bytes[2] = 0x80; // Home
        bytes[3..6].copy_from_slice(&[0x80, 0x80, 0x80]);
        bytes[12..15].copy_from_slice(&[0x10, 0x20, 0x02]);
        assert_eq!(tracker.apply(&report(&bytes)), None);

        assert_eq!(tracker.state.buttons, ButtonData::HOME);
        assert_eq!(tracker.state.accelerometer, AccelerometerData::new(512, 512, 512));
        assert_eq!(
            tracker.state.ir,
            [
                None,
                None,
                Some(IrSource {
                    x: 0x10,
                    y: 0x20,
                    size: 2
                }),
                None
            ]
        );
    }

    #[test]
    fn test_buttons_only_ignores_other_channels() {
        let mut tracker = StateTracker::new();
        tracker.set_channels(Channels::BUTTONS);

        tracker.apply(&report(&[0x31, 0x00, 0x04, 0x90, 0x90, 0x90]));

        assert_eq!(tracker.state.buttons, ButtonData::B);
        assert_eq!(tracker.state.accelerometer, AccelerometerData::default());
    }

    #[test]
    fn test_failure_is_reported_then_disconnected() {
        let mut tracker = StateTracker::new();
        tracker.apply(&report(&[0x30, 0x00, 0x08]));
        assert_eq!(tracker.latest().unwrap().buttons, ButtonData::A);

        tracker.fail(WiimoteError::NotFound);

        assert!(matches!(tracker.latest(), Err(WiimoteError::NotFound)));
        assert!(matches!(tracker.latest(), Err(WiimoteError::Disconnected)));
    }

    #[test]
    fn test_disabling_ir_clears_sources() {
        let mut tracker = StateTracker::new();
        tracker.set_channels(Channels::all());
        tracker.state.ir[0] = Some(IrSource { x: 1, y: 2, size: 3 });

        tracker.set_channels(Channels::BUTTONS | Channels::ACCELEROMETER);

        assert_eq!(tracker.state.ir, [None; 4]);
        assert_eq!(tracker.reporting_mode.mode, 0x31);
    }

    #[test]
    fn test_acknowledge_keeps_mode() {
        let mut tracker = StateTracker::new();

        assert_eq!(tracker.apply(&report(&[0x22, 0x00, 0x00, 0x16, 0x00])), None);
    }
}
