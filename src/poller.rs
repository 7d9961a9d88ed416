//! The poll loop: connect, sample at a fixed interval, render, stop.
//!
//! A session moves through [`SessionState::Disconnected`],
//! [`SessionState::Connecting`] and [`SessionState::Connected`] and always
//! ends back in `Disconnected`. The device handle is owned by a [`Session`]
//! guard, so it is released exactly once whichever way the loop ends.

use std::io::Write;
use std::time::Duration;

use log::{debug, info};

use crate::driver::{DeviceHandle, InputDriver};
use crate::format;
use crate::input::ButtonData;
use crate::output::PlayerLedFlags;
use crate::prelude::*;
use crate::signal::StopSignal;
use crate::state::{Channels, State};
use crate::terminal::Renderer;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_RUMBLE_PULSE: Duration = Duration::from_millis(500);

const CONNECT_HINT: &str = "Press 1+2 on your Wii remote to connect...";
const CONNECTED: &str = "Connected to Wii remote!";
const EXITING: &str = "\nExiting...";
const DISCONNECTED: &str = "Disconnected from Wii remote";

/// How each sampled state is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Full frame with every channel, redrawn each sample.
    Dashboard,
    /// One line per held button, appended each sample.
    Presses,
}

impl View {
    fn banner(self) -> Vec<String> {
        match self {
            Self::Dashboard => vec![
                format!("\n{}", format::TITLE),
                format::EXIT_HINT.to_string(),
                "=".repeat(30),
            ],
            Self::Presses => {
                vec!["Press buttons on your Wii remote (Ctrl+C to exit)".to_string()]
            }
        }
    }

    fn lines(self, state: &State) -> Vec<String> {
        match self {
            Self::Dashboard => format::dashboard(state),
            Self::Presses => format::press_lines(state),
        }
    }
}

/// Settings of a polling session.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between two samples.
    pub interval: Duration,
    /// Holding these buttons ends the session.
    pub sentinel: ButtonData,
    pub channels: Channels,
    /// LEDs lit once connected.
    pub indicator: PlayerLedFlags,
    /// Length of the rumble pulse that confirms the connection.
    pub rumble_pulse: Duration,
    pub clear_screen: bool,
    pub view: View,
}

impl PollerConfig {
    /// Every channel on a dashboard redrawn 10 times per second.
    #[must_use]
    pub const fn reader() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            sentinel: ButtonData::HOME,
            channels: Channels::all(),
            indicator: PlayerLedFlags::LED_1,
            rumble_pulse: DEFAULT_RUMBLE_PULSE,
            clear_screen: true,
            view: View::Dashboard,
        }
    }

    /// Buttons only, printed as they are held.
    #[must_use]
    pub const fn simple() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            sentinel: ButtonData::HOME,
            channels: Channels::BUTTONS,
            indicator: PlayerLedFlags::LED_1,
            rumble_pulse: DEFAULT_RUMBLE_PULSE,
            clear_screen: false,
            view: View::Presses,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::reader()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Why a session ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The sentinel button was held.
    Sentinel,
    /// A stop was requested.
    Interrupted,
}

/// Exclusive owner of an open device handle.
///
/// The handle is closed by [`Session::release`] or on drop, whichever comes first.
pub struct Session<H: DeviceHandle> {
    handle: H,
    released: bool,
}

impl<H: DeviceHandle> Session<H> {
    pub const fn new(handle: H) -> Self {
        Self {
            handle,
            released: false,
        }
    }

    pub fn handle(&mut self) -> &mut H {
        &mut self.handle
    }

    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }

    pub fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.handle.close();
        }
    }
}

impl<H: DeviceHandle> Drop for Session<H> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Drives one session against an [`InputDriver`] and renders to `W`.
pub struct Poller<W: Write> {
    config: PollerConfig,
    renderer: Renderer<W>,
    stop: StopSignal,
    state: SessionState,
}

impl<W: Write> Poller<W> {
    pub fn new(config: PollerConfig, out: W, stop: StopSignal) -> Self {
        let renderer = Renderer::new(out, config.clear_screen);
        Self {
            config,
            renderer,
            stop,
            state: SessionState::Disconnected,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub fn into_inner(self) -> W {
        self.renderer.into_inner()
    }

    /// Connects, polls until the sentinel button or a stop request, then releases the device.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionFailed` if no device could be opened and set up, `ReadFailure` if
    /// sampling failed, and `Terminal` if the output could not be written. A stop request
    /// while connecting is not an error and ends the session as `Interrupted`.
    pub fn run<D: InputDriver>(&mut self, driver: &mut D) -> SessionResult<SessionEnd> {
        self.state = SessionState::Connecting;
        self.renderer.message(CONNECT_HINT)?;

        let handle = match driver.connect() {
            Ok(handle) => handle,
            Err(WiimoteError::Interrupted) => {
                self.state = SessionState::Disconnected;
                info!("Interrupted while connecting");
                self.renderer.message(EXITING)?;
                return Ok(SessionEnd::Interrupted);
            }
            Err(error) => {
                self.state = SessionState::Disconnected;
                return Err(SessionError::ConnectionFailed(error));
            }
        };

        let mut session = Session::new(handle);
        self.state = SessionState::Connected;
        let result = self.poll(&mut session);

        session.release();
        self.state = SessionState::Disconnected;
        info!("Session ended: {result:?}");

        let farewell = self.renderer.message(DISCONNECTED);
        let end = result?;
        farewell?;
        Ok(end)
    }

    fn poll<H: DeviceHandle>(&mut self, session: &mut Session<H>) -> SessionResult<SessionEnd> {
        self.renderer.message(CONNECTED)?;
        self.acknowledge(session.handle())
            .map_err(SessionError::ConnectionFailed)?;
        for line in self.config.view.banner() {
            self.renderer.message(&line)?;
        }

        loop {
            if self.stop.is_raised() {
                self.renderer.message(EXITING)?;
                return Ok(SessionEnd::Interrupted);
            }

            let state = session
                .handle()
                .read_state()
                .map_err(SessionError::ReadFailure)?;
            self.renderer.render(&self.config.view.lines(&state))?;

            if state.is_pressed(self.config.sentinel) {
                debug!("Sentinel {:?} held", self.config.sentinel);
                return Ok(SessionEnd::Sentinel);
            }
            std::thread::sleep(self.config.interval);
        }
    }

    /// Enables the channels and signals the connection with the LEDs and a rumble pulse.
    fn acknowledge<H: DeviceHandle>(&self, handle: &mut H) -> WiimoteResult<()> {
        handle.configure(self.config.channels)?;
        handle.set_indicator(self.config.indicator)?;
        handle.set_vibration(true)?;
        std::thread::sleep(self.config.rumble_pulse);
        handle.set_vibration(false)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;
    use crate::driver::DeviceRequest;
    use crate::state::AccelerometerData;

    #[derive(Default)]
    struct Log {
        requests: RefCell<Vec<DeviceRequest>>,
        closes: Cell<usize>,
        reads: Cell<usize>,
    }

    struct ScriptedHandle {
        states: VecDeque<WiimoteResult<State>>,
        log: Rc<Log>,
        stop_after: Option<(usize, StopSignal)>,
    }

    impl DeviceHandle for ScriptedHandle {
        fn apply(&mut self, request: DeviceRequest) -> WiimoteResult<()> {
            self.log.requests.borrow_mut().push(request);
            Ok(())
        }

        fn read_state(&mut self) -> WiimoteResult<State> {
            let reads = self.log.reads.get() + 1;
            self.log.reads.set(reads);
            if let Some((after, stop)) = &self.stop_after {
                if reads >= *after {
                    stop.raise();
                }
            }
            self.states
                .pop_front()
                .unwrap_or(Err(WiimoteError::Disconnected))
        }

        fn close(&mut self) {
            self.log.closes.set(self.log.closes.get() + 1);
        }
    }

    struct ScriptedDriver {
        handle: Option<ScriptedHandle>,
        refusal: Option<WiimoteError>,
    }

    impl ScriptedDriver {
        fn new(states: Vec<WiimoteResult<State>>, log: &Rc<Log>) -> Self {
            Self {
                handle: Some(ScriptedHandle {
                    states: states.into(),
                    log: Rc::clone(log),
                    stop_after: None,
                }),
                refusal: None,
            }
        }

        fn refusing(error: WiimoteError) -> Self {
            Self {
                handle: None,
                refusal: Some(error),
            }
        }

        fn stopping_after(mut self, reads: usize, stop: &StopSignal) -> Self {
            if let Some(handle) = self.handle.as_mut() {
                handle.stop_after = Some((reads, stop.clone()));
            }
            self
        }
    }

    impl InputDriver for ScriptedDriver {
        type Handle = ScriptedHandle;

        fn connect(&mut self) -> WiimoteResult<ScriptedHandle> {
            match self.handle.take() {
                Some(handle) => Ok(handle),
                None => Err(self.refusal.take().unwrap_or(WiimoteError::NotFound)),
            }
        }
    }

    fn config(view: View) -> PollerConfig {
        PollerConfig {
            interval: Duration::ZERO,
            rumble_pulse: Duration::ZERO,
            clear_screen: false,
            view,
            ..PollerConfig::reader()
        }
    }

    fn pressed(buttons: ButtonData) -> WiimoteResult<State> {
        Ok(State {
            buttons,
            accelerometer: AccelerometerData::new(512, 512, 512),
            ..State::default()
        })
    }

    fn output(poller: Poller<Vec<u8>>) -> String {
        String::from_utf8(poller.into_inner()).unwrap()
    }

    #[test]
    fn test_sentinel_ends_session() {
        let log = Rc::new(Log::default());
        let mut driver = ScriptedDriver::new(
            vec![
                pressed(ButtonData::empty()),
                pressed(ButtonData::A | ButtonData::HOME),
                pressed(ButtonData::B),
            ],
            &log,
        );
        let mut poller = Poller::new(config(View::Dashboard), Vec::new(), StopSignal::new());

        let end = poller.run(&mut driver).unwrap();

        assert_eq!(end, SessionEnd::Sentinel);
        assert_eq!(poller.state(), SessionState::Disconnected);
        assert_eq!(log.reads.get(), 2);
        assert_eq!(log.closes.get(), 1);
        let output = output(poller);
        assert!(output.contains("Buttons: None"));
        assert!(output.contains("Buttons: A, HOME"));
        assert!(output.contains("Accelerometer: X: 512, Y: 512, Z: 512"));
        assert!(output.ends_with("Disconnected from Wii remote\n"));
    }

    #[test]
    fn test_connection_is_acknowledged() {
        let log = Rc::new(Log::default());
        let mut driver = ScriptedDriver::new(vec![pressed(ButtonData::HOME)], &log);
        let mut poller = Poller::new(config(View::Dashboard), Vec::new(), StopSignal::new());

        poller.run(&mut driver).unwrap();

        assert_eq!(
            *log.requests.borrow(),
            [
                DeviceRequest::Configure(Channels::all()),
                DeviceRequest::SetIndicator(PlayerLedFlags::LED_1),
                DeviceRequest::SetVibration(true),
                DeviceRequest::SetVibration(false),
            ]
        );
    }

    #[test]
    fn test_connection_failure_skips_poll_loop() {
        let mut driver = ScriptedDriver::refusing(WiimoteError::NotFound);
        let mut poller = Poller::new(config(View::Dashboard), Vec::new(), StopSignal::new());

        let result = poller.run(&mut driver);

        assert!(matches!(
            result,
            Err(SessionError::ConnectionFailed(WiimoteError::NotFound))
        ));
        assert_eq!(poller.state(), SessionState::Disconnected);
        let output = output(poller);
        assert_eq!(output, format!("{CONNECT_HINT}\n"));
    }

    #[test]
    fn test_interrupt_ends_session() {
        let log = Rc::new(Log::default());
        let stop = StopSignal::new();
        let states = (0..10).map(|_| pressed(ButtonData::A)).collect();
        let mut driver = ScriptedDriver::new(states, &log).stopping_after(3, &stop);
        let mut poller = Poller::new(config(View::Dashboard), Vec::new(), stop);

        let end = poller.run(&mut driver).unwrap();

        assert_eq!(end, SessionEnd::Interrupted);
        assert_eq!(log.reads.get(), 3);
        assert_eq!(log.closes.get(), 1);
        assert!(output(poller).contains("Exiting..."));
    }

    #[test]
    fn test_interrupt_before_first_sample() {
        let log = Rc::new(Log::default());
        let stop = StopSignal::new();
        stop.raise();
        let mut driver = ScriptedDriver::new(vec![pressed(ButtonData::A)], &log);
        let mut poller = Poller::new(config(View::Dashboard), Vec::new(), stop);

        assert_eq!(poller.run(&mut driver).unwrap(), SessionEnd::Interrupted);
        assert_eq!(log.reads.get(), 0);
        assert_eq!(log.closes.get(), 1);
    }

    #[test]
    fn test_interrupt_while_connecting_is_graceful() {
        let stop = StopSignal::new();
        stop.raise();
        let mut driver = ScriptedDriver::refusing(WiimoteError::Interrupted);
        let mut poller = Poller::new(config(View::Presses), Vec::new(), stop);

        let end = poller.run(&mut driver).unwrap();

        assert_eq!(end, SessionEnd::Interrupted);
        assert_eq!(poller.state(), SessionState::Disconnected);
        let output = output(poller);
        assert_eq!(output, format!("{CONNECT_HINT}\n{EXITING}\n"));
        assert!(!output.contains(DISCONNECTED));
    }

    #[test]
    fn test_read_failure_releases_handle() {
        let log = Rc::new(Log::default());
        let mut driver = ScriptedDriver::new(
            vec![pressed(ButtonData::A), Err(WiimoteError::Disconnected)],
            &log,
        );
        let mut poller = Poller::new(config(View::Dashboard), Vec::new(), StopSignal::new());

        let result = poller.run(&mut driver);

        assert!(matches!(
            result,
            Err(SessionError::ReadFailure(WiimoteError::Disconnected))
        ));
        assert_eq!(poller.state(), SessionState::Disconnected);
        assert_eq!(log.closes.get(), 1);
        assert!(output(poller).ends_with("Disconnected from Wii remote\n"));
    }

    #[test]
    fn test_press_lines_view() {
        let log = Rc::new(Log::default());
        let mut driver = ScriptedDriver::new(
            vec![
                pressed(ButtonData::A),
                pressed(ButtonData::B | ButtonData::TWO),
                pressed(ButtonData::HOME),
            ],
            &log,
        );
        let mut poller = Poller::new(config(View::Presses), Vec::new(), StopSignal::new());

        assert_eq!(poller.run(&mut driver).unwrap(), SessionEnd::Sentinel);

        let output = output(poller);
        let presses: Vec<&str> = output
            .lines()
            .filter(|line| line.ends_with("button pressed!"))
            .collect();
        assert_eq!(
            presses,
            [
                "A button pressed!",
                "B button pressed!",
                "2 button pressed!",
                "HOME button pressed!"
            ]
        );
    }

    #[test]
    fn test_session_release_is_idempotent() {
        let log = Rc::new(Log::default());
        let mut driver = ScriptedDriver::new(Vec::new(), &log);
        let handle = driver.connect().unwrap();

        let mut session = Session::new(handle);
        session.release();
        session.release();
        assert!(session.is_released());
        drop(session);

        assert_eq!(log.closes.get(), 1);
    }

    #[test]
    fn test_session_drop_releases() {
        let log = Rc::new(Log::default());
        let mut driver = ScriptedDriver::new(Vec::new(), &log);

        drop(Session::new(driver.connect().unwrap()));

        assert_eq!(log.closes.get(), 1);
    }
}
