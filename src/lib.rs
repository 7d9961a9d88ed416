#![allow(clippy::module_name_repetitions)]

mod device;
pub mod driver;
pub mod format;
pub mod input;
pub mod ir;
mod native;
pub mod output;
pub mod poller;
mod result;
pub mod signal;
pub mod state;
pub mod terminal;

pub const WIIMOTE_DEFAULT_REPORT_BUFFER_SIZE: usize = 32;

pub mod prelude {
    pub use crate::device::WiimoteDevice;
    pub use crate::driver::{DeviceHandle, DeviceRequest, HidDriver, HidHandle, InputDriver};
    pub use crate::poller::{Poller, PollerConfig, SessionEnd, SessionState};
    pub use crate::result::*;
    pub use crate::signal::StopSignal;
    pub use crate::state::{Channels, State};
    pub use crate::WIIMOTE_DEFAULT_REPORT_BUFFER_SIZE;
}
