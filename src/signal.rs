//! Ctrl+C as a cooperative stop request.
//!
//! The handler only raises a flag. Loops check [`StopSignal::is_raised`]
//! between iterations and tear down in order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};

use crate::prelude::*;

static PROCESS_STOP: Lazy<Arc<AtomicBool>> = Lazy::new(|| Arc::new(AtomicBool::new(false)));
static HANDLER_INSTALLED: OnceCell<()> = OnceCell::new();

/// A shared flag that asks running loops to stop.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    /// Creates a signal that is only raised through [`StopSignal::raise`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process wide signal raised by Ctrl+C, installing the handler on first use.
    ///
    /// # Errors
    ///
    /// This function will return an error if the handler could not be installed.
    pub fn ctrl_c() -> WiimoteResult<Self> {
        let flag = Arc::clone(&PROCESS_STOP);
        HANDLER_INSTALLED.get_or_try_init(platform::install)?;
        Ok(Self { flag })
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(unix)]
mod platform {
    use std::sync::atomic::Ordering;

    use nix::libc::c_int;
    use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

    use super::PROCESS_STOP;
    use crate::prelude::*;

    extern "C" fn handle_sigint(_signal: c_int) {
        PROCESS_STOP.store(true, Ordering::SeqCst);
    }

    pub fn install() -> WiimoteResult<()> {
        let action = SigAction::new(
            SigHandler::Handler(handle_sigint),
            SaFlags::SA_RESTART,
            SigSet::empty(),
        );
        unsafe { sigaction(Signal::SIGINT, &action) }
            .map(|_previous| ())
            .map_err(|errno| WiimoteError::Signal(errno.to_string()))
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use std::sync::atomic::Ordering;

    use windows::Win32::Foundation::{BOOL, FALSE, TRUE};
    use windows::Win32::System::Console::{SetConsoleCtrlHandler, CTRL_BREAK_EVENT, CTRL_C_EVENT};

    use super::PROCESS_STOP;
    use crate::prelude::*;

    unsafe extern "system" fn handle_ctrl(ctrl_type: u32) -> BOOL {
        if ctrl_type == CTRL_C_EVENT || ctrl_type == CTRL_BREAK_EVENT {
            PROCESS_STOP.store(true, Ordering::SeqCst);
            TRUE
        } else {
            FALSE
        }
    }

    pub fn install() -> WiimoteResult<()> {
        unsafe { SetConsoleCtrlHandler(Some(handle_ctrl), TRUE) }
            .map_err(|error| WiimoteError::Signal(error.to_string()))
    }
}

#[cfg(not(any(unix, target_os = "windows")))]
mod platform {
    use crate::prelude::*;

    pub fn install() -> WiimoteResult<()> {
        log::warn!("Ctrl+C handling is not supported on this platform");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raise_is_shared_between_clones() {
        let signal = StopSignal::new();
        let clone = signal.clone();

        assert!(!clone.is_raised());
        signal.raise();
        assert!(clone.is_raised());
    }

    #[test]
    fn test_local_signal_is_independent_of_process_signal() {
        let local = StopSignal::new();
        local.raise();

        assert!(!PROCESS_STOP.load(Ordering::SeqCst));
    }
}
