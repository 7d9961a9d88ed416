use hidapi::HidError;

/// Errors raised while talking to a Wii remote.
#[derive(Debug, thiserror::Error)]
pub enum WiimoteError {
    #[error("HID error: {0}")]
    HidApiError(#[from] HidError),
    #[error("invalid report: {0}")]
    WiimoteDeviceError(#[from] WiimoteDeviceError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Wii remote disconnected")]
    Disconnected,
    #[error("no Wii remote found")]
    NotFound,
    #[error("interrupted")]
    Interrupted,
    #[error("failed to install interrupt handler: {0}")]
    Signal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WiimoteDeviceError {
    #[error("unexpected report data")]
    InvalidData,
    #[error("report is empty")]
    MissingData,
}

/// The ways a polling session can fail. None of them is retried.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to connect: {0}")]
    ConnectionFailed(#[source] WiimoteError),
    #[error("error reading input: {0}")]
    ReadFailure(#[source] WiimoteError),
    #[error("failed to write to the terminal: {0}")]
    Terminal(#[from] std::io::Error),
}

pub type WiimoteResult<T> = Result<T, WiimoteError>;
pub type SessionResult<T> = Result<T, SessionError>;
