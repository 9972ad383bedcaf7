use std::fmt;

/// High-level response to a device error within a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameErrorAction {
    /// Transient error; skip the current frame and keep running.
    SkipFrame,
    /// The device is gone; stop the loop gracefully.
    Fatal,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeviceErrorKind {
    /// Timeouts, dropped poses, lost swap images.
    Transient,
    /// Device lost, out of memory.
    Fatal,
}

/// Failure reported by [`VrDevice::poll`](super::VrDevice::poll) or
/// [`VrDevice::present`](super::VrDevice::present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceError {
    kind: DeviceErrorKind,
    message: String,
}

impl DeviceError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: DeviceErrorKind::Transient,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: DeviceErrorKind::Fatal,
            message: message.into(),
        }
    }

    #[inline]
    pub fn kind(&self) -> DeviceErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Converts the error into what the loop should do with the frame.
    pub fn action(&self) -> FrameErrorAction {
        match self.kind {
            DeviceErrorKind::Transient => FrameErrorAction::SkipFrame,
            DeviceErrorKind::Fatal => FrameErrorAction::Fatal,
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DeviceErrorKind::Transient => write!(f, "transient device error: {}", self.message),
            DeviceErrorKind::Fatal => write!(f, "fatal device error: {}", self.message),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Failure to open a device at loop entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    /// No display is attached. The loop falls back to offline rendering.
    Unavailable(String),
    /// Initialization failed. The loop stops without rendering.
    Fatal(String),
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenError::Unavailable(reason) => write!(f, "display unavailable: {reason}"),
            OpenError::Fatal(reason) => write!(f, "device initialization failed: {reason}"),
        }
    }
}

impl std::error::Error for OpenError {}
