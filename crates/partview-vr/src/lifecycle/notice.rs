use std::fmt;

/// User-facing message produced by the controller, meant for a status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Started,
    AlreadyRunning,
    Stopped,
    NotRunning,
    StartFailed(String),
    DeviceUnavailable(String),
    DeviceFailed(String),
}

impl Notice {
    /// How long a status bar should show the notice.
    pub const TIMEOUT_MS: u32 = 2000;

    #[inline]
    pub fn timeout_ms(&self) -> u32 {
        Self::TIMEOUT_MS
    }

    /// `true` for notices that report a problem.
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::StartFailed(_) | Notice::DeviceFailed(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Started => f.write_str("VR started"),
            Notice::AlreadyRunning => f.write_str("VR is already running."),
            Notice::Stopped => f.write_str("VR thread stopped"),
            Notice::NotRunning => f.write_str("VR thread was not running"),
            Notice::StartFailed(reason) => write!(f, "VR failed to start: {reason}"),
            Notice::DeviceUnavailable(_) => f.write_str("No VR headset found, rendering offline"),
            Notice::DeviceFailed(reason) => write!(f, "VR device failed: {reason}"),
        }
    }
}
