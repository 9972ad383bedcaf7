//! VR display devices.
//!
//! This module is responsible for:
//! - the device contract the render loop drives once per frame (poll, present, release)
//! - mapping device failures to frame-level actions (skip vs. stop)
//! - the offline validator used when no display is available
//! - the wgpu stereo emulator

mod error;
mod gpu;
mod offline;
mod pose;
mod resources;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{DeviceError, DeviceErrorKind, FrameErrorAction, OpenError};
pub use gpu::{GpuInit, StereoEmulator, StereoEmulatorFactory};
pub use offline::{OfflineDevice, OfflineStats};
pub use pose::HeadPose;
pub use resources::ResourceCounter;

use crate::scene::StereoFrame;
use crate::time::FrameTime;

/// How a device shows frames.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DeviceMode {
    /// A head-mounted or stereo display.
    Display,
    /// No display; frames are validated against an internal framebuffer.
    Offline,
}

/// A display device driven by the render loop.
///
/// All methods are called from the render thread only. Implementations own
/// their GPU/driver handles and must give all of them back in [`release`].
///
/// [`release`]: VrDevice::release
pub trait VrDevice: Send {
    fn name(&self) -> &str;

    fn mode(&self) -> DeviceMode;

    /// `true` if `present` blocks on the display's refresh.
    ///
    /// The loop sleeps out the frame slot for devices that return `false`.
    fn paces_frames(&self) -> bool;

    /// Reads head pose and input for the upcoming frame.
    fn poll(&mut self, time: &FrameTime) -> Result<HeadPose, DeviceError>;

    /// Renders and presents one stereo frame.
    fn present(&mut self, frame: &StereoFrame<'_>) -> Result<(), DeviceError>;

    /// Number of device resources currently held.
    fn resources_held(&self) -> usize;

    /// Releases every device resource. Called exactly once, at loop teardown.
    fn release(&mut self);
}

/// Opens the device at render-loop entry, on the render thread.
pub trait DeviceFactory: Send {
    fn open(&mut self) -> Result<Box<dyn VrDevice>, OpenError>;
}

impl<F> DeviceFactory for F
where
    F: FnMut() -> Result<Box<dyn VrDevice>, OpenError> + Send,
{
    fn open(&mut self) -> Result<Box<dyn VrDevice>, OpenError> {
        self()
    }
}

/// Factory for hosts without any display; the loop always runs offline.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDisplay;

impl DeviceFactory for NoDisplay {
    fn open(&mut self) -> Result<Box<dyn VrDevice>, OpenError> {
        Err(OpenError::Unavailable("no display device configured".to_string()))
    }
}
