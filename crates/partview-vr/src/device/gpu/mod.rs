//! Desktop stereo emulator built on wgpu.
//!
//! Stands in for a head-mounted display: renders both eye views side by side
//! into an offscreen texture, with a slowly swaying simulated head.

mod emulator;
mod init;
mod mesh;

pub use emulator::{StereoEmulator, StereoEmulatorFactory};
pub use init::GpuInit;
