//! Frame timing.
//!
//! The VR worker owns one `FrameClock`; it ticks once per loop iteration and
//! is also used to pace devices that do not block on vsync.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
