use std::time::Duration;

use crate::scene::{Placement, StereoRig};

/// Render-loop configuration.
#[derive(Debug, Clone)]
pub struct VrConfig {
    /// Frame slot for devices that do not block on a display refresh.
    pub frame_interval: Duration,

    /// Present frames from the first iteration. When `false`, the loop only
    /// polls and drains until a `StartRender` command arrives.
    pub present_on_start: bool,

    pub rig: StereoRig,

    pub placement: Placement,
}

impl Default for VrConfig {
    fn default() -> Self {
        Self {
            // ~90 Hz, the common headset refresh.
            frame_interval: Duration::from_micros(11_111),
            present_on_start: true,
            rig: StereoRig::default(),
            placement: Placement::default(),
        }
    }
}
