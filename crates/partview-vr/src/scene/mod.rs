//! The render thread's private scene graph.
//!
//! Responsibilities:
//! - own the VR clones staged before start
//! - apply recolor/spin updates coming from the command drain
//! - build per-frame stereo views for the device

mod view;
mod vr_scene;

pub use view::{DrawActor, Eye, EyeView, StereoFrame, StereoRig};
pub use vr_scene::{Placement, VrScene};
