//! Start/stop bookkeeping for the VR render thread.

mod controller;
mod notice;

pub use controller::VrController;
pub use notice::Notice;
