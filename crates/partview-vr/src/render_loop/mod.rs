//! The VR render thread.
//!
//! One [`VrRenderThread`] is one worker instance with a one-way lifecycle:
//! stage actors while idle, start, feed commands, end, join. Restarting means
//! building a new instance; [`crate::lifecycle::VrController`] does that
//! bookkeeping for the scene owner.

mod config;
mod events;
mod state;
mod thread;
mod worker;

pub use config::VrConfig;
pub use events::{StopReport, VrEvent};
pub use state::ThreadState;
pub use thread::{StartError, VrRenderThread};
