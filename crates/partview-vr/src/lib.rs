//! partview VR core.
//!
//! Mirrors actors from a UI-owned scene into an independently running VR
//! render loop. The UI thread stages clones, starts the loop and then talks to
//! it only through an ordered command queue; the loop posts events back.

pub mod actor;
pub mod command;
pub mod device;
pub mod lifecycle;
pub mod logging;
pub mod material;
pub mod render_loop;
pub mod scene;
pub mod time;

pub use actor::{Actor, ActorId, ActorSummary, Geometry};
pub use command::{Axis, Command, CommandKind};
pub use lifecycle::{Notice, VrController};
pub use material::{Material, Rgb};
pub use render_loop::{StartError, StopReport, ThreadState, VrConfig, VrEvent, VrRenderThread};
