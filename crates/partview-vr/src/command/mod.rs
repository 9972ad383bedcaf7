//! Command channel from the scene owner to the VR render loop.
//!
//! Responsibilities:
//! - typed commands plus a raw `(tag, value)` entry point for scalar commands
//! - a lock-guarded FIFO shared by both threads
//! - drop semantics once the loop has stopped

mod kind;
mod queue;

pub use kind::{Axis, Command, CommandKind};
pub use queue::CommandQueue;
