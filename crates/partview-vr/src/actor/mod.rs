//! Renderable actors.
//!
//! An [`Actor`] is the UI-side handle produced by the mesh-loading
//! collaborator. Handing it to the VR loop goes through
//! [`Actor::clone_for_vr`], which yields a [`VrActor`] the worker owns
//! outright. Geometry is immutable and shared behind an `Arc`; material
//! state is copied.

mod geometry;
mod handle;

pub use geometry::{Geometry, GeometryError};
pub use handle::{Actor, ActorId, ActorSummary, VrActor};
