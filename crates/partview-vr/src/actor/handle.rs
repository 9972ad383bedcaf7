use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::material::{Material, Rgb};

use super::Geometry;

static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an actor.
///
/// Survives cloning, so a VR clone can be addressed with the id of the UI
/// actor it was made from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ActorId(u64);

impl ActorId {
    /// Allocates a process-unique id.
    pub fn next() -> Self {
        Self(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// UI-side renderable handle: geometry plus material state.
///
/// Not `Clone`: every actor has its own identity. Use [`Actor::duplicate`]
/// for a second UI actor or [`Actor::clone_for_vr`] for the VR copy.
#[derive(Debug)]
pub struct Actor {
    id: ActorId,
    name: String,
    geometry: Arc<Geometry>,
    material: Material,
}

impl Actor {
    pub fn new(name: impl Into<String>, geometry: Geometry) -> Self {
        Self::from_shared(name, Arc::new(geometry))
    }

    /// Creates an actor over geometry that is already shared.
    pub fn from_shared(name: impl Into<String>, geometry: Arc<Geometry>) -> Self {
        Self {
            id: ActorId::next(),
            name: name.into(),
            geometry,
            material: Material::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> ActorId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[inline]
    pub fn geometry(&self) -> &Arc<Geometry> {
        &self.geometry
    }

    #[inline]
    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.material.color = color;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.material.visible = visible;
    }

    /// A new UI actor with the same geometry and material and a fresh id.
    pub fn duplicate(&self) -> Actor {
        Actor {
            id: ActorId::next(),
            name: self.name.clone(),
            geometry: Arc::clone(&self.geometry),
            material: self.material,
        }
    }

    /// Makes the independent copy the VR loop will own.
    pub fn clone_for_vr(&self) -> VrActor {
        VrActor {
            source: self.id,
            name: self.name.clone(),
            geometry: Arc::clone(&self.geometry),
            material: self.material,
        }
    }
}

/// VR-side clone of an [`Actor`].
///
/// Lives on the render thread once staged. The UI thread can only reach it
/// through commands addressed by [`VrActor::source`].
#[derive(Debug, Clone)]
pub struct VrActor {
    source: ActorId,
    name: String,
    geometry: Arc<Geometry>,
    material: Material,
}

impl VrActor {
    /// Id of the UI actor this clone was made from.
    #[inline]
    pub fn source(&self) -> ActorId {
        self.source
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.material.color = color;
    }

    pub fn summary(&self) -> ActorSummary {
        ActorSummary {
            id: self.source,
            name: self.name.clone(),
            color: self.material.color,
            visible: self.material.visible,
            triangles: self.geometry.triangle_count(),
        }
    }
}

/// Plain snapshot of a VR actor, safe to send back to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSummary {
    pub id: ActorId,
    pub name: String,
    pub color: Rgb,
    pub visible: bool,
    pub triangles: usize,
}
