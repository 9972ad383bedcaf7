use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::actor::{ActorId, ActorSummary, VrActor};
use crate::command::Axis;
use crate::device::HeadPose;
use crate::material::Rgb;

use super::{DrawActor, StereoFrame, StereoRig};

/// Where the mirrored parts appear in the VR room.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Placement {
    /// World position of the center of the staged parts.
    pub anchor: Vec3,
    /// Size, in meters, of the largest side of the staged parts' bounds.
    pub extent: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            anchor: Vec3::new(0.0, 1.3, -1.5),
            extent: 1.0,
        }
    }
}

/// Scene graph owned by the render thread.
///
/// Built once from the staged clones. Parts are authored in arbitrary units
/// (STL files are often millimeters), so the whole set is fitted to
/// [`Placement::extent`] and centered on [`Placement::anchor`].
#[derive(Debug, Default)]
pub struct VrScene {
    actors: Vec<VrActor>,
    index: HashMap<ActorId, usize>,
    fit: Mat4,
    anchor: Vec3,
    orientation: Quat,
    /// Degrees per second around X, Y, Z.
    spin: Vec3,
}

impl VrScene {
    pub fn new(staged: Vec<VrActor>, placement: Placement) -> Self {
        let mut actors = Vec::with_capacity(staged.len());
        let mut index = HashMap::with_capacity(staged.len());

        for actor in staged {
            if index.contains_key(&actor.source()) {
                log::debug!("{} staged twice; keeping the first clone", actor.source());
                continue;
            }
            index.insert(actor.source(), actors.len());
            actors.push(actor);
        }

        let fit = fit_transform(&actors, placement.extent);

        Self {
            actors,
            index,
            fit,
            anchor: placement.anchor,
            orientation: Quat::IDENTITY,
            spin: Vec3::ZERO,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn actors(&self) -> &[VrActor] {
        &self.actors
    }

    pub fn get(&self, id: ActorId) -> Option<&VrActor> {
        self.index.get(&id).map(|&i| &self.actors[i])
    }

    /// Recolors the clone made from `id`. Returns `false` if there is none.
    pub fn set_color(&mut self, id: ActorId, color: Rgb) -> bool {
        match self.index.get(&id) {
            Some(&i) => {
                self.actors[i].set_color(color);
                true
            }
            None => false,
        }
    }

    pub fn set_spin(&mut self, axis: Axis, degrees_per_second: f32) {
        match axis {
            Axis::X => self.spin.x = degrees_per_second,
            Axis::Y => self.spin.y = degrees_per_second,
            Axis::Z => self.spin.z = degrees_per_second,
        }
    }

    #[inline]
    pub fn spin(&self) -> Vec3 {
        self.spin
    }

    #[inline]
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Advances animation state by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if self.spin == Vec3::ZERO {
            return;
        }

        for (axis, rate) in [Axis::X, Axis::Y, Axis::Z].into_iter().zip(self.spin.to_array()) {
            if rate != 0.0 {
                let step = Quat::from_axis_angle(axis.unit(), (rate * dt).to_radians());
                self.orientation = step * self.orientation;
            }
        }

        self.orientation = self.orientation.normalize();
    }

    /// Part-space to world transform shared by every actor.
    pub fn scene_transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.anchor) * self.fit
    }

    /// Builds the frame description for the device. Hidden actors are skipped.
    pub fn frame(&self, frame_index: u64, pose: HeadPose, rig: &StereoRig) -> StereoFrame<'_> {
        let model = self.scene_transform();
        let actors = self
            .actors
            .iter()
            .filter(|a| a.material().visible)
            .map(|a| DrawActor {
                id: a.source(),
                name: a.name(),
                geometry: a.geometry(),
                model,
                color: a.material().color,
                opacity: a.material().opacity,
            })
            .collect();

        StereoFrame {
            frame_index,
            pose,
            eyes: rig.eye_views(pose),
            actors,
        }
    }

    pub fn summaries(&self) -> Vec<ActorSummary> {
        self.actors.iter().map(VrActor::summary).collect()
    }

    /// Drops every clone.
    pub fn clear(&mut self) {
        self.actors.clear();
        self.index.clear();
    }
}

fn fit_transform(actors: &[VrActor], extent: f32) -> Mat4 {
    let bounds = actors
        .iter()
        .filter_map(|a| a.geometry().bounds())
        .reduce(|(lo_a, hi_a), (lo_b, hi_b)| (lo_a.min(lo_b), hi_a.max(hi_b)));

    let Some((lo, hi)) = bounds else {
        return Mat4::IDENTITY;
    };

    let center = (lo + hi) * 0.5;
    let largest = (hi - lo).max_element();
    let scale = if largest > f32::EPSILON { extent / largest } else { 1.0 };

    Mat4::from_scale(Vec3::splat(scale)) * Mat4::from_translation(-center)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Actor, Geometry};

    fn staged(n: usize) -> (Vec<Actor>, Vec<VrActor>) {
        let actors: Vec<Actor> = (0..n)
            .map(|i| Actor::new(format!("part{i}"), Geometry::cube([i as f32 * 10.0, 0.0, 0.0], 5.0)))
            .collect();
        let clones = actors.iter().map(Actor::clone_for_vr).collect();
        (actors, clones)
    }

    #[test]
    fn recolor_hits_only_the_addressed_clone() {
        let (actors, clones) = staged(3);
        let mut scene = VrScene::new(clones, Placement::default());

        assert!(scene.set_color(actors[1].id(), Rgb::RED));

        assert_eq!(scene.get(actors[0].id()).unwrap().material().color, Rgb::WHITE);
        assert_eq!(scene.get(actors[1].id()).unwrap().material().color, Rgb::RED);
        assert_eq!(scene.get(actors[2].id()).unwrap().material().color, Rgb::WHITE);
    }

    #[test]
    fn recolor_of_unmirrored_actor_is_a_no_op() {
        let (_, clones) = staged(1);
        let stranger = Actor::new("not mirrored", Geometry::cube([0.0; 3], 1.0));
        let mut scene = VrScene::new(clones, Placement::default());
        assert!(!scene.set_color(stranger.id(), Rgb::RED));
    }

    #[test]
    fn duplicate_staging_keeps_one_clone() {
        let actor = Actor::new("twice", Geometry::cube([0.0; 3], 1.0));
        let scene = VrScene::new(
            vec![actor.clone_for_vr(), actor.clone_for_vr()],
            Placement::default(),
        );
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn parts_are_fitted_to_placement() {
        let (_, clones) = staged(3);
        let placement = Placement::default();
        let scene = VrScene::new(clones, placement);

        // Bounds span x in [-5, 25]; the far corner lands half an extent from the anchor.
        let corner = scene.scene_transform().transform_point3(Vec3::new(25.0, 0.0, 0.0));
        assert!((corner - placement.anchor - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn spin_rotates_over_time() {
        let (_, clones) = staged(1);
        let mut scene = VrScene::new(clones, Placement::default());
        scene.set_spin(Axis::Y, 90.0);
        scene.advance(1.0);
        let expected = Quat::from_rotation_y(90f32.to_radians());
        assert!(scene.orientation().angle_between(expected) < 1e-4);
    }

    #[test]
    fn hidden_actors_are_not_drawn() {
        let mut hidden = Actor::new("hidden", Geometry::cube([0.0; 3], 1.0));
        hidden.set_visible(false);
        let shown = Actor::new("shown", Geometry::cube([0.0; 3], 1.0));
        let scene = VrScene::new(
            vec![hidden.clone_for_vr(), shown.clone_for_vr()],
            Placement::default(),
        );

        let frame = scene.frame(0, HeadPose::STANDING, &StereoRig::default());
        assert_eq!(frame.actors.len(), 1);
        assert_eq!(frame.actors[0].id, shown.id());
    }

    #[test]
    fn empty_scene_builds_empty_frames() {
        let scene = VrScene::new(Vec::new(), Placement::default());
        let frame = scene.frame(7, HeadPose::STANDING, &StereoRig::default());
        assert!(frame.actors.is_empty());
        assert_eq!(frame.frame_index, 7);
    }
}
