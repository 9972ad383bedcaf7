use glam::{Mat4, Vec3};

use crate::actor::{ActorId, Geometry};
use crate::device::HeadPose;
use crate::material::Rgb;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    /// -1 for the left eye, +1 for the right.
    #[inline]
    fn side(self) -> f32 {
        match self {
            Eye::Left => -1.0,
            Eye::Right => 1.0,
        }
    }
}

/// Stereo camera parameters.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StereoRig {
    /// Interpupillary distance in meters.
    pub ipd: f32,
    /// Vertical field of view per eye.
    pub fov_y_degrees: f32,
    /// Width / height of one eye image.
    pub eye_aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for StereoRig {
    fn default() -> Self {
        Self {
            ipd: 0.064,
            fov_y_degrees: 100.0,
            eye_aspect: 0.9,
            near: 0.05,
            far: 100.0,
        }
    }
}

impl StereoRig {
    /// Left and right eye views for `pose`.
    pub fn eye_views(&self, pose: HeadPose) -> [EyeView; 2] {
        [self.eye_view(pose, Eye::Left), self.eye_view(pose, Eye::Right)]
    }

    fn eye_view(&self, pose: HeadPose, eye: Eye) -> EyeView {
        let offset = Vec3::X * (eye.side() * self.ipd * 0.5);
        let eye_to_world = pose.to_matrix() * Mat4::from_translation(offset);
        let projection = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.eye_aspect.max(f32::EPSILON),
            self.near,
            self.far,
        );

        EyeView {
            eye,
            position: eye_to_world.transform_point3(Vec3::ZERO),
            view: eye_to_world.inverse(),
            projection,
        }
    }
}

/// Camera for one eye.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EyeView {
    pub eye: Eye,
    /// Eye position in world space.
    pub position: Vec3,
    pub view: Mat4,
    pub projection: Mat4,
}

impl EyeView {
    #[inline]
    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// One actor as the device should draw it this frame.
#[derive(Debug, Clone)]
pub struct DrawActor<'a> {
    pub id: ActorId,
    pub name: &'a str,
    pub geometry: &'a Geometry,
    pub model: Mat4,
    pub color: Rgb,
    pub opacity: f32,
}

/// Everything a device needs to present one frame.
#[derive(Debug, Clone)]
pub struct StereoFrame<'a> {
    pub frame_index: u64,
    pub pose: HeadPose,
    pub eyes: [EyeView; 2],
    /// Visible actors in staging order.
    pub actors: Vec<DrawActor<'a>>,
}
