use glam::{Mat4, Quat, Vec3};

/// Head pose in tracking space (meters, right-handed, +Y up, -Z forward).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HeadPose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl HeadPose {
    /// Standing eye height, looking down -Z.
    pub const STANDING: HeadPose = HeadPose {
        position: Vec3::new(0.0, 1.6, 0.0),
        orientation: Quat::IDENTITY,
    };

    #[inline]
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Head-to-world transform.
    #[inline]
    pub fn to_matrix(self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }
}

impl Default for HeadPose {
    fn default() -> Self {
        Self::STANDING
    }
}
