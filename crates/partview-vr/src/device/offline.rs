use std::collections::HashMap;

use crate::actor::ActorId;
use crate::scene::StereoFrame;
use crate::time::FrameTime;

use super::{DeviceError, DeviceMode, HeadPose, ResourceCounter, VrDevice};

/// Counters kept by the offline device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OfflineStats {
    pub frames_presented: u64,
    pub triangles_last_frame: usize,
    pub actors_rejected: usize,
}

#[derive(Debug, Clone, Copy)]
enum Upload {
    Accepted { triangles: usize },
    Rejected,
}

/// Display-less device.
///
/// Each actor's geometry is validated the first time it is presented (the
/// equivalent of a GPU upload) and counted as one held resource; the internal
/// framebuffer is one more. Frames are "rendered" by tallying the accepted
/// triangles for both eyes.
#[derive(Debug)]
pub struct OfflineDevice {
    counter: ResourceCounter,
    uploads: HashMap<ActorId, Upload>,
    framebuffer: bool,
    pose: HeadPose,
    stats: OfflineStats,
}

impl OfflineDevice {
    pub fn new(counter: ResourceCounter) -> Self {
        Self {
            counter,
            uploads: HashMap::new(),
            framebuffer: false,
            pose: HeadPose::STANDING,
            stats: OfflineStats::default(),
        }
    }

    pub fn stats(&self) -> OfflineStats {
        self.stats
    }

    fn ensure_framebuffer(&mut self) {
        if !self.framebuffer {
            self.framebuffer = true;
            self.counter.acquire(1);
        }
    }

    fn upload(&mut self, frame: &StereoFrame<'_>) {
        for actor in &frame.actors {
            if self.uploads.contains_key(&actor.id) {
                continue;
            }

            let upload = match actor.geometry.validate() {
                Ok(()) => {
                    self.counter.acquire(1);
                    Upload::Accepted {
                        triangles: actor.geometry.triangle_count(),
                    }
                }
                Err(err) => {
                    log::warn!("offline device: skipping '{}' ({}): {err}", actor.name, actor.id);
                    self.stats.actors_rejected += 1;
                    Upload::Rejected
                }
            };
            self.uploads.insert(actor.id, upload);
        }
    }
}

impl VrDevice for OfflineDevice {
    fn name(&self) -> &str {
        "offline"
    }

    fn mode(&self) -> DeviceMode {
        DeviceMode::Offline
    }

    fn paces_frames(&self) -> bool {
        false
    }

    fn poll(&mut self, _time: &FrameTime) -> Result<HeadPose, DeviceError> {
        Ok(self.pose)
    }

    fn present(&mut self, frame: &StereoFrame<'_>) -> Result<(), DeviceError> {
        self.ensure_framebuffer();
        self.upload(frame);

        let per_eye: usize = frame
            .actors
            .iter()
            .filter_map(|a| match self.uploads.get(&a.id) {
                Some(Upload::Accepted { triangles }) => Some(*triangles),
                _ => None,
            })
            .sum();

        self.stats.triangles_last_frame = per_eye * frame.eyes.len();
        self.stats.frames_presented += 1;
        Ok(())
    }

    fn resources_held(&self) -> usize {
        let uploads = self
            .uploads
            .values()
            .filter(|u| matches!(u, Upload::Accepted { .. }))
            .count();
        uploads + usize::from(self.framebuffer)
    }

    fn release(&mut self) {
        self.counter.release(self.resources_held());
        self.uploads.clear();
        self.framebuffer = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Actor, Geometry};
    use crate::scene::{Placement, StereoRig, VrScene};

    #[test]
    fn present_uploads_each_actor_once() {
        let counter = ResourceCounter::new();
        let mut device = OfflineDevice::new(counter.clone());
        let actors = [
            Actor::new("a", Geometry::cube([0.0; 3], 1.0)),
            Actor::new("b", Geometry::cube([3.0, 0.0, 0.0], 1.0)),
        ];
        let scene = VrScene::new(actors.iter().map(Actor::clone_for_vr).collect(), Placement::default());
        let rig = StereoRig::default();

        for i in 0..3 {
            device.present(&scene.frame(i, HeadPose::STANDING, &rig)).unwrap();
        }

        assert_eq!(counter.held(), 3);
        assert_eq!(device.stats().frames_presented, 3);
        assert_eq!(device.stats().triangles_last_frame, 2 * 12 * 2);
    }

    #[test]
    fn invalid_geometry_is_rejected_not_fatal() {
        let counter = ResourceCounter::new();
        let mut device = OfflineDevice::new(counter.clone());
        let broken = Actor::new("broken", Geometry::new(vec![[0.0; 3]; 3], vec![0, 1, 9]));
        let scene = VrScene::new(vec![broken.clone_for_vr()], Placement::default());

        let frame = scene.frame(0, HeadPose::STANDING, &StereoRig::default());
        assert!(device.present(&frame).is_ok());
        assert_eq!(device.stats().actors_rejected, 1);
        assert_eq!(counter.held(), 1);
    }

    #[test]
    fn release_returns_every_resource() {
        let counter = ResourceCounter::new();
        let mut device = OfflineDevice::new(counter.clone());
        let actor = Actor::new("a", Geometry::cube([0.0; 3], 1.0));
        let scene = VrScene::new(vec![actor.clone_for_vr()], Placement::default());
        device.present(&scene.frame(0, HeadPose::STANDING, &StereoRig::default())).unwrap();
        assert_eq!(counter.held(), 2);

        device.release();
        assert_eq!(counter.held(), 0);
        assert_eq!(device.resources_held(), 0);
    }
}
