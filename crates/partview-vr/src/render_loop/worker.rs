use std::sync::Arc;
use std::sync::mpsc::Sender;

use log::{debug, error, info, warn};

use crate::actor::VrActor;
use crate::command::{Command, CommandQueue};
use crate::device::{
    DeviceError, DeviceFactory, FrameErrorAction, HeadPose, OfflineDevice, OpenError,
    ResourceCounter, VrDevice,
};
use crate::scene::VrScene;
use crate::time::FrameClock;

use super::config::VrConfig;
use super::events::{StopReport, VrEvent};
use super::state::{SharedState, ThreadState};

/// Everything the render thread owns once spawned.
pub(crate) struct Worker {
    pub generation: u64,
    pub config: VrConfig,
    pub state: Arc<SharedState>,
    pub queue: CommandQueue,
    pub events: Sender<VrEvent>,
    pub offline_counter: ResourceCounter,
}

/// Outcome of draining the queue once.
#[derive(Debug, Default, Eq, PartialEq)]
struct Drained {
    stop: bool,
    dropped: usize,
}

impl Worker {
    pub(crate) fn run(self, mut factory: Box<dyn DeviceFactory>, staged: Vec<VrActor>) {
        let tag = format!("vr#{}", self.generation);

        let mut device: Box<dyn VrDevice> = match factory.open() {
            Ok(device) => {
                info!("{tag}: opened {} ({:?})", device.name(), device.mode());
                device
            }
            Err(OpenError::Unavailable(reason)) => {
                warn!("{tag}: display unavailable ({reason}); rendering offline");
                self.emit(VrEvent::DeviceUnavailable {
                    generation: self.generation,
                    reason,
                });
                Box::new(OfflineDevice::new(self.offline_counter.clone()))
            }
            Err(OpenError::Fatal(reason)) => {
                error!("{tag}: device initialization failed: {reason}");
                self.emit(VrEvent::DeviceFailed {
                    generation: self.generation,
                    reason,
                });
                let dropped = self.queue.close();
                self.state.advance(ThreadState::Stopped);
                self.emit(VrEvent::Stopped {
                    generation: self.generation,
                    report: StopReport {
                        commands_dropped: dropped,
                        ..StopReport::default()
                    },
                });
                return;
            }
        };

        let mut scene = VrScene::new(staged, self.config.placement);
        info!("{tag}: mirroring {} actor(s)", scene.len());
        self.emit(VrEvent::ActorsReceived {
            generation: self.generation,
            actors: scene.summaries(),
        });

        let mut report = StopReport::default();
        let mut latch = FailureLatch::default();
        let mut presenting = self.config.present_on_start;
        let mut clock = FrameClock::new();

        loop {
            let time = clock.tick();

            // ── poll ───────────────────────────────────────────────────────
            let pose = match device.poll(&time) {
                Ok(pose) => Some(pose),
                Err(err) => match err.action() {
                    FrameErrorAction::SkipFrame => {
                        latch.fail(&tag, &err);
                        None
                    }
                    FrameErrorAction::Fatal => {
                        self.fail(&tag, &err);
                        break;
                    }
                },
            };

            // ── commands ───────────────────────────────────────────────────
            let drained = self.apply(&tag, &mut scene, &mut presenting);
            report.commands_dropped += drained.dropped;
            if drained.stop {
                break;
            }

            // ── update / present ───────────────────────────────────────────
            scene.advance(time.dt);

            match pose {
                None => report.frames_skipped += 1,
                Some(pose) if presenting => {
                    match self.present(device.as_mut(), &scene, time.frame_index, pose) {
                        Ok(()) => {
                            latch.recover(&tag);
                            report.frames_presented += 1;
                        }
                        Err(err) if err.action() == FrameErrorAction::SkipFrame => {
                            latch.fail(&tag, &err);
                            report.frames_skipped += 1;
                        }
                        Err(err) => {
                            self.fail(&tag, &err);
                            break;
                        }
                    }
                }
                Some(_) => {
                    latch.recover(&tag);
                }
            }

            if !device.paces_frames() {
                clock.pace(self.config.frame_interval);
            }
        }

        // ── teardown ───────────────────────────────────────────────────────
        report.final_actors = scene.summaries();
        scene.clear();

        device.release();
        report.resources_leaked = device.resources_held();
        if report.resources_leaked > 0 {
            warn!(
                "{tag}: {} still holds {} resource(s) after release",
                device.name(),
                report.resources_leaked
            );
        }
        drop(device);

        report.commands_dropped += self.queue.close();
        self.state.advance(ThreadState::Stopped);

        info!(
            "{tag}: stopped after {} frame(s) ({} skipped)",
            report.frames_presented, report.frames_skipped
        );
        self.emit(VrEvent::Stopped {
            generation: self.generation,
            report,
        });
    }

    fn present(
        &self,
        device: &mut dyn VrDevice,
        scene: &VrScene,
        frame_index: u64,
        pose: HeadPose,
    ) -> Result<(), DeviceError> {
        let frame = scene.frame(frame_index, pose, &self.config.rig);
        device.present(&frame)
    }

    /// Applies every command queued so far, in order.
    fn apply(&self, tag: &str, scene: &mut VrScene, presenting: &mut bool) -> Drained {
        let mut pending = self.queue.drain();
        let mut out = Drained::default();

        while let Some(command) = pending.pop_front() {
            match command {
                Command::EndRender => {
                    self.state.advance(ThreadState::Stopping);
                    out.stop = true;
                    out.dropped = pending.len();
                    if out.dropped > 0 {
                        debug!("{tag}: dropping {} command(s) queued after end", out.dropped);
                    }
                    break;
                }
                Command::StartRender => *presenting = true,
                Command::ChangeColor { actor, color } => {
                    if !scene.set_color(actor, color) {
                        debug!("{tag}: recolor for unknown {actor} ignored");
                    }
                }
                Command::Rotate {
                    axis,
                    degrees_per_second,
                } => scene.set_spin(axis, degrees_per_second),
                Command::Fence(fence) => self.emit(VrEvent::FenceReached {
                    generation: self.generation,
                    fence,
                }),
                Command::Unknown { tag: raw, value } => {
                    debug!("{tag}: ignoring unknown command tag {raw} ({value})");
                }
            }
        }

        out
    }

    fn fail(&self, tag: &str, err: &DeviceError) {
        error!("{tag}: {err}; stopping");
        self.state.advance(ThreadState::Stopping);
        self.emit(VrEvent::DeviceFailed {
            generation: self.generation,
            reason: err.message().to_string(),
        });
    }

    fn emit(&self, event: VrEvent) {
        if self.events.send(event).is_err() {
            debug!("vr#{}: event receiver gone", self.generation);
        }
    }
}

/// Logs a failure streak once instead of once per skipped frame.
#[derive(Debug, Default)]
struct FailureLatch {
    skipped: u64,
    last: Option<String>,
}

impl FailureLatch {
    /// Records a skipped frame. Returns `true` if this occurrence was logged.
    fn fail(&mut self, tag: &str, err: &DeviceError) -> bool {
        self.skipped += 1;
        if self.last.as_deref() == Some(err.message()) {
            return false;
        }
        warn!("{tag}: {err}; skipping frames");
        self.last = Some(err.message().to_string());
        true
    }

    /// Ends a streak. Returns the number of frames it skipped.
    fn recover(&mut self, tag: &str) -> u64 {
        let skipped = std::mem::take(&mut self.skipped);
        if skipped > 0 {
            info!("{tag}: device recovered after {skipped} skipped frame(s)");
        }
        self.last = None;
        skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_logs_once_per_streak() {
        let mut latch = FailureLatch::default();
        let err = DeviceError::transient("pose timeout");

        assert!(latch.fail("vr#1", &err));
        assert!(!latch.fail("vr#1", &err));
        assert!(!latch.fail("vr#1", &err));
        assert_eq!(latch.recover("vr#1"), 3);

        assert!(latch.fail("vr#1", &err));
    }

    #[test]
    fn latch_logs_again_when_the_error_changes() {
        let mut latch = FailureLatch::default();
        assert!(latch.fail("vr#1", &DeviceError::transient("pose timeout")));
        assert!(latch.fail("vr#1", &DeviceError::transient("swap image lost")));
    }

    #[test]
    fn recover_without_streak_is_quiet() {
        let mut latch = FailureLatch::default();
        assert_eq!(latch.recover("vr#1"), 0);
    }
}
