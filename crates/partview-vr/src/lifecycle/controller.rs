use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, info, warn};

use crate::actor::{Actor, ActorId};
use crate::command::CommandKind;
use crate::device::DeviceFactory;
use crate::render_loop::{StartError, ThreadState, VrConfig, VrEvent, VrRenderThread};

use super::Notice;

/// Owns at most one active render thread.
///
/// Each `start` builds a fresh [`VrRenderThread`] with the next generation.
/// The previous instance, already stopped, moves to a retire list and is
/// joined and freed by [`reap_retired`](VrController::reap_retired). Events
/// from any generation but the active one are discarded when polled.
pub struct VrController {
    config: VrConfig,
    make_device: Box<dyn FnMut() -> Box<dyn DeviceFactory>>,
    events_tx: Sender<VrEvent>,
    events_rx: Receiver<VrEvent>,
    active: Option<VrRenderThread>,
    retired: Vec<VrRenderThread>,
    generation: u64,
    notices: Vec<Notice>,
}

impl VrController {
    /// Notices kept between two [`take_notices`](VrController::take_notices) calls.
    pub const MAX_NOTICES: usize = 16;

    /// `make_device` is called once per start to build that instance's device factory.
    pub fn new(
        config: VrConfig,
        make_device: impl FnMut() -> Box<dyn DeviceFactory> + 'static,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            config,
            make_device: Box::new(make_device),
            events_tx,
            events_rx,
            active: None,
            retired: Vec::new(),
            generation: 0,
            notices: Vec::new(),
        }
    }

    /// Generation of the most recently started instance; 0 before the first start.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> ThreadState {
        self.active
            .as_ref()
            .map_or(ThreadState::Idle, VrRenderThread::state)
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(VrRenderThread::is_running)
    }

    pub fn config(&self) -> &VrConfig {
        &self.config
    }

    // ── lifecycle ──────────────────────────────────────────────────────────

    /// Starts a new instance mirroring `actors`. Returns its generation.
    pub fn start<'a>(
        &mut self,
        actors: impl IntoIterator<Item = &'a Actor>,
    ) -> Result<u64, StartError> {
        self.reap_retired();

        if self.is_running() {
            warn!("VR start requested while vr#{} is running", self.generation);
            self.notify(Notice::AlreadyRunning);
            return Err(StartError::AlreadyRunning);
        }

        if let Some(previous) = self.active.take() {
            debug!("retiring vr#{}", previous.generation());
            self.retired.push(previous);
        }

        self.generation += 1;
        let mut thread = VrRenderThread::new(
            self.generation,
            self.config.clone(),
            (self.make_device)(),
            self.events_tx.clone(),
        );
        for actor in actors {
            thread.add_actor_offline(actor);
        }
        let staged = thread.staged_len();

        match thread.start() {
            Ok(()) => {
                info!("vr#{}: started with {staged} actor(s)", self.generation);
                self.active = Some(thread);
                self.notify(Notice::Started);
                Ok(self.generation)
            }
            Err(err) => {
                self.notify(Notice::StartFailed(err.to_string()));
                self.retired.push(thread);
                Err(err)
            }
        }
    }

    /// Ends the active instance and joins it. Returns `false` if nothing was running.
    pub fn stop(&mut self) -> bool {
        let Some(active) = self.active.as_mut() else {
            self.notify(Notice::NotRunning);
            return false;
        };

        if !active.is_running() {
            // Ended on its own (device failure); just collect the thread.
            active.wait();
            self.notify(Notice::NotRunning);
            return false;
        }

        active.stop();
        info!("vr#{}: stopped", active.generation());
        self.notify(Notice::Stopped);
        true
    }

    /// Joins and frees retired instances whose threads have exited.
    pub fn reap_retired(&mut self) -> usize {
        let before = self.retired.len();
        self.retired.retain_mut(|thread| {
            if thread.is_finished() {
                thread.wait();
                false
            } else {
                true
            }
        });
        before - self.retired.len()
    }

    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }

    // ── commands ───────────────────────────────────────────────────────────

    fn running(&self) -> Option<&VrRenderThread> {
        self.active.as_ref().filter(|t| t.is_running())
    }

    /// Forwards a recolor to the running instance. `false` if none is running.
    pub fn change_actor_color(&self, actor: ActorId, r: f64, g: f64, b: f64) -> bool {
        self.running()
            .is_some_and(|t| t.change_actor_color(actor, r, g, b))
    }

    pub fn issue_command(&self, kind: CommandKind, value: f64) -> bool {
        self.running().is_some_and(|t| t.issue_command(kind, value))
    }

    pub fn issue_fence(&mut self) -> Option<u64> {
        self.active
            .as_mut()
            .filter(|t| t.is_running())
            .and_then(VrRenderThread::issue_fence)
    }

    // ── events ─────────────────────────────────────────────────────────────

    /// Drains pending events of the active generation.
    ///
    /// Device failures also produce a notice.
    pub fn poll_events(&mut self) -> Vec<VrEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if event.generation() != self.generation {
                debug!("discarding event from retired vr#{}", event.generation());
                continue;
            }
            match &event {
                VrEvent::DeviceUnavailable { reason, .. } => {
                    self.notify(Notice::DeviceUnavailable(reason.clone()));
                }
                VrEvent::DeviceFailed { reason, .. } => {
                    self.notify(Notice::DeviceFailed(reason.clone()));
                }
                _ => {}
            }
            out.push(event);
        }
        out
    }

    fn notify(&mut self, notice: Notice) {
        if self.notices.len() == Self::MAX_NOTICES {
            self.notices.remove(0);
        }
        self.notices.push(notice);
    }

    /// Takes the notices produced since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl Drop for VrController {
    fn drop(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.stop();
        }
        for mut thread in self.retired.drain(..) {
            thread.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, mpsc};
    use std::thread;
    use std::time::{Duration, Instant};

    use parking_lot::Mutex;

    use super::*;
    use crate::actor::Geometry;
    use crate::device::OpenError;
    use crate::device::testing::ScriptedFactory;

    fn controller(factory: &ScriptedFactory) -> VrController {
        let factory = factory.clone();
        let config = VrConfig {
            frame_interval: Duration::from_millis(1),
            ..VrConfig::default()
        };
        VrController::new(config, move || factory.boxed())
    }

    fn parts(n: usize) -> Vec<Actor> {
        (0..n)
            .map(|i| Actor::new(format!("part {i}"), Geometry::cube([i as f32, 0.0, 0.0], 0.5)))
            .collect()
    }

    fn wait_until(mut cond: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < deadline, "condition not reached");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn stop_when_idle_reports_not_running() {
        let mut vr = controller(&ScriptedFactory::new());

        assert!(!vr.stop());
        assert_eq!(vr.state(), ThreadState::Idle);
        assert_eq!(vr.take_notices(), vec![Notice::NotRunning]);
    }

    #[test]
    fn start_while_running_leaves_the_instance_alone() {
        let factory = ScriptedFactory::new();
        let mut vr = controller(&factory);
        let actors = parts(2);

        assert_eq!(vr.start(&actors), Ok(1));
        vr.take_notices();

        assert_eq!(vr.start(&actors), Err(StartError::AlreadyRunning));
        assert_eq!(vr.generation(), 1);
        assert!(vr.is_running());
        assert_eq!(vr.take_notices(), vec![Notice::AlreadyRunning]);
        assert_eq!(vr.retired_count(), 0);
    }

    #[test]
    fn stop_joins_and_releases_resources() {
        let factory = ScriptedFactory::new();
        let mut vr = controller(&factory);
        vr.start(&parts(3)).unwrap();
        wait_until(|| factory.counter.held() == 3);

        assert!(vr.stop());
        assert_eq!(vr.state(), ThreadState::Stopped);
        assert_eq!(factory.counter.held(), 0);
        assert_eq!(vr.take_notices(), vec![Notice::Started, Notice::Stopped]);
    }

    #[test]
    fn restart_retires_the_previous_instance() {
        let factory = ScriptedFactory::new();
        let mut vr = controller(&factory);
        let actors = parts(1);

        vr.start(&actors).unwrap();
        vr.stop();
        assert_eq!(vr.start(&actors), Ok(2));
        assert_eq!(vr.retired_count(), 1);

        assert_eq!(vr.reap_retired(), 1);
        assert_eq!(vr.retired_count(), 0);
        assert!(vr.is_running());
    }

    #[test]
    fn events_from_retired_generations_are_discarded() {
        let factory = ScriptedFactory::new();
        let mut vr = controller(&factory);
        let actors = parts(2);

        vr.start(&actors).unwrap();
        vr.issue_fence().unwrap();
        vr.stop();

        vr.start(&actors).unwrap();
        let fence = vr.issue_fence().unwrap();

        let mut seen = Vec::new();
        wait_until(|| {
            seen.extend(vr.poll_events());
            seen.iter()
                .any(|e| matches!(e, VrEvent::FenceReached { fence: f, .. } if *f == fence))
        });
        assert!(seen.iter().all(|e| e.generation() == 2));
        assert!(matches!(
            seen.first(),
            Some(VrEvent::ActorsReceived { actors, .. }) if actors.len() == 2
        ));
    }

    #[test]
    fn recolor_is_forwarded_only_while_running() {
        let factory = ScriptedFactory::new();
        let mut vr = controller(&factory);
        let actors = parts(1);

        assert!(!vr.change_actor_color(actors[0].id(), 1.0, 0.0, 0.0));
        vr.start(&actors).unwrap();
        assert!(vr.change_actor_color(actors[0].id(), 1.0, 0.0, 0.0));
        vr.stop();
        assert!(!vr.change_actor_color(actors[0].id(), 1.0, 0.0, 0.0));
        assert!(!vr.issue_command(CommandKind::RotateZ, 30.0));
    }

    #[test]
    fn device_failure_surfaces_as_notice() {
        let mut factory = ScriptedFactory::new();
        factory.open_error = Some(OpenError::Fatal("adapter lost".into()));
        let mut vr = controller(&factory);
        vr.start(&parts(1)).unwrap();

        wait_until(|| !vr.is_running());
        vr.poll_events();
        assert!(!vr.stop());
        assert_eq!(
            vr.take_notices(),
            vec![
                Notice::Started,
                Notice::DeviceFailed("adapter lost".into()),
                Notice::NotRunning
            ]
        );
    }

    #[test]
    fn drop_stops_the_active_instance() {
        let factory = ScriptedFactory::new();
        let mut vr = controller(&factory);
        vr.start(&parts(2)).unwrap();
        wait_until(|| factory.counter.held() == 2);

        drop(vr);
        assert_eq!(factory.counter.held(), 0);
    }

    #[test]
    fn stop_while_stopping_joins_the_worker() {
        let (open_gate, gate) = mpsc::channel();
        let mut factory = ScriptedFactory::new();
        factory.release_gate = Some(Arc::new(Mutex::new(gate)));
        let mut vr = controller(&factory);
        vr.start(&parts(1)).unwrap();
        wait_until(|| factory.counter.held() == 1);

        // The worker sees the sentinel and parks in device release.
        assert!(vr.issue_command(CommandKind::EndRender, 0.0));
        wait_until(|| vr.state() == ThreadState::Stopping);
        assert!(vr.is_running());

        let opener = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            open_gate.send(()).unwrap();
        });
        assert!(vr.stop());
        opener.join().unwrap();

        assert_eq!(vr.state(), ThreadState::Stopped);
        assert_eq!(factory.counter.held(), 0);
        assert_eq!(vr.take_notices(), vec![Notice::Started, Notice::Stopped]);
    }

    #[test]
    fn stop_after_raw_end_render_collects_the_thread() {
        let factory = ScriptedFactory::new();
        let mut vr = controller(&factory);
        vr.start(&parts(2)).unwrap();

        assert!(vr.issue_command(CommandKind::EndRender, 0.0));
        wait_until(|| vr.state() == ThreadState::Stopped);

        assert!(!vr.stop());
        assert!(!vr.issue_command(CommandKind::RotateX, 10.0));
        assert_eq!(factory.counter.held(), 0);
        assert_eq!(vr.take_notices(), vec![Notice::Started, Notice::NotRunning]);
    }

    #[test]
    fn notices_are_bounded() {
        let mut vr = controller(&ScriptedFactory::new());
        for _ in 0..40 {
            vr.stop();
        }
        assert_eq!(vr.take_notices().len(), VrController::MAX_NOTICES);
    }

    #[test]
    fn notice_texts() {
        assert_eq!(Notice::Started.to_string(), "VR started");
        assert_eq!(Notice::AlreadyRunning.to_string(), "VR is already running.");
        assert_eq!(Notice::Stopped.to_string(), "VR thread stopped");
        assert_eq!(Notice::NotRunning.to_string(), "VR thread was not running");
        assert_eq!(Notice::Started.timeout_ms(), 2000);
    }
}
