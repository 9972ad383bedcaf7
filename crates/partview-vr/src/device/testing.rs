//! Scripted device for render-loop tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use parking_lot::Mutex;

use crate::actor::ActorId;
use crate::material::Rgb;
use crate::scene::StereoFrame;
use crate::time::FrameTime;

use super::{DeviceError, DeviceFactory, DeviceMode, HeadPose, OpenError, ResourceCounter, VrDevice};

/// What the device saw, shared with the test.
#[derive(Debug, Default)]
pub(crate) struct DeviceLog {
    pub polls: u64,
    /// Actor colors per presented frame, in draw order.
    pub presented: Vec<Vec<(ActorId, Rgb)>>,
    pub released: bool,
}

/// Device whose failures are scripted per call.
pub(crate) struct ScriptedDevice {
    counter: ResourceCounter,
    log: Arc<Mutex<DeviceLog>>,
    poll_script: VecDeque<DeviceError>,
    present_script: VecDeque<DeviceError>,
    release_gate: Option<Arc<Mutex<Receiver<()>>>>,
    held: usize,
}

impl ScriptedDevice {
    fn record(&self, frame: &StereoFrame<'_>) {
        let colors = frame.actors.iter().map(|a| (a.id, a.color)).collect();
        self.log.lock().presented.push(colors);
    }
}

impl VrDevice for ScriptedDevice {
    fn name(&self) -> &str {
        "scripted"
    }

    fn mode(&self) -> DeviceMode {
        DeviceMode::Display
    }

    fn paces_frames(&self) -> bool {
        false
    }

    fn poll(&mut self, _time: &FrameTime) -> Result<HeadPose, DeviceError> {
        self.log.lock().polls += 1;
        match self.poll_script.pop_front() {
            Some(err) => Err(err),
            None => Ok(HeadPose::STANDING),
        }
    }

    fn present(&mut self, frame: &StereoFrame<'_>) -> Result<(), DeviceError> {
        if let Some(err) = self.present_script.pop_front() {
            return Err(err);
        }
        if frame.actors.len() > self.held {
            self.counter.acquire(frame.actors.len() - self.held);
            self.held = frame.actors.len();
        }
        self.record(frame);
        Ok(())
    }

    fn resources_held(&self) -> usize {
        self.held
    }

    fn release(&mut self) {
        if let Some(gate) = &self.release_gate {
            // Bounded so a broken test cannot hang the suite.
            let _ = gate.lock().recv_timeout(Duration::from_secs(5));
        }
        self.counter.release(self.held);
        self.held = 0;
        self.log.lock().released = true;
    }
}

/// Builds scripted devices and keeps handles the test can inspect.
#[derive(Clone, Default)]
pub(crate) struct ScriptedFactory {
    pub counter: ResourceCounter,
    pub log: Arc<Mutex<DeviceLog>>,
    pub open_error: Option<OpenError>,
    pub poll_failures: Vec<DeviceError>,
    pub present_failures: Vec<DeviceError>,
    /// When set, `release` blocks until a value arrives, holding the loop in `Stopping`.
    pub release_gate: Option<Arc<Mutex<Receiver<()>>>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn DeviceFactory> {
        Box::new(self.clone())
    }
}

impl DeviceFactory for ScriptedFactory {
    fn open(&mut self) -> Result<Box<dyn VrDevice>, OpenError> {
        if let Some(err) = self.open_error.clone() {
            return Err(err);
        }
        Ok(Box::new(ScriptedDevice {
            counter: self.counter.clone(),
            log: Arc::clone(&self.log),
            poll_script: self.poll_failures.drain(..).collect(),
            present_script: self.present_failures.drain(..).collect(),
            release_gate: self.release_gate.clone(),
            held: 0,
        }))
    }
}
