use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use log::{error, warn};

use crate::actor::{Actor, ActorId, VrActor};
use crate::command::{Command, CommandKind, CommandQueue};
use crate::device::{DeviceFactory, ResourceCounter};
use crate::material::Rgb;

use super::config::VrConfig;
use super::events::VrEvent;
use super::state::{SharedState, ThreadState};
use super::worker::Worker;

/// Why [`VrRenderThread::start`] refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    /// The instance (or, at controller level, another instance) is running.
    AlreadyRunning,
    /// The instance already ran to completion. Build a new one.
    AlreadyStarted(ThreadState),
    /// The OS refused to spawn the worker.
    Spawn(String),
}

impl fmt::Display for StartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartError::AlreadyRunning => f.write_str("VR render thread is already running"),
            StartError::AlreadyStarted(state) => {
                write!(f, "VR render thread cannot be restarted (state: {state})")
            }
            StartError::Spawn(reason) => write!(f, "failed to spawn VR render thread: {reason}"),
        }
    }
}

impl std::error::Error for StartError {}

/// Handle to one VR render-thread instance.
///
/// Owned by the UI thread. Actors are staged with [`add_actor_offline`]
/// while idle; after [`start`] the only way to reach the worker is the
/// command queue.
///
/// [`add_actor_offline`]: VrRenderThread::add_actor_offline
/// [`start`]: VrRenderThread::start
pub struct VrRenderThread {
    generation: u64,
    config: VrConfig,
    state: Arc<SharedState>,
    queue: CommandQueue,
    events: Sender<VrEvent>,
    factory: Option<Box<dyn DeviceFactory>>,
    staged: Vec<VrActor>,
    offline_counter: ResourceCounter,
    next_fence: u64,
    handle: Option<JoinHandle<()>>,
}

impl VrRenderThread {
    /// Creates an idle instance. Events are posted to `events` tagged with `generation`.
    pub fn new(
        generation: u64,
        config: VrConfig,
        factory: Box<dyn DeviceFactory>,
        events: Sender<VrEvent>,
    ) -> Self {
        Self {
            generation,
            config,
            state: Arc::new(SharedState::new(ThreadState::Idle)),
            queue: CommandQueue::new(),
            events,
            factory: Some(factory),
            staged: Vec::new(),
            offline_counter: ResourceCounter::new(),
            next_fence: 0,
            handle: None,
        }
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn state(&self) -> ThreadState {
        self.state.load()
    }

    /// `true` from `start` until the worker has exited.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.state().is_live()
    }

    /// Number of actors staged so far.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Resources held by the offline fallback device, if it was used.
    pub fn offline_resources(&self) -> &ResourceCounter {
        &self.offline_counter
    }

    // ── staging ────────────────────────────────────────────────────────────

    /// Stages a VR clone of `actor`. Only valid before `start`.
    pub fn add_actor_offline(&mut self, actor: &Actor) -> bool {
        let state = self.state();
        if state != ThreadState::Idle {
            warn!(
                "vr#{}: {} staged while {state}; ignored",
                self.generation,
                actor.id()
            );
            return false;
        }
        self.staged.push(actor.clone_for_vr());
        true
    }

    // ── commands ───────────────────────────────────────────────────────────

    /// Queues a command. Returns `false` if it was dropped because the loop has ended.
    pub fn issue(&self, command: Command) -> bool {
        if self.state() == ThreadState::Stopped {
            return false;
        }
        self.queue.push(command)
    }

    /// Queues a scalar command by kind.
    pub fn issue_command(&self, kind: CommandKind, value: f64) -> bool {
        self.issue(Command::from_raw(kind.tag(), value))
    }

    /// Queues a scalar command by raw tag. Unknown tags reach the loop and are ignored there.
    pub fn issue_raw(&self, tag: u32, value: f64) -> bool {
        self.issue(Command::from_raw(tag, value))
    }

    /// Recolors the VR clone of `actor`. Components are clamped to `[0, 1]`.
    pub fn change_actor_color(&self, actor: ActorId, r: f64, g: f64, b: f64) -> bool {
        self.issue(Command::ChangeColor {
            actor,
            color: Rgb::from_normalized(r, g, b),
        })
    }

    /// Queues a fence and returns its id, or `None` if it was dropped.
    pub fn issue_fence(&mut self) -> Option<u64> {
        self.next_fence += 1;
        let fence = self.next_fence;
        self.issue(Command::Fence(fence)).then_some(fence)
    }

    // ── lifecycle ──────────────────────────────────────────────────────────

    /// Spawns the worker. The staged actors move to it.
    pub fn start(&mut self) -> Result<(), StartError> {
        if !self.state.transition(ThreadState::Idle, ThreadState::Running) {
            return Err(match self.state() {
                s if s.is_live() => StartError::AlreadyRunning,
                s => StartError::AlreadyStarted(s),
            });
        }

        let Some(factory) = self.factory.take() else {
            self.state.advance(ThreadState::Stopped);
            return Err(StartError::AlreadyStarted(ThreadState::Idle));
        };

        let worker = Worker {
            generation: self.generation,
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            queue: self.queue.clone(),
            events: self.events.clone(),
            offline_counter: self.offline_counter.clone(),
        };
        let staged = std::mem::take(&mut self.staged);

        let spawned = thread::Builder::new()
            .name(format!("partview-vr-{}", self.generation))
            .spawn(move || worker.run(factory, staged));

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(err) => {
                error!("vr#{}: spawn failed: {err}", self.generation);
                self.queue.close();
                self.state.advance(ThreadState::Stopped);
                Err(StartError::Spawn(err.to_string()))
            }
        }
    }

    /// `true` once the worker has exited (or was never started).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Blocks until the worker exits. Does not ask it to stop.
    pub fn wait(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if handle.join().is_err() {
            error!("vr#{}: render thread panicked", self.generation);
            self.queue.close();
            self.state.advance(ThreadState::Stopped);
        }
    }

    /// Asks the worker to end and joins it.
    pub fn stop(&mut self) {
        if self.is_running() {
            self.queue.push(Command::EndRender);
        }
        self.wait();
    }
}

impl Drop for VrRenderThread {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for VrRenderThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VrRenderThread")
            .field("generation", &self.generation)
            .field("state", &self.state())
            .field("staged", &self.staged.len())
            .field("pending", &self.queue.len())
            .finish()
    }
}
