use crate::actor::ActorSummary;

/// Notification posted by the render thread for the owner to poll.
///
/// Every event carries the generation of the instance that posted it, so the
/// owner can tell a retired instance's late events from the live one's.
#[derive(Debug, Clone, PartialEq)]
pub enum VrEvent {
    /// The staged actors were adopted; posted once, before the first frame.
    ActorsReceived {
        generation: u64,
        actors: Vec<ActorSummary>,
    },
    /// No display could be opened; the loop renders offline.
    DeviceUnavailable { generation: u64, reason: String },
    /// The device failed fatally; the loop is stopping.
    DeviceFailed { generation: u64, reason: String },
    /// Every command queued before the fence has been applied.
    FenceReached { generation: u64, fence: u64 },
    /// The loop exited and released its device.
    Stopped { generation: u64, report: StopReport },
}

impl VrEvent {
    pub fn generation(&self) -> u64 {
        match self {
            VrEvent::ActorsReceived { generation, .. }
            | VrEvent::DeviceUnavailable { generation, .. }
            | VrEvent::DeviceFailed { generation, .. }
            | VrEvent::FenceReached { generation, .. }
            | VrEvent::Stopped { generation, .. } => *generation,
        }
    }
}

/// Final accounting of one render-thread run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StopReport {
    pub frames_presented: u64,
    pub frames_skipped: u64,
    /// VR-side actors as they were when the loop stopped.
    pub final_actors: Vec<ActorSummary>,
    /// Device resources still held after release. Zero for a well-behaved device.
    pub resources_leaked: usize,
    /// Commands dropped because they arrived after `EndRender`.
    pub commands_dropped: usize,
}
