use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of one render-thread instance.
///
/// Transitions only move forward: `Idle -> Running -> Stopping -> Stopped`,
/// with `Running -> Stopped` on a fatal device failure. `Stopped` is terminal.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ThreadState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl ThreadState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ThreadState::Idle,
            1 => ThreadState::Running,
            2 => ThreadState::Stopping,
            _ => ThreadState::Stopped,
        }
    }

    /// `true` while the worker thread may still be executing.
    #[inline]
    pub fn is_live(self) -> bool {
        matches!(self, ThreadState::Running | ThreadState::Stopping)
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ThreadState::Idle => "idle",
            ThreadState::Running => "running",
            ThreadState::Stopping => "stopping",
            ThreadState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// `ThreadState` readable from both threads.
#[derive(Debug)]
pub(crate) struct SharedState(AtomicU8);

impl SharedState {
    pub(crate) fn new(state: ThreadState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    #[inline]
    pub(crate) fn load(&self) -> ThreadState {
        ThreadState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `next` if that is a forward transition. Returns the previous state.
    pub(crate) fn advance(&self, next: ThreadState) -> ThreadState {
        let prev = self
            .0
            .fetch_max(next as u8, Ordering::AcqRel);
        ThreadState::from_u8(prev)
    }

    /// Moves `from -> to` only if the current state is `from`.
    pub(crate) fn transition(&self, from: ThreadState, to: ThreadState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_never_goes_backwards() {
        let s = SharedState::new(ThreadState::Idle);
        s.advance(ThreadState::Stopped);
        assert_eq!(s.advance(ThreadState::Running), ThreadState::Stopped);
        assert_eq!(s.load(), ThreadState::Stopped);
    }

    #[test]
    fn transition_requires_expected_state() {
        let s = SharedState::new(ThreadState::Idle);
        assert!(s.transition(ThreadState::Idle, ThreadState::Running));
        assert!(!s.transition(ThreadState::Idle, ThreadState::Running));
        assert_eq!(s.load(), ThreadState::Running);
    }

    #[test]
    fn live_states() {
        assert!(!ThreadState::Idle.is_live());
        assert!(ThreadState::Running.is_live());
        assert!(ThreadState::Stopping.is_live());
        assert!(!ThreadState::Stopped.is_live());
    }
}
