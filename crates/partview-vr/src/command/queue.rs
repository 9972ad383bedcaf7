use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use super::Command;

/// FIFO of pending commands shared by the scene owner and the render loop.
///
/// Every access goes through one mutex; producers never wait on command
/// execution, only on the (short) critical section. Once the loop closes the
/// queue, pushes are dropped.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<QueueInner>>,
}

#[derive(Debug, Default)]
struct QueueInner {
    pending: VecDeque<Command>,
    closed: bool,
    dropped: u64,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues `command`. Returns `false` if the queue is closed.
    pub fn push(&self, command: Command) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            inner.dropped += 1;
            return false;
        }
        inner.pending.push_back(command);
        true
    }

    /// Takes everything queued up to now, in submission order.
    ///
    /// Commands pushed after the lock is released land in the next drain.
    pub fn drain(&self) -> VecDeque<Command> {
        std::mem::take(&mut self.inner.lock().pending)
    }

    /// Closes the queue and discards whatever is still pending.
    ///
    /// Returns the number of discarded commands.
    pub fn close(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.closed = true;
        let discarded = inner.pending.len();
        inner.pending.clear();
        inner.dropped += discarded as u64;
        discarded
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Commands rejected or discarded because the queue was closed.
    pub fn dropped(&self) -> u64 {
        self.inner.lock().dropped
    }
}
