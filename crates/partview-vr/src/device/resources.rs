use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared count of live device resources.
///
/// Devices bump it as they allocate and bring it back down in `release`.
/// Clones observe the same count, so the owner can check it after the
/// render thread has been joined.
#[derive(Debug, Clone, Default)]
pub struct ResourceCounter(Arc<AtomicUsize>);

impl ResourceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn acquire(&self, n: usize) {
        self.0.fetch_add(n, Ordering::AcqRel);
    }

    /// Gives back `n` resources. Saturates at zero.
    #[inline]
    pub fn release(&self, n: usize) {
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                Some(held.saturating_sub(n))
            });
    }

    #[inline]
    pub fn held(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}
