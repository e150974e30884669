use std::sync::atomic::{AtomicUsize, Ordering};

/// Lock-free pool of request tickets shared by the workers.
#[derive(Debug)]
pub(super) struct RequestBudget {
    total: usize,
    issued: AtomicUsize,
}

impl RequestBudget {
    pub(super) const fn new(total: usize) -> Self {
        Self {
            total,
            issued: AtomicUsize::new(0),
        }
    }

    /// Claims the next ticket, or `None` once all `total` tickets are gone.
    pub(super) fn try_claim(&self) -> Option<usize> {
        loop {
            let current = self.issued.load(Ordering::Relaxed);
            if current >= self.total {
                return None;
            }
            let next = current.checked_add(1)?;
            if self
                .issued
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return Some(current);
            }
        }
    }

    pub(super) fn issued(&self) -> usize {
        self.issued.load(Ordering::Relaxed)
    }
}
