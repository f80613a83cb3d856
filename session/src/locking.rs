use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Answers whether the `sessions` table carries a live `lock_version` column.
///
/// The store asks on every locking-sensitive call and never caches the answer,
/// so an implementation may flip at runtime.
pub trait LockingPolicy: Send + Sync {
    fn locking_enabled(&self) -> bool;
}

impl LockingPolicy for bool {
    fn locking_enabled(&self) -> bool {
        *self
    }
}

impl LockingPolicy for AtomicBool {
    fn locking_enabled(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<T: LockingPolicy + ?Sized> LockingPolicy for Arc<T> {
    fn locking_enabled(&self) -> bool {
        (**self).locking_enabled()
    }
}
