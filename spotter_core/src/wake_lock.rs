//! Keeps the screen awake while a guided session is running.
//!
//! [`ScreenWakeLock`] tracks two things separately: whether the session
//! *wants* a lock, and whether a lock is currently *held*. The platform may
//! drop a held lock on its own (screen locked, app backgrounded); when the
//! app becomes visible again and the lock is still wanted, it is requested
//! again. Dropping the `ScreenWakeLock` always releases the lock.

use crate::Result;

/// Platform facility that can hand out wake locks
pub trait WakeLockProvider: Send {
    fn is_supported(&self) -> bool;
    fn acquire(&mut self) -> Result<Box<dyn WakeLockHandle>>;
}

/// A lock currently granted by the platform
pub trait WakeLockHandle: Send {
    /// True once the platform has released the lock on its own
    fn is_released(&mut self) -> bool;
    fn release(self: Box<Self>) -> Result<()>;
}

pub struct ScreenWakeLock {
    provider: Box<dyn WakeLockProvider>,
    handle: Option<Box<dyn WakeLockHandle>>,
    supported: bool,
    wanted: bool,
}

impl ScreenWakeLock {
    pub fn new(provider: Box<dyn WakeLockProvider>) -> Self {
        let supported = provider.is_supported();
        tracing::debug!(supported, "Wake lock support detected");
        Self {
            provider,
            handle: None,
            supported,
            wanted: false,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Whether a lock is currently held
    pub fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Acquire a lock if supported and not already held
    ///
    /// Acquisition failures are logged; the lock stays wanted so a later
    /// visibility change can try again.
    pub fn request(&mut self) {
        self.wanted = true;
        if !self.supported || self.handle.is_some() {
            return;
        }

        match self.provider.acquire() {
            Ok(handle) => {
                tracing::info!("Screen wake lock acquired");
                self.handle = Some(handle);
            }
            Err(e) => {
                tracing::warn!("Failed to acquire screen wake lock: {}", e);
            }
        }
    }

    /// Release the lock if held; the lock is no longer wanted afterwards
    pub fn release(&mut self) {
        self.wanted = false;
        if let Some(handle) = self.handle.take() {
            match handle.release() {
                Ok(()) => tracing::info!("Screen wake lock released"),
                Err(e) => tracing::warn!("Failed to release screen wake lock: {}", e),
            }
        }
    }

    /// Notice a lock the platform released on its own
    pub fn poll(&mut self) {
        let released = self
            .handle
            .as_mut()
            .map(|handle| handle.is_released())
            .unwrap_or(false);

        if released {
            tracing::info!("Screen wake lock was released by the platform");
            self.handle = None;
        }
    }

    /// Re-acquire after the app becomes visible again, if still wanted
    pub fn on_visibility_change(&mut self, visible: bool) {
        if !visible {
            return;
        }
        self.poll();
        if self.wanted && self.handle.is_none() {
            tracing::debug!("Visible again with wake lock lost, re-requesting");
            self.request();
        }
    }
}

impl Drop for ScreenWakeLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Provider for machines without any wake lock facility
#[derive(Clone, Copy, Debug, Default)]
pub struct NoWakeLock;

impl WakeLockProvider for NoWakeLock {
    fn is_supported(&self) -> bool {
        false
    }

    fn acquire(&mut self) -> Result<Box<dyn WakeLockHandle>> {
        Err(crate::Error::Other("wake lock not supported".into()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory provider shared by the wake lock and session tests.

    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct FakePlatform {
        pub acquired: Arc<AtomicUsize>,
        pub released: Arc<AtomicUsize>,
        /// Flip to simulate the platform dropping the current lock
        pub revoked: Arc<AtomicBool>,
        pub fail_acquire: Arc<AtomicBool>,
    }

    impl FakePlatform {
        pub fn acquired(&self) -> usize {
            self.acquired.load(Ordering::SeqCst)
        }

        pub fn released(&self) -> usize {
            self.released.load(Ordering::SeqCst)
        }
    }

    struct FakeHandle {
        platform: FakePlatform,
    }

    impl WakeLockHandle for FakeHandle {
        fn is_released(&mut self) -> bool {
            self.platform.revoked.load(Ordering::SeqCst)
        }

        fn release(self: Box<Self>) -> Result<()> {
            self.platform.released.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl WakeLockProvider for FakePlatform {
        fn is_supported(&self) -> bool {
            true
        }

        fn acquire(&mut self) -> Result<Box<dyn WakeLockHandle>> {
            if self.fail_acquire.load(Ordering::SeqCst) {
                return Err(Error::Other("denied".into()));
            }
            self.revoked.store(false, Ordering::SeqCst);
            self.acquired.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeHandle {
                platform: self.clone(),
            }))
        }
    }
}
