//! Cross-thread wake primitives.
//!
//! Both implementations coalesce: any number of `signal()` calls made while
//! the consumer is busy collapse into a single wake-up. The consumer therefore
//! has to drain the whole queue on every wake.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

/// Producer side of a wake primitive. `signal` never blocks and may be
/// called any number of times from any thread.
pub trait WakeSignal: Send + Sync {
    fn signal(&self);
}

/// Wake primitive for an async consumer, backed by [`tokio::sync::Notify`].
///
/// A signal sent while nobody is waiting is stored as a single permit.
#[derive(Debug, Default)]
pub struct NotifyWake {
    notify: Notify,
}

impl NotifyWake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve once a signal has been (or already was) delivered.
    pub async fn signaled(&self) {
        self.notify.notified().await;
    }
}

impl WakeSignal for NotifyWake {
    fn signal(&self) {
        self.notify.notify_one();
    }
}

/// Wake primitive for a blocking consumer thread: a pending flag guarded by
/// a mutex plus a condition variable.
#[derive(Debug, Default)]
pub struct CondvarWake {
    pending: Mutex<bool>,
    cond: Condvar,
}

impl CondvarWake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until a signal is pending, then consume it.
    pub fn wait(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        while !*pending {
            pending = self
                .cond
                .wait(pending)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *pending = false;
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`. Returns whether
    /// a signal was consumed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut pending, _) = self
            .cond
            .wait_timeout_while(pending, timeout, |pending| !*pending)
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *pending)
    }
}

impl WakeSignal for CondvarWake {
    fn signal(&self) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cond.notify_one();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[tokio::test]
    async fn notify_signal_before_wait_is_kept() {
        let wake = NotifyWake::new();
        wake.signal();
        tokio::time::timeout(Duration::from_secs(1), wake.signaled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn notify_coalesces_repeated_signals() {
        let wake = NotifyWake::new();
        wake.signal();
        wake.signal();
        wake.signal();
        wake.signaled().await;
        let second = tokio::time::timeout(Duration::from_millis(50), wake.signaled()).await;
        assert!(second.is_err(), "three signals should yield one wake");
    }

    #[test]
    fn condvar_coalesces_repeated_signals() {
        let wake = CondvarWake::new();
        wake.signal();
        wake.signal();
        assert!(wake.wait_timeout(Duration::from_millis(10)));
        assert!(!wake.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn condvar_wait_returns_after_signal_from_other_thread() {
        let wake = Arc::new(CondvarWake::new());
        let signaller = {
            let wake = Arc::clone(&wake);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                wake.signal();
            })
        };
        wake.wait();
        signaller.join().unwrap();
        assert!(!wake.wait_timeout(Duration::from_millis(1)));
    }
}
