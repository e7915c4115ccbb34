use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Cooperative cancellation shared between a caller and a running engine.
///
/// Engines poll [`CancelFlag::is_cancelled`] between pair examinations or
/// branch decisions and stop with an interrupted verdict once it is raised.
/// A child flag observes its parent, but cancelling the child leaves the
/// parent untouched.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    own: Arc<AtomicBool>,
    parent: Option<Arc<CancelFlag>>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        Self {
            own: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    pub fn cancel(&self) {
        self.own.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.own.load(Ordering::Relaxed)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// Raises the flag from a detached timer thread once `timeout` elapses.
    pub fn cancel_after(&self, timeout: Duration) {
        let flag = self.clone();
        thread::spawn(move || {
            thread::sleep(timeout);
            flag.cancel();
        });
    }
}
