use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation token.
///
/// Any thread may `request()` a stop; the trainer consumes the request with
/// `take()` once per epoch boundary and answers it with one schedule
/// tightening. Requests are repeatable.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> StopSignal {
        StopSignal::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Returns whether a stop was pending and clears it.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

impl From<Arc<AtomicBool>> for StopSignal {
    fn from(flag: Arc<AtomicBool>) -> Self {
        StopSignal(flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_consumes_the_request() {
        let signal = StopSignal::new();
        assert!(!signal.take());
        signal.request();
        let clone = signal.clone();
        assert!(clone.is_requested());
        assert!(clone.take());
        assert!(!signal.take());
    }

    #[test]
    fn shared_flag_is_observed() {
        let flag = Arc::new(AtomicBool::new(false));
        let signal = StopSignal::from(flag.clone());
        flag.store(true, Ordering::Relaxed);
        assert!(signal.take());
    }
}
