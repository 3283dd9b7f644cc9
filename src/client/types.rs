use crate::types::GenerateResponse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-call progress callback: `(message, fraction in 0.0..=1.0)`.
pub type ProgressFn<'a> = dyn Fn(&str, f64) + Send + Sync + 'a;

/// Per-batch progress callback: `(completed, total, response or None on failure)`.
pub type BatchProgressFn<'a> =
    dyn Fn(usize, usize, Option<&GenerateResponse>) + Send + Sync + 'a;

/// Cooperative cancellation flag.
///
/// Cancelling never aborts a request mid-flight. The client checks the flag
/// before each progress report and before handing back a result; once it is
/// set, further progress is suppressed and the call yields
/// [`Error::Cancelled`](crate::Error::Cancelled).
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

pub(crate) fn is_cancelled(cancel: Option<&CancelHandle>) -> bool {
    cancel.map_or(false, CancelHandle::is_cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_flag() {
        let a = CancelHandle::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
        assert!(is_cancelled(Some(&b)));
        assert!(!is_cancelled(None));
    }

    #[test]
    fn test_callbacks_may_borrow_local_state() {
        let seen = std::sync::Mutex::new(Vec::new());
        let on_progress = |msg: &str, fraction: f64| {
            seen.lock().unwrap().push((msg.to_string(), fraction));
        };
        let cb: Option<&ProgressFn<'_>> = Some(&on_progress);
        if let Some(cb) = cb {
            cb("Complete!", 1.0);
        }

        let done = std::sync::Mutex::new(0usize);
        let on_batch = |completed: usize, _: usize, _: Option<&GenerateResponse>| {
            *done.lock().unwrap() = completed;
        };
        let batch_cb: &BatchProgressFn<'_> = &on_batch;
        batch_cb(2, 2, None);

        assert_eq!(seen.into_inner().unwrap(), vec![("Complete!".to_string(), 1.0)]);
        assert_eq!(done.into_inner().unwrap(), 2);
    }
}
