use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Cancellation and deadline state for a single inbound request.
///
/// Every orchestrator call and every gateway implementation observes the
/// same context, so a client disconnect or an elapsed deadline stops the
/// request at the next checkpoint instead of running the remote command to
/// completion.
#[derive(Clone, Debug)]
pub struct RequestContext {
    deadline: Option<Instant>,
    canceled: Arc<AtomicBool>,
}

impl RequestContext {
    /// Context with no deadline; it fails only if explicitly canceled.
    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            canceled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let bounded = if timeout.is_zero() {
            Duration::from_millis(1)
        } else {
            timeout
        };
        Self {
            deadline: Some(Instant::now() + bounded),
            canceled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_deadline(expires_at: Instant) -> Self {
        Self {
            deadline: Some(expires_at),
            canceled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle that flips this context into the canceled state; typically
    /// held by the connection loop that owns the client socket.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            canceled: self.canceled.clone(),
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        match self.remaining() {
            Some(remaining) => remaining.is_zero(),
            None => false,
        }
    }

    /// Cancellation takes precedence over deadline expiry when both hold.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.is_canceled() {
            return Err(ContextError::Canceled);
        }
        if self.is_expired() {
            return Err(ContextError::DeadlineExceeded);
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct CancelHandle {
    canceled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("request canceled")]
    Canceled,
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

#[cfg(test)]
mod tests {
    use super::{ContextError, RequestContext};
    use std::time::{Duration, Instant};

    #[test]
    fn unbounded_context_never_expires() {
        let ctx = RequestContext::unbounded();
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_expired());
        ctx.check().expect("unbounded context passes");
    }

    #[test]
    fn expired_deadline_fails_check() {
        let ctx = RequestContext::with_deadline(Instant::now() - Duration::from_secs(1));
        assert!(ctx.is_expired());
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));
    }

    #[test]
    fn cancel_handle_flips_all_clones() {
        let ctx = RequestContext::unbounded();
        let clone = ctx.clone();
        ctx.cancel_handle().cancel();
        assert!(clone.is_canceled());
        assert_eq!(clone.check(), Err(ContextError::Canceled));
    }

    #[test]
    fn cancellation_wins_over_expiry() {
        let ctx = RequestContext::with_deadline(Instant::now() - Duration::from_secs(1));
        ctx.cancel_handle().cancel();
        assert_eq!(ctx.check(), Err(ContextError::Canceled));
    }

    #[test]
    fn zero_timeout_is_bounded_to_one_millisecond() {
        let ctx = RequestContext::with_timeout(Duration::ZERO);
        assert!(ctx.remaining().is_some());
    }
}
