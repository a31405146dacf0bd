//! Deadline and cancellation for a single resolution
//!
//! The standard library socket has no notion of cancellation, so reads are
//! performed in short slices and the context is checked between them.

use std::io::{self, Read};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::utils::ContextError;

/// Upper bound on a single blocking read while a cancel flag is attached
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared cancellation flag
///
/// Clones observe the same flag, so one handle can be given to another
/// thread while the resolution holds the other.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every resolution holding this handle
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Per-call deadline and cancellation
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    deadline: Option<Instant>,
    cancel: Option<CancelHandle>,
}

impl ResolveContext {
    /// Context with no deadline and no cancellation; reads may block forever
    pub fn background() -> Self {
        Self::default()
    }

    /// Context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    /// Attach a cancellation handle
    pub fn cancelled_by(mut self, handle: CancelHandle) -> Self {
        self.cancel = Some(handle);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline (`None` if there is no deadline)
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Fail if the context was cancelled or its deadline has passed
    pub fn check(&self) -> Result<(), ContextError> {
        if self.cancel.as_ref().map_or(false, CancelHandle::is_cancelled) {
            return Err(ContextError::Cancelled);
        }
        match self.remaining() {
            Some(left) if left.is_zero() => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Bound `limit` by the remaining time
    pub fn clamp(&self, limit: Duration) -> Duration {
        match self.remaining() {
            Some(left) => left.min(limit),
            None => limit,
        }
    }

    /// Timeout for the next blocking socket call
    ///
    /// `None` means block without a timeout, which only happens for a
    /// background context.
    fn next_wait(&self) -> Option<Duration> {
        match (self.remaining(), self.cancel.is_some()) {
            (Some(left), true) => Some(left.min(CANCEL_POLL_INTERVAL)),
            (Some(left), false) => Some(left),
            (None, true) => Some(CANCEL_POLL_INTERVAL),
            (None, false) => None,
        }
    }
}

/// Read half of a session socket that honors a [`ResolveContext`]
///
/// A read either returns data, fails with a socket error, or fails with a
/// [`ContextError`] wrapped in `io::Error` once the context expires.
pub struct GuardedStream {
    stream: TcpStream,
    ctx: ResolveContext,
}

impl GuardedStream {
    pub fn new(stream: TcpStream, ctx: ResolveContext) -> Self {
        Self { stream, ctx }
    }

    pub fn get_ref(&self) -> &TcpStream {
        &self.stream
    }
}

impl Read for GuardedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            self.ctx.check()?;

            // A zero timeout is rejected by set_read_timeout; check() above
            // already failed if no time is left.
            let wait = self.ctx.next_wait().map(|d| d.max(Duration::from_millis(1)));
            self.stream.set_read_timeout(wait)?;

            match self.stream.read(buf) {
                Ok(n) => return Ok(n),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock
                            | io::ErrorKind::TimedOut
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    continue
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_never_expires() {
        let ctx = ResolveContext::background();
        assert!(ctx.remaining().is_none());
        assert!(ctx.check().is_ok());
        assert_eq!(ctx.clamp(Duration::from_secs(3)), Duration::from_secs(3));
        assert_eq!(ctx.next_wait(), None);
    }

    #[test]
    fn test_expired_deadline() {
        let ctx = ResolveContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert_eq!(ctx.check(), Err(ContextError::DeadlineExceeded));
        assert_eq!(ctx.clamp(Duration::from_secs(3)), Duration::ZERO);
    }

    #[test]
    fn test_clamp_uses_remaining_time() {
        let ctx = ResolveContext::with_timeout(Duration::from_millis(200));
        assert!(ctx.clamp(Duration::from_secs(5)) <= Duration::from_millis(200));
        assert_eq!(ctx.clamp(Duration::from_millis(10)), Duration::from_millis(10));
    }

    #[test]
    fn test_cancel_handle_is_shared() {
        let handle = CancelHandle::new();
        let ctx = ResolveContext::background().cancelled_by(handle.clone());
        assert!(ctx.check().is_ok());
        assert_eq!(ctx.next_wait(), Some(CANCEL_POLL_INTERVAL));

        handle.cancel();
        assert_eq!(ctx.check(), Err(ContextError::Cancelled));
    }

    #[test]
    fn test_cancellation_wins_over_deadline() {
        let handle = CancelHandle::new();
        handle.cancel();
        let ctx = ResolveContext::with_deadline(Instant::now() - Duration::from_millis(1))
            .cancelled_by(handle);
        assert_eq!(ctx.check(), Err(ContextError::Cancelled));
    }
}
