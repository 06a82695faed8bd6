//! Completion barrier shared by the handler invocations of a single dispatch.
//!
//! The barrier is a counted rendezvous: every launched invocation receives one [`Completion`]
//! token and the dispatching thread blocks in [`CompletionBarrier::wait`] until all tokens have
//! been signaled. Counting is delegated to [`crossbeam::sync::WaitGroup`], where each token owns
//! one clone of the group.
//!
//! A token is released when it is signaled with [`Completion::done`] or when it is dropped. The
//! drop path covers handlers that panic or return early, so a failing handler cannot strand the
//! dispatcher. Only a token that is leaked (e.g. `mem::forget`) keeps the barrier closed.

use std::{fmt, thread};

use crossbeam::sync::WaitGroup;
use log::{debug, warn};

use crate::handler::HandlerId;

/// Counted rendezvous for the invocations launched by one dispatch.
pub struct CompletionBarrier {
    wait_group: WaitGroup,
    issued: usize,
}

impl CompletionBarrier {
    /// Creates a barrier with no outstanding tokens.
    pub fn new() -> Self {
        Self {
            wait_group: WaitGroup::new(),
            issued: 0,
        }
    }

    /// Issues the token for one invocation of `handler`.
    pub fn completion(&mut self, handler: HandlerId) -> Completion {
        self.issued += 1;
        Completion {
            wait_group: Some(self.wait_group.clone()),
            handler,
        }
    }

    /// Number of tokens issued so far.
    #[inline]
    pub fn issued(&self) -> usize {
        self.issued
    }

    /// Blocks until every issued token has been signaled or dropped.
    pub fn wait(self) {
        self.wait_group.wait();
    }
}

impl Default for CompletionBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompletionBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionBarrier")
            .field("issued", &self.issued)
            .finish()
    }
}

/// Single-use completion signal handed to a handler alongside the event.
///
/// A handler signals exactly once by calling [`done`](Self::done); consuming the token makes a
/// second signal impossible. The token is `Send`, so the work (and the signal) may move to
/// another thread before the handler returns.
#[must_use = "the dispatcher waits until this completion is signaled"]
pub struct Completion {
    wait_group: Option<WaitGroup>,
    handler: HandlerId,
}

impl Completion {
    /// Signals that the invocation has finished.
    pub fn done(mut self) {
        self.wait_group.take();
    }

    /// The handler this token was issued for.
    #[inline]
    pub fn handler(&self) -> HandlerId {
        self.handler
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.wait_group.take().is_none() {
            return;
        }
        if thread::panicking() {
            warn!(
                "handler {} panicked before signaling completion; releasing on its behalf",
                self.handler()
            );
        } else {
            debug!(
                "handler {} dropped its completion without signaling; releasing on its behalf",
                self.handler()
            );
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("handler", &self.handler)
            .field("pending", &self.wait_group.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };
    use std::time::{Duration, Instant};

    fn id(raw: usize) -> HandlerId {
        HandlerId::from_raw(raw)
    }

    #[test]
    fn wait_without_tokens_returns_immediately() {
        let barrier = CompletionBarrier::new();

        barrier.wait();
    }

    #[test]
    fn wait_blocks_until_all_tokens_signal() {
        // Given
        let mut barrier = CompletionBarrier::new();
        let finished = Arc::new(AtomicUsize::new(0));
        let mut workers = Vec::new();

        for i in 0..4 {
            let done = barrier.completion(id(i));
            let finished = Arc::clone(&finished);
            workers.push(thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                finished.fetch_add(1, Ordering::SeqCst);
                done.done();
            }));
        }

        // When
        barrier.wait();

        // Then
        assert_eq!(finished.load(Ordering::SeqCst), 4);
        for worker in workers {
            worker.join().unwrap();
        }
    }

    #[test]
    fn dropped_token_releases_barrier() {
        let mut barrier = CompletionBarrier::new();
        let token = barrier.completion(id(1));

        drop(token);

        let start = Instant::now();
        barrier.wait();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn panicking_holder_releases_barrier() {
        let mut barrier = CompletionBarrier::new();
        let token = barrier.completion(id(1));

        let worker = thread::spawn(move || {
            let _token = token;
            panic!("handler blew up");
        });

        barrier.wait();
        assert!(worker.join().is_err());
    }

    #[test]
    fn issued_counts_tokens() {
        let mut barrier = CompletionBarrier::new();
        let a = barrier.completion(id(1));
        let b = barrier.completion(id(2));

        assert_eq!(barrier.issued(), 2);
        assert_eq!(a.handler(), id(1));

        a.done();
        b.done();
        barrier.wait();
    }
}
