//! Registry of handlers keyed by event name, with concurrent fan-out dispatch.
//!
//! This module provides [`Dispatcher`], which owns the mapping from event names to ordered
//! handler lists and invokes every handler registered under an event's name when that event is
//! dispatched.
//!
//! # Overview
//!
//! - **Registration**: handlers are appended per event name; the same handler (by identity)
//!   cannot appear twice under one name
//! - **Dispatch**: one thread per registered handler, launched in registration order, with the
//!   caller blocked until all of them have completed
//! - **Ownership**: there is no global dispatcher; construct one and share it explicitly,
//!   typically through an `Arc`
//!
//! # Synchronization
//!
//! The registry is stored in a [`DashMap`], so `register`, `remove`, `clear` and `has` may be
//! called from any thread and are serialized per shard. [`dispatch`](Dispatcher::dispatch)
//! takes a snapshot of the handler list and releases the map before starting handlers, so no
//! lock is held while waiting. Registrations made while a dispatch is in flight only affect
//! later dispatches.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rusty_events::{Completion, Dispatcher, Envelope, Event, HandlerRef};
//!
//! let dispatcher = Dispatcher::new();
//!
//! let audit: HandlerRef = Arc::new(|event: &dyn Event, done: Completion| {
//!     println!("audit: {}", event.name());
//!     done.done();
//! });
//! dispatcher.register("order.created", audit.clone()).unwrap();
//!
//! // Registering the same handler twice under one name is rejected
//! assert!(dispatcher.register("order.created", audit.clone()).is_err());
//!
//! dispatcher.dispatch(&Envelope::new("order.created", 42u64)).unwrap();
//! ```

use std::{fmt, io};

use crossbeam::thread::ScopedJoinHandle;
use dashmap::DashMap;
use log::{debug, error, trace};

use crate::{
    barrier::CompletionBarrier,
    config::Config,
    error::{DispatchError, DuplicateHandlerError, FailureKind, HandlerFailure},
    event::Event,
    handler::{HandlerId, HandlerRef, same_handler},
};

/// Maps event names to ordered handler lists and fans events out to them.
///
/// # Thread Safety
///
/// `Dispatcher` is `Send + Sync`. Every operation takes `&self`; wrap the dispatcher in an
/// `Arc` to share it between threads.
pub struct Dispatcher {
    /// Handlers per event name, in registration order. Names without handlers are absent.
    handlers: DashMap<String, Vec<HandlerRef>>,

    /// Naming and sizing of handler threads.
    config: Config,
}

/// A handler invocation as launched by [`Dispatcher::dispatch`].
enum Launch<'scope> {
    Running(HandlerId, ScopedJoinHandle<'scope, ()>),
    Refused(HandlerId, io::Error),
}

impl Dispatcher {
    /// Creates a dispatcher with an empty registry and the default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a dispatcher with an empty registry.
    pub fn with_config(config: Config) -> Self {
        Self {
            handlers: DashMap::new(),
            config,
        }
    }

    /// Registers `handler` under `event`, after any handlers already registered there.
    ///
    /// Returns the handler's id, or [`DuplicateHandlerError`] if this exact handler is already
    /// registered under `event`, in which case nothing changes. Registering the same handler
    /// under different event names is allowed.
    pub fn register(
        &self,
        event: &str,
        handler: HandlerRef,
    ) -> Result<HandlerId, DuplicateHandlerError> {
        let id = HandlerId::of(&handler);

        // Check and append under the same shard lock
        let mut entries = self.handlers.entry(event.to_owned()).or_default();
        if entries.iter().any(|existing| same_handler(existing, &handler)) {
            return Err(DuplicateHandlerError::new(event, id));
        }
        entries.push(handler);
        let count = entries.len();
        drop(entries);

        debug!("registered {} for '{}' ({} total)", id, event, count);
        Ok(id)
    }

    /// Returns `true` if `handler` is registered under `event`.
    pub fn has(&self, event: &str, handler: &HandlerRef) -> bool {
        self.handlers
            .get(event)
            .is_some_and(|entries| entries.iter().any(|h| same_handler(h, handler)))
    }

    /// Removes `handler` from `event`, keeping the remaining handlers in order.
    ///
    /// Does nothing if the event name is unknown or the handler is not registered under it.
    pub fn remove(&self, event: &str, handler: &HandlerRef) {
        let removed = match self.handlers.get_mut(event) {
            Some(mut entries) => match entries.iter().position(|h| same_handler(h, handler)) {
                Some(index) => {
                    entries.remove(index);
                    true
                }
                None => false,
            },
            None => false,
        };

        if removed {
            self.handlers.remove_if(event, |_, entries| entries.is_empty());
            debug!("removed {} from '{}'", HandlerId::of(handler), event);
        }
    }

    /// Forgets every registration.
    pub fn clear(&self) {
        self.handlers.clear();
        debug!("cleared all registrations");
    }

    /// Number of handlers registered under `event`.
    pub fn len(&self, event: &str) -> usize {
        self.handlers.get(event).map_or(0, |entries| entries.len())
    }

    /// Returns `true` if no handler is registered under any event name.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Snapshot of the handlers registered under `event`, in registration order.
    pub fn handlers(&self, event: &str) -> Vec<HandlerRef> {
        self.handlers
            .get(event)
            .map(|entries| entries.value().clone())
            .unwrap_or_default()
    }

    /// Names of all events with at least one handler, sorted.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    /// Invokes every handler registered under `event.name()` and waits for all of them.
    ///
    /// Each handler runs on its own thread, started in registration order, and receives the
    /// event together with its [`Completion`](crate::Completion). This call returns once every
    /// completion has been signaled and every handler thread has exited. With no handlers
    /// registered it returns `Ok(())` immediately.
    ///
    /// A handler that panics, or a handler thread that cannot be started, does not stop the
    /// others: they all run to completion and the failures are reported together as a
    /// [`DispatchError`].
    ///
    /// There is no timeout. A handler that never finishes, or leaks its completion, blocks
    /// this call forever.
    pub fn dispatch(&self, event: &dyn Event) -> Result<(), DispatchError> {
        let name = event.name();
        let handlers = self.handlers(name);
        if handlers.is_empty() {
            trace!("no handlers for '{}'", name);
            return Ok(());
        }

        let mut barrier = CompletionBarrier::new();
        let failures = crossbeam::thread::scope(|scope| {
            let mut launches = Vec::with_capacity(handlers.len());

            for handler in &handlers {
                let id = HandlerId::of(handler);
                let done = barrier.completion(id);

                let mut builder = scope.builder().name(self.config.thread_name(name));
                if let Some(bytes) = self.config.thread_stack_size() {
                    builder = builder.stack_size(bytes);
                }

                // A refused spawn drops the closure, and with it the completion
                match builder.spawn(move |_| handler.handle(event, done)) {
                    Ok(join) => launches.push(Launch::Running(id, join)),
                    Err(err) => launches.push(Launch::Refused(id, err)),
                }
            }

            debug!("dispatching '{}' to {} handler(s)", name, barrier.issued());
            barrier.wait();

            launches
                .into_iter()
                .filter_map(|launch| match launch {
                    Launch::Running(handler, join) => join.join().err().map(|payload| {
                        HandlerFailure::new(handler, FailureKind::from_panic(payload))
                    }),
                    Launch::Refused(handler, err) => {
                        Some(HandlerFailure::new(handler, FailureKind::Spawn(err)))
                    }
                })
                .collect::<Vec<_>>()
        })
        // Every launched thread is joined inside the scope, so no panic is left for it to report
        .unwrap_or_default();

        if failures.is_empty() {
            return Ok(());
        }

        for failure in &failures {
            error!(
                "{} failed while handling '{}': {}",
                failure.handler(),
                name,
                failure.kind()
            );
        }
        Err(DispatchError::new(name, failures))
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in self.event_names() {
            let count = self.len(&name);
            map.entry(&name, &count);
        }
        map.finish()
    }
}
