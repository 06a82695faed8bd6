//! In-process event dispatch.
//!
//! A [`Dispatcher`] maps event names to ordered lists of [`Handler`]s. Dispatching an
//! [`Event`] runs every handler registered under its name on its own thread and blocks until
//! all of them have signaled their [`Completion`].
//!
//! This is a synchronous fan-out primitive, not a message bus: nothing is persisted, queued,
//! retried or delivered across processes.

pub mod barrier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod handler;
pub mod logging;

pub use barrier::{Completion, CompletionBarrier};
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, DuplicateHandlerError, FailureKind, HandlerFailure};
pub use event::{Envelope, Event};
pub use handler::{Handler, HandlerId, HandlerRef};
