use std::{any::Any, error::Error, fmt, io};

use crate::handler::HandlerId;

/// Returned by [`Dispatcher::register`](crate::Dispatcher::register) when the handler is
/// already registered under the event name. The registry is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateHandlerError {
    event: String,
    handler: HandlerId,
}

impl DuplicateHandlerError {
    #[inline]
    pub(crate) fn new(event: impl Into<String>, handler: HandlerId) -> Self {
        Self {
            event: event.into(),
            handler,
        }
    }

    /// Event name the registration was attempted under.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// The handler that was already present.
    pub fn handler(&self) -> HandlerId {
        self.handler
    }
}

impl fmt::Display for DuplicateHandlerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} is already registered for event '{}'",
            self.handler, self.event
        )
    }
}

impl Error for DuplicateHandlerError {}

/// Why a single handler invocation failed.
#[derive(Debug)]
pub enum FailureKind {
    /// The handler panicked. Holds the panic message when it was a string.
    Panicked(Option<String>),
    /// No thread could be started for the handler, so it never ran.
    Spawn(io::Error),
}

impl FailureKind {
    pub(crate) fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(message) => Some(*message),
            Err(payload) => payload.downcast_ref::<&str>().map(|s| (*s).to_owned()),
        };
        FailureKind::Panicked(message)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FailureKind::Panicked(Some(message)) => write!(f, "panicked: {message}"),
            FailureKind::Panicked(None) => write!(f, "panicked"),
            FailureKind::Spawn(err) => write!(f, "failed to start: {err}"),
        }
    }
}

/// A handler invocation that did not finish normally.
#[derive(Debug)]
pub struct HandlerFailure {
    handler: HandlerId,
    kind: FailureKind,
}

impl HandlerFailure {
    #[inline]
    pub(crate) fn new(handler: HandlerId, kind: FailureKind) -> Self {
        Self { handler, kind }
    }

    /// The handler whose invocation failed.
    pub fn handler(&self) -> HandlerId {
        self.handler
    }

    /// What went wrong.
    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.handler, self.kind)
    }
}

/// Returned by [`Dispatcher::dispatch`](crate::Dispatcher::dispatch) once every handler has
/// finished, when at least one of them failed. Handlers that did not fail ran to completion.
#[derive(Debug)]
pub struct DispatchError {
    event: String,
    failures: Vec<HandlerFailure>,
}

impl DispatchError {
    #[inline]
    pub(crate) fn new(event: impl Into<String>, failures: Vec<HandlerFailure>) -> Self {
        Self {
            event: event.into(),
            failures,
        }
    }

    /// Name of the dispatched event.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Failed invocations, in registration order.
    pub fn failures(&self) -> &[HandlerFailure] {
        &self.failures
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} handler(s) failed for event '{}'",
            self.failures.len(),
            self.event
        )?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }
        Ok(())
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.failures.iter().find_map(|failure| match &failure.kind {
            FailureKind::Spawn(err) => Some(err as &(dyn Error + 'static)),
            FailureKind::Panicked(_) => None,
        })
    }
}
