use std::{fmt, sync::Arc};

use crate::{barrier::Completion, event::Event};

/// Shared reference under which handlers are registered.
pub type HandlerRef = Arc<dyn Handler>;

/// Something that can process an [`Event`].
///
/// Each dispatch runs `handle` on its own thread, concurrently with the other handlers
/// registered under the same event name. No ordering between handlers should be assumed, and
/// any state shared between handlers must be synchronized by the handlers themselves.
///
/// # Completion
///
/// `done` must be signaled exactly once when the work is finished. Signaling consumes the
/// token. A token that is dropped without being signaled (early return, panic) is released
/// automatically and the panic is reported through
/// [`DispatchError`](crate::error::DispatchError). A token that is leaked, e.g. with
/// `mem::forget` or by parking it in long-lived state, blocks the dispatch forever.
///
/// # Identity
///
/// Registrations are compared by identity of the shared allocation, never by value: two
/// handlers that behave identically are still distinct, while clones of one [`HandlerRef`] are
/// the same handler.
pub trait Handler: Send + Sync {
    fn handle(&self, event: &dyn Event, done: Completion);
}

impl<F> Handler for F
where
    F: Fn(&dyn Event, Completion) + Send + Sync,
{
    fn handle(&self, event: &dyn Event, done: Completion) {
        self(event, done)
    }
}

/// Identity of a registered handler, derived from the address of its shared allocation.
///
/// The id is only meaningful while some [`HandlerRef`] to the handler is alive; once every
/// reference is gone the address may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(usize);

impl HandlerId {
    /// Id of the handler behind `handler`.
    #[inline]
    pub fn of<H: Handler + ?Sized>(handler: &Arc<H>) -> Self {
        Self(Arc::as_ptr(handler) as *const () as usize)
    }

    #[inline]
    pub(crate) const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler@{:#x}", self.0)
    }
}

/// Returns true when both references point at the same handler.
#[inline]
pub(crate) fn same_handler(a: &HandlerRef, b: &HandlerRef) -> bool {
    HandlerId::of(a) == HandlerId::of(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl Handler for Noop {
        fn handle(&self, _event: &dyn Event, done: Completion) {
            done.done();
        }
    }

    #[test]
    fn clones_share_identity() {
        let handler: HandlerRef = Arc::new(Noop);
        let clone = Arc::clone(&handler);

        assert_eq!(HandlerId::of(&handler), HandlerId::of(&clone));
        assert!(same_handler(&handler, &clone));
    }

    #[test]
    fn equal_handlers_are_distinct() {
        // Given - two behaviorally identical handlers
        let first: HandlerRef = Arc::new(Noop);
        let second: HandlerRef = Arc::new(Noop);

        // Then - identity differs
        assert_ne!(HandlerId::of(&first), HandlerId::of(&second));
        assert!(!same_handler(&first, &second));
    }

    #[test]
    fn typed_and_erased_refs_agree() {
        let typed = Arc::new(Noop);
        let erased: HandlerRef = typed.clone();

        assert_eq!(HandlerId::of(&typed), HandlerId::of(&erased));
    }

    #[test]
    fn display_is_hex_address() {
        let id = HandlerId::from_raw(0xbeef);

        assert_eq!(id.to_string(), "handler@0xbeef");
    }
}
