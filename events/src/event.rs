//! Events routed through a [`Dispatcher`](crate::Dispatcher).
//!
//! An event is anything exposing a name, a timestamp and an opaque payload. The dispatcher only
//! reads these three attributes: the name selects the handlers, the rest is passed through
//! untouched.
//!
//! # Example
//!
//! ```rust
//! use rusty_events::{Envelope, Event};
//!
//! struct Order {
//!     id: u64,
//! }
//!
//! let event = Envelope::new("order.created", Order { id: 42 });
//! let event: &dyn Event = &event;
//!
//! assert_eq!(event.name(), "order.created");
//! assert_eq!(event.payload_ref::<Order>().map(|o| o.id), Some(42));
//! ```

use std::{any::Any, fmt, time::SystemTime};

/// A named, timestamped value carrying an opaque payload.
///
/// Events must be:
/// - `Send + Sync`: handlers read the same event from several threads at once
/// - immutable from the dispatcher's point of view: only shared references are handed out
pub trait Event: Send + Sync {
    /// Routing key used to look up handlers.
    fn name(&self) -> &str;

    /// Creation or occurrence time of the event.
    fn timestamp(&self) -> SystemTime;

    /// Application data, untyped from the dispatcher's perspective.
    fn payload(&self) -> &(dyn Any + Send + Sync);
}

impl dyn Event + '_ {
    /// Downcasts the payload to a concrete type, returning `None` on a type mismatch.
    #[inline]
    pub fn payload_ref<T: Any>(&self) -> Option<&T> {
        self.payload().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Event + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name())
            .field("timestamp", &self.timestamp())
            .finish_non_exhaustive()
    }
}

/// The stock [`Event`] implementation: a name and timestamp wrapped around a typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<P> {
    name: String,
    timestamp: SystemTime,
    payload: P,
}

impl<P> Envelope<P>
where
    P: Any + Send + Sync,
{
    /// Creates an event stamped with the current system time.
    pub fn new(name: impl Into<String>, payload: P) -> Self {
        Self::at(name, SystemTime::now(), payload)
    }

    /// Creates an event with an explicit timestamp, e.g. when replaying recorded occurrences.
    pub fn at(name: impl Into<String>, timestamp: SystemTime, payload: P) -> Self {
        Self {
            name: name.into(),
            timestamp,
            payload,
        }
    }

    /// The typed payload.
    #[inline]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Consumes the envelope, returning the payload.
    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl<P> Event for Envelope<P>
where
    P: Any + Send + Sync,
{
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    #[inline]
    fn payload(&self) -> &(dyn Any + Send + Sync) {
        &self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    struct Order {
        id: u64,
    }

    #[test]
    fn envelope_exposes_name_and_payload() {
        // Given
        let envelope = Envelope::new("order.created", Order { id: 42 });

        // When
        let event: &dyn Event = &envelope;

        // Then
        assert_eq!(event.name(), "order.created");
        assert_eq!(envelope.payload(), &Order { id: 42 });
        assert_eq!(event.payload_ref::<Order>(), Some(&Order { id: 42 }));
    }

    #[test]
    fn new_stamps_current_time() {
        let before = SystemTime::now();
        let envelope = Envelope::new("tick", ());
        let after = SystemTime::now();

        assert!(Event::timestamp(&envelope) >= before);
        assert!(Event::timestamp(&envelope) <= after);
    }

    #[test]
    fn at_keeps_explicit_timestamp() {
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        let envelope = Envelope::at("replayed", when, "payload");

        assert_eq!(Event::timestamp(&envelope), when);
    }

    #[test]
    fn payload_ref_rejects_wrong_type() {
        let envelope = Envelope::new("order.created", Order { id: 7 });
        let event: &dyn Event = &envelope;

        assert!(event.payload_ref::<String>().is_none());
    }

    #[test]
    fn into_payload_returns_owned_value() {
        let envelope = Envelope::new("order.created", Order { id: 9 });

        assert_eq!(envelope.into_payload(), Order { id: 9 });
    }

    #[test]
    fn debug_shows_name() {
        let envelope = Envelope::new("order.created", 1u8);
        let event: &dyn Event = &envelope;

        assert!(format!("{event:?}").contains("order.created"));
    }
}
