//! Benchmark utilities for rusty_events.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p rusty_events_bench
//!
//! # Run a single group
//! cargo bench -p rusty_events_bench -- fan_out
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports for visualization.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use rusty_events::{Completion, Dispatcher, Event, Handler, HandlerRef};

/// Counts invocations and signals immediately.
#[derive(Debug, Default)]
pub struct Counter {
    calls: AtomicUsize,
}

impl Counter {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Handler for Counter {
    fn handle(&self, _event: &dyn Event, done: Completion) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        done.done();
    }
}

/// Registers `count` distinct counters under `event`, returning them in registration order.
pub fn populate(dispatcher: &Dispatcher, event: &str, count: usize) -> Vec<Arc<Counter>> {
    (0..count)
        .map(|_| {
            let counter = Arc::new(Counter::default());
            let handler: HandlerRef = counter.clone();
            // Fresh allocations are never duplicates
            let _ = dispatcher.register(event, handler);
            counter
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusty_events::Envelope;

    #[test]
    fn populate_registers_distinct_counters() {
        let dispatcher = Dispatcher::new();

        let counters = populate(&dispatcher, "tick", 5);
        dispatcher.dispatch(&Envelope::new("tick", ())).unwrap();

        assert_eq!(dispatcher.len("tick"), 5);
        assert!(counters.iter().all(|counter| counter.calls() == 1));
    }
}
