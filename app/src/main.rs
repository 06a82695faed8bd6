use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};

use log::{LevelFilter, info};
use rusty_events::{
    Completion, Dispatcher, Envelope, Event, Handler, HandlerRef, logging::ChannelLogger,
};

#[derive(Debug)]
struct Order {
    id: u64,
    amount_cents: u64,
}

/// Keeps a running total of invoiced orders.
#[derive(Default)]
struct Billing {
    invoiced_cents: AtomicU64,
}

impl Handler for Billing {
    fn handle(&self, event: &dyn Event, done: Completion) {
        if let Some(order) = event.payload_ref::<Order>() {
            self.invoiced_cents
                .fetch_add(order.amount_cents, Ordering::SeqCst);
            info!("billing: invoiced order #{}", order.id);
        }
        done.done();
    }
}

/// Hands the label printing off to a courier thread and signals from there.
struct Shipping;

impl Handler for Shipping {
    fn handle(&self, event: &dyn Event, done: Completion) {
        let id = event.payload_ref::<Order>().map(|order| order.id);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            if let Some(id) = id {
                info!("shipping: label printed for order #{}", id);
            }
            done.done();
        });
    }
}

fn main() {
    let (logger, log_recv) = ChannelLogger::with_receiver();
    if let Err(err) = logger.level(LevelFilter::Debug).install() {
        eprintln!("logger already installed: {err}");
    }

    let dispatcher = Dispatcher::new();
    let billing = Arc::new(Billing::default());
    let invoicing: HandlerRef = billing.clone();
    let shipping: HandlerRef = Arc::new(Shipping);
    let refunds: HandlerRef = Arc::new(|event: &dyn Event, done: Completion| {
        if let Some(order) = event.payload_ref::<Order>() {
            info!("refunds: order #{} cancelled", order.id);
        }
        done.done();
    });
    let fraud_check: HandlerRef = Arc::new(|event: &dyn Event, done: Completion| {
        if let Some(order) = event.payload_ref::<Order>() {
            assert!(order.amount_cents < 100_000, "order #{} needs manual review", order.id);
        }
        done.done();
    });

    let registrations: [(&str, HandlerRef); 4] = [
        ("order.created", invoicing),
        ("order.created", shipping.clone()),
        ("order.created", fraud_check),
        ("order.cancelled", refunds),
    ];
    for (event, handler) in registrations {
        if let Err(err) = dispatcher.register(event, handler) {
            eprintln!("{err}");
        }
    }
    if let Err(err) = dispatcher.register("order.created", shipping) {
        println!("expected rejection: {err}");
    }
    println!("registry: {dispatcher:?}");

    let events = [
        Envelope::new("order.created", Order { id: 42, amount_cents: 1_999 }),
        Envelope::new("order.created", Order { id: 43, amount_cents: 250_000 }),
        Envelope::new("order.cancelled", Order { id: 42, amount_cents: 1_999 }),
        Envelope::new("order.archived", Order { id: 41, amount_cents: 500 }),
    ];
    for event in &events {
        match dispatcher.dispatch(event) {
            Ok(()) => println!("dispatched {}", event.name()),
            Err(err) => println!("dispatched {} with failures: {err}", event.name()),
        }
    }

    println!(
        "invoiced: {} cents",
        billing.invoiced_cents.load(Ordering::SeqCst)
    );

    for message in log_recv.try_iter() {
        println!("[{}] {}: {}", message.level, message.target, message.message);
    }
}
