//! # Event Bus
//!
//! A type-safe, synchronous publish-subscribe bus used to decouple internal
//! lifecycle notifications (acknowledgements, consumer failures, connection and
//! channel state) from the components that react to them.
//!
//! ## Overview
//!
//! Every event type owns an independent subscriber list. Publishing runs the
//! handlers registered for that exact type, one after another, on the calling
//! thread. Lists are copy-on-write: subscribing or unsubscribing installs a new
//! snapshot, and a publish iterates the snapshot it captured without holding any
//! lock, so handlers may freely subscribe or dispose subscriptions re-entrantly.
//!
//! ## Features
//!
//! * **Type-Safe**: Events are identified by their Rust type, with no cross-kind fan-out.
//! * **Isolated handlers**: A failing or panicking handler is logged and skipped.
//! * **RAII subscriptions**: [`Subscription`] unsubscribes on drop; `detach` keeps it.
//! * **High Performance**: `FxHashMap` + `parking_lot` locks, no allocation per publish.
//!
//! # Example
//!
//! ```rust
//! use warren_event_bus::EventBus;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct ConsumerStarted { queue: &'static str }
//!
//! let bus = EventBus::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&seen);
//!
//! let subscription = bus.subscribe(move |event: &ConsumerStarted| {
//!     assert_eq!(event.queue, "orders");
//!     counter.fetch_add(1, Ordering::Relaxed);
//! });
//!
//! bus.publish(ConsumerStarted { queue: "orders" });
//! drop(subscription);
//! bus.publish(ConsumerStarted { queue: "orders" });
//!
//! assert_eq!(seen.load(Ordering::Relaxed), 1);
//! ```

mod bus;
mod error;
mod handlers;
mod subscription;

pub use bus::{Event, EventBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use handlers::HandlerOutcome;
pub use subscription::Subscription;
